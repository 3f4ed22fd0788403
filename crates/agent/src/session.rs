//! The session loop — one conversation, one call in flight.
//!
//! ```text
//! Idle → AwaitingInput → Assembling → AwaitingCompletion → Updating → Idle
//! ```
//!
//! Input that is empty, or repeats the last user message, goes straight back
//! to `Idle`. A failed completion also goes straight back to `Idle` and
//! leaves history, log and usage exactly as they were.

use crate::client::{Completion, CompletionClient};
use crate::history::{HistoryBuffer, HistoryWindow};
use crate::prompt::PromptTemplate;
use parley_config::AppConfig;
use parley_core::error::{ProviderError, TemplateError};
use parley_core::log::InteractionLog;
use parley_core::message::Role;
use parley_core::provider::Provider;
use parley_telemetry::UsageStats;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the session is in handling one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingInput,
    Assembling,
    AwaitingCompletion,
    Updating,
}

/// Why an input was dropped without calling the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Empty,
    Duplicate,
}

/// What the caller should render after a submission.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Ignored(IgnoreReason),
    Replied {
        reply: String,
        completion: Completion,
        /// Cumulative usage after this reply
        usage: UsageStats,
        /// Id of the new log record, when the append succeeded
        log_id: Option<i64>,
        /// Set when the reply could not be logged
        log_warning: Option<String>,
    },
}

/// A running conversation.
pub struct Session {
    client: CompletionClient,
    template: PromptTemplate,
    history: HistoryBuffer,
    log: Arc<dyn InteractionLog>,
    usage: UsageStats,
    state: SessionState,
    window_k: usize,
    token_budget: usize,
}

impl Session {
    /// Create a session. Fails if the instruction template is malformed.
    pub fn new(
        client: CompletionClient,
        log: Arc<dyn InteractionLog>,
        instruction_template: &str,
    ) -> Result<Self, TemplateError> {
        let template = PromptTemplate::parse(instruction_template)?;
        Ok(Self {
            client,
            template,
            history: HistoryBuffer::new(),
            log,
            usage: UsageStats::new(),
            state: SessionState::Idle,
            window_k: 5,
            token_budget: 0,
        })
    }

    /// Build a session from the loaded config.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        log: Arc<dyn InteractionLog>,
    ) -> Result<Self, TemplateError> {
        let client = CompletionClient::from_config(provider, config);
        Ok(Self::new(client, log, &config.instruction_template)?
            .with_window(config.history_window_k, config.history_token_budget))
    }

    /// Keep at most `k` pairs, estimated at no more than `token_budget`
    /// tokens (0 = unlimited).
    pub fn with_window(mut self, k: usize, token_budget: usize) -> Self {
        self.window_k = k;
        self.token_budget = token_budget;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn usage(&self) -> UsageStats {
        self.usage
    }

    pub fn log(&self) -> &Arc<dyn InteractionLog> {
        &self.log
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// The history window the next prompt would carry.
    pub fn window(&self) -> HistoryWindow<'_> {
        self.history
            .render_window_within(self.window_k, self.token_budget)
    }

    /// The exact prompt `input` would be sent with, without sending it.
    pub fn render_prompt(&self, input: &str) -> String {
        self.template.render(&self.window().to_text(), input.trim())
    }

    /// Handle one user input.
    ///
    /// Errors from the completion call are returned with the session
    /// unchanged. A failed log append only produces `log_warning`.
    pub async fn submit(&mut self, input: &str) -> Result<SubmitOutcome, ProviderError> {
        if self.state != SessionState::Idle {
            // A previous submit was dropped mid-call; nothing was committed
            warn!(state = ?self.state, "Previous submission was abandoned");
            self.state = SessionState::Idle;
        }

        self.transition(SessionState::AwaitingInput);
        let text = input.trim();
        if text.is_empty() {
            self.transition(SessionState::Idle);
            return Ok(SubmitOutcome::Ignored(IgnoreReason::Empty));
        }
        if self.history.last_user_text() == Some(text) {
            debug!("Ignoring repeat of the last message");
            self.transition(SessionState::Idle);
            return Ok(SubmitOutcome::Ignored(IgnoreReason::Duplicate));
        }

        self.transition(SessionState::Assembling);
        let prompt = self.render_prompt(text);

        self.transition(SessionState::AwaitingCompletion);
        let completion = match self.client.complete(&prompt).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Completion failed");
                self.transition(SessionState::Idle);
                return Err(e);
            }
        };

        self.transition(SessionState::Updating);
        self.history.record(Role::User, text);
        self.history
            .record(Role::Assistant, completion.reply_text.clone());
        self.usage.record(completion.tokens_used, completion.cost_usd);

        let (log_id, log_warning) = match self.log.append(text, &completion.reply_text).await {
            Ok(id) => (Some(id), None),
            Err(e) => {
                warn!(error = %e, backend = self.log.name(), "Failed to log interaction");
                (None, Some(e.to_string()))
            }
        };

        info!(
            tokens = completion.tokens_used,
            total_tokens = self.usage.total_tokens(),
            cost_usd = self.usage.cost_usd(),
            "Reply received"
        );

        self.transition(SessionState::Idle);
        Ok(SubmitOutcome::Replied {
            reply: completion.reply_text.clone(),
            completion,
            usage: self.usage,
            log_id,
            log_warning,
        })
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }
}
