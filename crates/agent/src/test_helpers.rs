//! Shared test helpers for session and client tests.

use parley_core::error::ProviderError;
use parley_core::message::Message;
use parley_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A mock provider that plays back a script of results.
///
/// Each call to `complete` pops the next entry and records the request.
/// Panics if more calls are made than entries provided.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Replies "reply 1", "reply 2", ... for `n` calls, 10 tokens each.
    pub fn numbered(n: usize, model: &str) -> Self {
        Self::new(
            (1..=n)
                .map(|i| Ok(text_response(&format!("reply {i}"), 6, 4, model)))
                .collect(),
        )
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The prompt text of every request so far.
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.messages[0].content.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| panic!("ScriptedProvider: script exhausted"))
    }
}

/// A plain text response with the given token split.
pub fn text_response(
    text: &str,
    prompt_tokens: u32,
    completion_tokens: u32,
    model: &str,
) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }),
        model: model.into(),
    }
}
