//! `parley chat` — Interactive or single-message chat mode.

use crate::commands::logs::print_records;
use parley_agent::{IgnoreReason, Session, SubmitOutcome};
use parley_channels::CliChannel;
use parley_config::AppConfig;
use parley_core::channel::{Channel, ChannelMessage};
use parley_core::error::{ChannelError, ProviderError};
use std::io::Write;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;

/// What a typed line asks for.
#[derive(Debug, PartialEq, Eq)]
enum ChatCommand<'a> {
    Usage,
    Logs,
    History,
    Help,
    Message(&'a str),
}

fn parse_command(line: &str) -> ChatCommand<'_> {
    match line.trim() {
        "/usage" => ChatCommand::Usage,
        "/logs" => ChatCommand::Logs,
        "/history" => ChatCommand::History,
        "/help" => ChatCommand::Help,
        _ => ChatCommand::Message(line),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

pub async fn run(config_path: &Path, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_at(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    // Fail early with setup help when no key is configured
    if !config.has_api_key() && config.provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    PARLEY_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", config_path.display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = parley_providers::build_from_config(&config)?;
    let log = parley_log::build_from_config(&config.log)
        .await
        .map_err(|e| format!("Failed to open interaction log: {e}"))?;
    let mut session = Session::from_config(&config, provider, log)
        .map_err(|e| format!("Invalid instruction_template: {e}"))?;
    debug!(
        provider = session.client().provider_name(),
        model = session.client().model(),
        log = session.log().name(),
        "Session ready"
    );

    let mut out = std::io::stdout();

    if let Some(msg) = message {
        // Single message mode
        match session.submit(&msg).await? {
            SubmitOutcome::Replied {
                reply,
                usage,
                log_warning,
                ..
            } => {
                writeln!(out, "{reply}")?;
                if let Some(warning) = log_warning {
                    eprintln!("  [Warning] reply not saved to log: {warning}");
                }
                eprintln!("  {usage}");
            }
            SubmitOutcome::Ignored(_) => return Err("Nothing to send: the message is empty".into()),
        }
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "  ╔══════════════════════════════════════════════╗")?;
    writeln!(out, "  ║         Parley — Interactive Chat            ║")?;
    writeln!(out, "  ╚══════════════════════════════════════════════╝")?;
    writeln!(out)?;
    writeln!(out, "  Provider:  {}", session.client().provider_name())?;
    writeln!(out, "  Model:     {}", session.client().model())?;
    writeln!(out, "  Memory:    last {} exchanges", config.history_window_k)?;
    writeln!(out, "  Log:       {}", session.log().name())?;
    writeln!(out)?;
    writeln!(out, "  Type your message and press Enter. /help lists commands.")?;
    writeln!(out, "  Type 'exit' or Ctrl+D to quit.")?;
    writeln!(out)?;

    let channel = CliChannel::new();
    let rx = channel.start().await.map_err(|e| format!("Channel error: {e}"))?;
    chat_loop(&mut session, rx, &mut out).await?;

    writeln!(out)?;
    writeln!(out, "  Goodbye!")?;
    writeln!(out, "  {}", session.usage())?;
    writeln!(out)?;
    Ok(())
}

/// Drive the session from channel input until the channel closes.
async fn chat_loop<W: Write>(
    session: &mut Session,
    mut rx: mpsc::Receiver<Result<ChannelMessage, ChannelError>>,
    out: &mut W,
) -> std::io::Result<()> {
    write!(out, "  You > ")?;
    out.flush()?;

    while let Some(result) = rx.recv().await {
        match result {
            Ok(chan_msg) => {
                debug!(channel = %chan_msg.channel_id, "Input received");
                if handle_line(session, &chan_msg.content, out).await? == Flow::Stop {
                    break;
                }
                write!(out, "  You > ")?;
                out.flush()?;
            }
            Err(e) => {
                writeln!(out, "  [Channel Error] {e}")?;
                break;
            }
        }
    }
    Ok(())
}

async fn handle_line<W: Write>(session: &mut Session, line: &str, out: &mut W) -> std::io::Result<Flow> {
    match parse_command(line) {
        ChatCommand::Usage => {
            let usage = session.usage();
            writeln!(out, "  {usage} | Requests: {}", usage.requests())?;
        }
        ChatCommand::Logs => match session.log().read_all().await {
            Ok(records) => print_records(out, &records)?,
            Err(e) => writeln!(out, "  [Log Error] {e}")?,
        },
        ChatCommand::History => {
            let window = session.window();
            if window.is_empty() {
                writeln!(out, "  (no history yet)")?;
            }
            for line in window.lines() {
                writeln!(out, "  {line}")?;
            }
        }
        ChatCommand::Help => {
            writeln!(out, "  /usage    cumulative tokens and cost")?;
            writeln!(out, "  /logs     every logged interaction")?;
            writeln!(out, "  /history  what the next prompt remembers")?;
            writeln!(out, "  exit      leave the chat")?;
        }
        ChatCommand::Message(text) => match session.submit(text).await {
            Ok(SubmitOutcome::Ignored(IgnoreReason::Empty)) => {}
            Ok(SubmitOutcome::Ignored(IgnoreReason::Duplicate)) => {
                writeln!(out, "  (same as your last message, skipped)")?;
            }
            Ok(SubmitOutcome::Replied {
                reply,
                usage,
                log_warning,
                ..
            }) => {
                writeln!(out)?;
                for line in reply.lines() {
                    writeln!(out, "  Assistant > {line}")?;
                }
                if let Some(warning) = log_warning {
                    writeln!(out, "  [Warning] reply not saved to log: {warning}")?;
                }
                writeln!(out, "  {usage}")?;
                writeln!(out)?;
            }
            Err(e) => return report_error(&e, out),
        },
    }
    Ok(Flow::Continue)
}

fn report_error<W: Write>(e: &ProviderError, out: &mut W) -> std::io::Result<Flow> {
    writeln!(out, "  [Error] {e}")?;
    if e.is_fatal() {
        writeln!(out, "  Check api_key and provider settings, then restart.")?;
        return Ok(Flow::Stop);
    }
    if let Some(secs) = e.retry_after_secs() {
        writeln!(out, "  Try again in {secs}s.")?;
    } else if e.is_retryable() {
        writeln!(out, "  Send the message again to retry.")?;
    }
    Ok(Flow::Continue)
}
