//! CLI channel — interactive terminal-based chat.
//!
//! Reads lines from stdin, writes replies to stdout.
//! Used for `parley chat` interactive mode.

use async_trait::async_trait;
use parley_core::channel::{Channel, ChannelId, ChannelMessage};
use parley_core::error::ChannelError;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

type LineSource = Box<dyn AsyncBufRead + Send + Unpin>;

/// Interactive CLI channel for terminal-based chat.
pub struct CliChannel {
    id: ChannelId,
    input: Mutex<Option<LineSource>>,
}

impl CliChannel {
    /// A channel reading from stdin.
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }

    /// A channel reading from any buffered source.
    pub fn from_reader(reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        Self {
            id: ChannelId("cli".into()),
            input: Mutex::new(Some(Box::new(reader))),
        }
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Words that end the chat.
pub fn is_exit_command(line: &str) -> bool {
    matches!(line.trim(), "exit" | "quit" | "/exit" | "/quit" | ":q")
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    /// Lines are forwarded untouched (blank ones included); the session
    /// decides what to ignore. The stream closes on EOF or an exit word.
    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        let reader = self
            .input
            .lock()
            .await
            .take()
            .ok_or_else(|| ChannelError::NotConfigured("cli channel already started".into()))?;

        let (tx, rx) = mpsc::channel(32);
        let channel_id = self.id.clone();

        tokio::spawn(async move {
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if is_exit_command(&line) {
                            debug!("Exit command received");
                            break;
                        }

                        let msg = ChannelMessage::new(channel_id.clone(), line);
                        if tx.send(Ok(msg)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(e) => {
                        let _ = tx.send(Err(ChannelError::ConnectionLost(e.to_string()))).await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, content: &str) -> Result<(), ChannelError> {
        println!("{content}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn channel_over(text: &str) -> CliChannel {
        CliChannel::from_reader(Cursor::new(text.as_bytes().to_vec()))
    }

    async fn collect(channel: &CliChannel) -> Vec<String> {
        let mut rx = channel.start().await.unwrap();
        let mut out = Vec::new();
        while let Some(msg) = rx.recv().await {
            out.push(msg.unwrap().content);
        }
        out
    }

    #[test]
    fn cli_channel_properties() {
        let ch = channel_over("");
        assert_eq!(ch.name(), "cli");
        assert_eq!(ch.id().0, "cli");
    }

    #[tokio::test]
    async fn forwards_lines_until_eof() {
        let ch = channel_over("Hello\n\n  spaced  \nlast");
        assert_eq!(collect(&ch).await, vec!["Hello", "", "  spaced  ", "last"]);
    }

    #[tokio::test]
    async fn stops_at_exit_command() {
        let ch = channel_over("one\n quit \nnever seen\n");
        assert_eq!(collect(&ch).await, vec!["one"]);
    }

    #[tokio::test]
    async fn second_start_fails() {
        let ch = channel_over("x\n");
        let _rx = ch.start().await.unwrap();
        assert!(ch.start().await.is_err());
    }

    #[test]
    fn exit_words() {
        for word in ["exit", "quit", "/exit", "/quit", ":q", "  exit  "] {
            assert!(is_exit_command(word), "{word}");
        }
        assert!(!is_exit_command("exit now"));
        assert!(!is_exit_command(""));
    }
}
