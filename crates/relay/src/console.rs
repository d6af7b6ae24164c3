//! A [`ChatTransport`] that writes to a terminal.

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_error::{ConfigError, RelayResult, TransportError, TransportResult};
use relay_social::{ChatTransport, InboundMessage, RelayHandler, RelayOutcome};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Feed each non-empty line of `input` to the handler as a mention, until
/// EOF or cancellation.
///
/// Returns the number of lines relayed.
pub async fn relay_lines<R, T>(
    handler: &RelayHandler,
    transport: &T,
    input: R,
    channel: &str,
    author: &str,
    cancel: &CancellationToken,
) -> RelayResult<usize>
where
    R: AsyncBufRead + Unpin,
    T: ChatTransport + ?Sized,
{
    let mut lines = input.lines();
    let mut relayed = 0usize;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ConfigError::new(format!("Failed to read input: {}", e)))?
    {
        if cancel.is_cancelled() {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        relayed += 1;
        let inbound = InboundMessage::builder()
            .channel_id(channel)
            .message_id(format!("in-{}", relayed))
            .author(author)
            .content(line)
            .mentions_bot(true)
            .build()
            .map_err(|e| ConfigError::new(format!("Invalid message: {}", e)))?;

        if handler.handle(&inbound, transport).await == RelayOutcome::Ignored {
            debug!("Line ignored");
        }
    }
    Ok(relayed)
}

/// Prints replies and side effects as lines on a writer.
///
/// Message ids are sequence numbers, so pins and reactions can be followed
/// in the output.
#[derive(Debug)]
pub struct ConsoleTransport<W> {
    out: Mutex<W>,
    next_id: AtomicU64,
}

impl ConsoleTransport<std::io::Stdout> {
    /// A transport on standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleTransport<W> {
    /// Wrap a writer.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicU64::new(1),
        }
    }

    /// Hand back the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    /// Allocate the next message id.
    pub fn next_message_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    fn line(&self, text: &str) -> TransportResult<()> {
        let mut out = self.out.lock();
        writeln!(out, "{}", text)
            .and_then(|()| out.flush())
            .map_err(|e| TransportError::new(format!("console write failed: {}", e)))
    }
}

#[async_trait]
impl<W: Write + Send> ChatTransport for ConsoleTransport<W> {
    async fn send_message(&self, channel_id: &str, content: &str) -> TransportResult<String> {
        let id = self.next_message_id();
        self.line(&format!("[#{} {}] {}", channel_id, id, content))?;
        Ok(id)
    }

    async fn start_typing(&self, _channel_id: &str) -> TransportResult<()> {
        Ok(())
    }

    async fn add_reaction(
        &self,
        _channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> TransportResult<()> {
        self.line(&format!("(reacted {} to {})", emoji, message_id))
    }

    async fn set_status(&self, status: &str) -> TransportResult<()> {
        self.line(&format!("(status: {})", status))
    }

    async fn pin_message(&self, _channel_id: &str, message_id: &str) -> TransportResult<()> {
        self.line(&format!("(pinned {})", message_id))
    }

    async fn delete_previous_bot_message(
        &self,
        _channel_id: &str,
        _exclude_id: &str,
    ) -> TransportResult<Option<String>> {
        self.line("(delete previous: not supported on the console)")?;
        Ok(None)
    }

    async fn send_file(
        &self,
        _channel_id: &str,
        filename: &str,
        content: &[u8],
    ) -> TransportResult<()> {
        self.line(&format!("(file {}, {} bytes)", filename, content.len()))?;
        self.line(&String::from_utf8_lossy(content))
    }
}
