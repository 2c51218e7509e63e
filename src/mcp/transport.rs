use anyhow::{anyhow, Result};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::debug;

use super::types::{McpMessage, McpNotification, McpRequest, McpResponse};

/// Newline-delimited JSON-RPC over any async byte pipe.
pub struct LineTransport<R, W> {
    reader: FramedRead<BufReader<R>, LinesCodec>,
    writer: FramedWrite<W, LinesCodec>,
}

pub type StdioTransport = LineTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: FramedRead::new(BufReader::new(reader), LinesCodec::new()),
            writer: FramedWrite::new(writer, LinesCodec::new()),
        }
    }

    /// Next non-blank line, or `None` at end of input.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        while let Some(line) = self.reader.next().await {
            let line = line.map_err(|e| anyhow!("Transport error: {}", e))?;
            if line.trim().is_empty() {
                continue;
            }
            debug!("Received: {}", line);
            return Ok(Some(line));
        }

        debug!("EOF reached");
        Ok(None)
    }

    pub async fn write_response(&mut self, response: McpResponse) -> Result<()> {
        let json = serde_json::to_string(&response)?;
        debug!("Sending: {}", json);

        self.writer.send(json).await?;

        Ok(())
    }
}

/// Classifies one JSON-RPC line: objects with an `id` are requests, the rest notifications.
pub fn parse_message(line: &str) -> Result<McpMessage> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| anyhow!("Invalid JSON: {}", e))?;

    let is_request = match value.as_object() {
        Some(obj) => obj.contains_key("id"),
        None => return Err(anyhow!("Invalid JSON-RPC message structure")),
    };

    if is_request {
        serde_json::from_value::<McpRequest>(value)
            .map(McpMessage::Request)
            .map_err(|e| anyhow!("Invalid JSON-RPC request: {}", e))
    } else {
        serde_json::from_value::<McpNotification>(value)
            .map(McpMessage::Notification)
            .map_err(|e| anyhow!("Invalid JSON-RPC notification: {}", e))
    }
}
