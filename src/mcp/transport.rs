//! Stdio transport
//!
//! Newline-delimited JSON-RPC: one request per input line, one response per
//! output line. Runs until the reader hits EOF.

use bytes::BytesMut;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, PARSE_ERROR};
use crate::mcp::server::SevDeskMcpServer;
use futures::StreamExt;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, FramedRead, LinesCodec, LinesCodecError};

/// Longest accepted input line
pub const MAX_LINE_LENGTH: usize = 8 * 1024 * 1024;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read input: {0}")]
    Codec(#[from] LinesCodecError),

    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One framed input line
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Line(String),
    /// A line longer than [`MAX_LINE_LENGTH`]; the codec skips to its newline.
    TooLong,
}

/// [`LinesCodec`] that reports oversized lines as a frame instead of an error,
/// so the stream keeps going after one.
struct MessageCodec {
    lines: LinesCodec,
}

impl MessageCodec {
    fn new(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
        }
    }

    fn frame(
        decoded: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<Frame>, LinesCodecError> {
        match decoded {
            Ok(line) => Ok(line.map(Frame::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Frame::TooLong)),
            Err(e) => Err(e),
        }
    }
}

impl Decoder for MessageCodec {
    type Item = Frame;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        Self::frame(self.lines.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        Self::frame(self.lines.decode_eof(buf))
    }
}

/// Serve requests from `reader`, writing responses to `writer`
pub async fn serve<R, W>(
    server: &SevDeskMcpServer,
    reader: R,
    mut writer: W,
) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut frames = FramedRead::new(reader, MessageCodec::new(MAX_LINE_LENGTH));

    while let Some(frame) = frames.next().await {
        let line = match frame? {
            Frame::Line(line) => line,
            Frame::TooLong => {
                tracing::warn!("Dropped input line longer than {} bytes", MAX_LINE_LENGTH);
                let response =
                    JsonRpcResponse::error(None, PARSE_ERROR, "Parse error: message too large");
                send_response(&mut writer, &response).await?;
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        tracing::debug!("Received: {}", line);

        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => server.handle_request(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                None,
                PARSE_ERROR,
                &format!("Parse error: {}", e),
            )),
        };

        if let Some(response) = response {
            send_response(&mut writer, &response).await?;
        }
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}

async fn send_response<W>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_string(response)?;
    tracing::debug!("Sending: {}", json);
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
