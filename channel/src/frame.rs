//! Native messaging wire framing.
//!
//! Chrome and Firefox frame every native messaging payload as a 4-byte
//! little-endian length header followed by UTF-8 JSON. This module speaks
//! that format from the browser side of the pipe, over any async stream so
//! tests can substitute in-memory pipes for a child process.

use crate::error::{ChannelError, ChannelResult};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Encode a JSON payload into a length-prefixed frame.
///
/// # Errors
///
/// Returns a protocol error if the serialized payload exceeds `max_size`.
pub fn encode_frame(payload: &Value, max_size: usize) -> ChannelResult<Vec<u8>> {
    let json = serde_json::to_string(payload)?;
    let body = json.as_bytes();

    if body.len() > max_size {
        return Err(ChannelError::protocol(format!(
            "Outgoing message length {} exceeds maximum size {}",
            body.len(),
            max_size
        )));
    }

    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(body);
    Ok(frame)
}

/// Write one framed payload and flush it.
///
/// # Errors
///
/// Returns an error if serialization or I/O fails.
pub async fn write_frame<W>(writer: &mut W, payload: &Value, max_size: usize) -> ChannelResult<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload, max_size)?;
    writer.write_all(&frame).await?;
    // Flush so the host sees the message immediately
    writer.flush().await?;
    Ok(())
}

/// Read one framed payload.
///
/// Returns `Ok(None)` on a clean end-of-stream before any header byte,
/// which is how a peer-initiated disconnect appears on the pipe.
///
/// # Errors
///
/// Returns a protocol error for zero-length or oversized frames, truncated
/// payloads, invalid UTF-8, or invalid JSON.
pub async fn read_frame<R>(reader: &mut R, max_size: usize) -> ChannelResult<Option<Value>>
where
    R: AsyncRead + Unpin,
{
    let mut length_bytes = [0u8; 4];

    // A clean EOF on the first header byte is a disconnect, not an error.
    match reader.read_exact(&mut length_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let message_length = u32::from_le_bytes(length_bytes) as usize;

    if message_length == 0 {
        return Err(ChannelError::protocol("Message length cannot be zero"));
    }

    if message_length > max_size {
        return Err(ChannelError::protocol(format!(
            "Message length {} exceeds maximum size {}",
            message_length, max_size
        )));
    }

    let mut body = vec![0u8; message_length];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|e| ChannelError::protocol(format!("Truncated message payload: {}", e)))?;

    let text = String::from_utf8(body)
        .map_err(|e| ChannelError::protocol(format!("Invalid UTF-8 in message: {}", e)))?;

    let payload: Value = serde_json::from_str(&text)
        .map_err(|e| ChannelError::protocol(format!("Invalid JSON in message: {}", e)))?;

    Ok(Some(payload))
}
