//! Frame codec: one JSON message per line

use shared::{Message, ProtocolViolation, Result};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest request the server accepts, line terminator excluded
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Read the next request frame, capped at [`MAX_FRAME_BYTES`].
/// `Ok(None)` means the peer closed the stream.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Message>>
where
    R: AsyncBufRead + Unpin,
{
    read_message_limited(reader, Some(MAX_FRAME_BYTES)).await
}

/// Read the next frame. With `limit: None` frames of any size are accepted;
/// responses such as the usage report grow without bound.
pub async fn read_message_limited<R>(reader: &mut R, limit: Option<usize>) -> Result<Option<Message>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut line = Vec::new();
        let read = match limit {
            // Room for the body plus a "\r\n" terminator.
            Some(limit) => {
                (&mut *reader)
                    .take(limit as u64 + 2)
                    .read_until(b'\n', &mut line)
                    .await?
            }
            None => reader.read_until(b'\n', &mut line).await?,
        };

        if read == 0 {
            return Ok(None);
        }

        let terminated = line.last() == Some(&b'\n');
        let body = strip_terminator(&line);
        if let Some(limit) = limit {
            if body.len() > limit || (!terminated && read == limit + 2) {
                return Err(ProtocolViolation::FrameTooLarge { limit }.into());
            }
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let message = serde_json::from_slice(body)
            .map_err(|e| ProtocolViolation::MalformedFrame(e.to_string()))?;
        return Ok(Some(message));
    }
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Serialize one frame, newline included
pub fn encode(message: &Message) -> Result<Vec<u8>> {
    let mut frame = serde_json::to_vec(message)?;
    frame.push(b'\n');
    Ok(frame)
}

/// Write `frame[*sent..]` and flush. `sent` advances with every byte that
/// went out, so a failed call can be resumed without repeating bytes.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8], sent: &mut usize) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while *sent < frame.len() {
        let written = writer.write(&frame[*sent..]).await?;
        if written == 0 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "connection accepted no more bytes",
            ));
        }
        *sent += written;
    }
    writer.flush().await
}

/// Write one frame and flush it
pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode(message)?;
    write_frame(writer, &frame, &mut 0).await?;
    Ok(())
}
