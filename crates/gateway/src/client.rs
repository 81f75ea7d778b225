//! Connection - client side of the protocol

use crate::codec;
use shared::{KuwetexError, Message, MessageKind, ProtocolViolation, Result};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

/// A logged-in connection to a Kuwetex server
#[derive(Debug)]
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    /// Dial the server and log in. Returns the connection and the
    /// server's greeting.
    pub async fn connect(addr: impl ToSocketAddrs, greeting: &str) -> Result<(Self, String)> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        let mut connection = Self {
            reader: BufReader::new(reader),
            writer,
        };
        let reply = connection.send(MessageKind::LogMeIn, greeting).await?;
        Ok((connection, reply))
    }

    /// Send one request and wait for its response
    pub async fn send(&mut self, kind: MessageKind, text: &str) -> Result<String> {
        codec::write_message(&mut self.writer, &Message::new(text, kind)).await?;

        // Responses carry the whole history, so they are not size-capped.
        let response = codec::read_message_limited(&mut self.reader, None)
            .await?
            .ok_or_else(|| {
                KuwetexError::Transport(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "server closed the connection",
                ))
            })?;
        debug!(header = response.header, "Response from server");

        if response.header != kind.header() {
            return Err(ProtocolViolation::MismatchedResponse {
                expected: kind,
                received: response.header,
            }
            .into());
        }
        Ok(response.text)
    }

    /// Log out and close the connection
    pub async fn close(mut self) -> Result<String> {
        let reply = self.send(MessageKind::LogOut, "").await?;
        self.writer.shutdown().await?;
        Ok(reply)
    }
}
