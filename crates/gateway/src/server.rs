//! KuwetexServer - TCP accept loop

use crate::session::{SessionContext, SessionDispatcher};
use litterbox::Shutdown;
use shared::Result;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::BufReader;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub struct KuwetexServer {
    listener: TcpListener,
    next_id: AtomicU64,
}

impl KuwetexServer {
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept clients until shutdown, one dispatcher task per connection.
    /// Waits for open sessions to close before returning.
    pub async fn serve(self, context: SessionContext, shutdown: Shutdown) -> Result<()> {
        let local = self.local_addr()?;
        info!(address = %local, "Server started, waiting for clients");

        let mut sessions = JoinSet::new();
        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = shutdown.triggered() => {
                    info!("Shutdown requested, no longer accepting clients");
                    break;
                }
            };

            let (stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            };

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            debug!(session_id = id, %peer, "Client connected");

            let (reader, writer) = stream.into_split();
            let dispatcher = SessionDispatcher::new(
                id,
                peer.to_string(),
                BufReader::new(reader),
                writer,
                context.clone(),
            );
            sessions.spawn(dispatcher.run());

            // Reap finished sessions so the set does not grow unbounded.
            while sessions.try_join_next().is_some() {}
        }

        while sessions.join_next().await.is_some() {}
        info!("Server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for KuwetexServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KuwetexServer")
            .field("local_addr", &self.listener.local_addr().ok())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}
