//! SessionDispatcher - per-connection request/response loop
//!
//! ```text
//!  CONNECTING ──LOG_ME_IN──▶ ACTIVE ──LOG_OUT / error / EOF──▶ CLOSED
//!      │                                                        ▲
//!      └──────────── any other request / error / EOF ───────────┘
//! ```
//!
//! Exactly one response is written per request, in request order.

use crate::codec;
use crate::registry::{ConnectionRegistry, SessionHandle};
use litterbox::{DataBank, LitterBox, Shutdown};
use shared::{Message, MessageKind, ProtocolViolation, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

pub const CONNECTED: &str = "You are connected.";
pub const LOGGED_OUT: &str = "You are logged out.";
pub const CLEANING_DONE: &str = "Cleaning done.";
pub const CLEANING_FAILED: &str = "Error. Failed to clean the litter box.";

/// Collaborators every session works against
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub litter_box: Arc<LitterBox>,
    pub data_bank: Arc<DataBank>,
    pub registry: Arc<ConnectionRegistry>,
    pub shutdown: Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closed,
}

enum Flow {
    Continue,
    Close,
}

pub struct SessionDispatcher<R, W> {
    id: u64,
    peer: String,
    reader: R,
    writer: W,
    state: SessionState,
    registered: bool,
    context: SessionContext,
}

impl<R, W> SessionDispatcher<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(id: u64, peer: impl Into<String>, reader: R, writer: W, context: SessionContext) -> Self {
        Self {
            id,
            peer: peer.into(),
            reader,
            writer,
            state: SessionState::Connecting,
            registered: false,
            context,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Serve requests until the session closes
    pub async fn run(mut self) -> SessionState {
        debug!(session_id = self.id, peer = %self.peer, "Session opened");

        loop {
            let next = tokio::select! {
                read = codec::read_message(&mut self.reader) => read,
                _ = self.context.shutdown.triggered() => {
                    info!(session_id = self.id, "Server shutting down, closing session");
                    break;
                }
            };

            let message = match next {
                Ok(Some(message)) => message,
                Ok(None) => {
                    debug!(session_id = self.id, "Client closed the connection");
                    break;
                }
                Err(e) => {
                    warn!(session_id = self.id, error = %e, "Error, failed to read request");
                    break;
                }
            };

            debug!(
                session_id = self.id,
                header = message.header,
                text = %message.text,
                "Message from client"
            );

            match self.respond(message).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Close) => break,
                Err(e) => {
                    warn!(session_id = self.id, error = %e, "Error while sending message back to the client");
                    break;
                }
            }
        }

        self.close().await;
        self.state
    }

    async fn respond(&mut self, message: Message) -> Result<Flow> {
        let kind = match message.kind() {
            Ok(kind) => kind,
            Err(violation) => {
                warn!(session_id = self.id, %violation, "Protocol violation, disconnecting user");
                let reply = Message {
                    header: message.header,
                    text: format!("Error. {}", violation),
                };
                self.send_best_effort(reply).await;
                return Ok(Flow::Close);
            }
        };

        if self.state == SessionState::Connecting && kind != MessageKind::LogMeIn {
            let violation = ProtocolViolation::NotLoggedIn(kind);
            warn!(session_id = self.id, %violation, "Protocol violation, disconnecting user");
            self.send_best_effort(Message::new(format!("Error. {}", violation), kind))
                .await;
            return Ok(Flow::Close);
        }

        match kind {
            MessageKind::LogMeIn => {
                self.log_in().await;
                self.send(Message::new(CONNECTED, kind)).await?;
                Ok(Flow::Continue)
            }
            MessageKind::LogOut => {
                self.send(Message::new(LOGGED_OUT, kind)).await?;
                Ok(Flow::Close)
            }
            MessageKind::GetRaport => {
                let text = self.context.data_bank.report().unwrap_or_else(|e| {
                    warn!(session_id = self.id, error = %e, "Failed to build report");
                    format!("Error. Failed to read the report: {}", e)
                });
                self.send(Message::new(text, kind)).await?;
                Ok(Flow::Continue)
            }
            MessageKind::ForceCleaning => {
                let text = match self.context.litter_box.reclaim(true).await {
                    Ok(outcome) => {
                        debug!(session_id = self.id, ?outcome, "Forced cleaning finished");
                        CLEANING_DONE.to_string()
                    }
                    Err(e) => {
                        warn!(session_id = self.id, error = %e, "Forced cleaning failed");
                        CLEANING_FAILED.to_string()
                    }
                };
                self.send(Message::new(text, kind)).await?;
                Ok(Flow::Continue)
            }
            MessageKind::GetRecommendations => {
                let text = self.context.data_bank.prescriptions().unwrap_or_else(|e| {
                    warn!(session_id = self.id, error = %e, "Failed to build prescriptions");
                    format!("Error. Failed to read the recommendations: {}", e)
                });
                self.send(Message::new(text, kind)).await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn log_in(&mut self) {
        let handle = SessionHandle::new(self.id, self.peer.clone());
        if !self.context.registry.put(self.id, handle).await {
            debug!(session_id = self.id, "Session already logged in");
        }
        self.registered = true;
        self.state = SessionState::Active;
        let online = self.context.registry.size().await;
        info!(session_id = self.id, online, "User logged in");
    }

    /// Write a response. A failed write is retried once, resuming after
    /// the last byte that went out.
    async fn send(&mut self, message: Message) -> Result<()> {
        let frame = codec::encode(&message)?;
        let mut sent = 0;
        if let Err(first) = codec::write_frame(&mut self.writer, &frame, &mut sent).await {
            warn!(
                session_id = self.id,
                error = %first,
                sent,
                total = frame.len(),
                "Failed to send response, retrying once"
            );
            codec::write_frame(&mut self.writer, &frame, &mut sent).await?;
        }
        Ok(())
    }

    async fn send_best_effort(&mut self, message: Message) {
        if let Err(e) = self.send(message).await {
            debug!(session_id = self.id, error = %e, "Could not deliver error response");
        }
    }

    async fn close(&mut self) {
        self.state = SessionState::Closed;
        if self.registered {
            self.context.registry.remove(self.id).await;
            self.registered = false;
        }
        if let Err(e) = self.writer.shutdown().await {
            debug!(session_id = self.id, error = %e, "Connection already gone");
        }
        let online = self.context.registry.size().await;
        info!(session_id = self.id, online, "User has disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litterbox::{BoxTimings, CleaningOutcome, ShutdownTrigger, UsageRecord};
    use sensors::{CatReading, SensorSuite};
    use shared::{Cat, FixedRandom, Gender, RandomSource};
    use std::io;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};
    use tokio::io::{BufReader, DuplexStream, ReadHalf, WriteHalf};
    use tokio::task::JoinHandle;

    fn create_context(random: Arc<dyn RandomSource>) -> (SessionContext, ShutdownTrigger) {
        let (trigger, shutdown) = Shutdown::channel();
        let context = SessionContext {
            litter_box: Arc::new(LitterBox::new(
                SensorSuite::standard(random.clone()),
                random.clone(),
                BoxTimings::default(),
                shutdown.clone(),
            )),
            data_bank: Arc::new(DataBank::new(random)),
            registry: Arc::new(ConnectionRegistry::new()),
            shutdown,
        };
        (context, trigger)
    }

    /// Client end of an in-memory session
    struct TestClient {
        reader: BufReader<ReadHalf<DuplexStream>>,
        writer: WriteHalf<DuplexStream>,
    }

    impl TestClient {
        async fn request(&mut self, kind: MessageKind, text: &str) -> Option<Message> {
            self.request_raw(Message::new(text, kind)).await
        }

        async fn request_raw(&mut self, message: Message) -> Option<Message> {
            codec::write_message(&mut self.writer, &message).await.ok()?;
            codec::read_message(&mut self.reader).await.ok().flatten()
        }
    }

    fn open_session(id: u64, context: &SessionContext) -> (TestClient, JoinHandle<SessionState>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let dispatcher = SessionDispatcher::new(
            id,
            format!("test-{}", id),
            BufReader::new(server_read),
            server_write,
            context.clone(),
        );
        let handle = tokio::spawn(dispatcher.run());

        let (client_read, client_write) = tokio::io::split(client);
        let client = TestClient {
            reader: BufReader::new(client_read),
            writer: client_write,
        };
        (client, handle)
    }

    fn create_record(name: &str) -> UsageRecord {
        UsageRecord::new(
            CatReading {
                name: name.to_string(),
                eyes: "red".to_string(),
                weight: "3 kg".to_string(),
                health: "Health: fine.".to_string(),
            },
            42,
        )
    }

    /// Writer that optionally accepts a short prefix, then fails a set
    /// number of writes before accepting bytes
    #[derive(Clone)]
    struct FlakyWriter {
        prefix: Arc<Mutex<Option<usize>>>,
        failures_left: Arc<Mutex<usize>>,
        written: Arc<Mutex<Vec<u8>>>,
    }

    impl FlakyWriter {
        fn new(failures: usize) -> Self {
            Self {
                prefix: Arc::new(Mutex::new(None)),
                failures_left: Arc::new(Mutex::new(failures)),
                written: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn partial(prefix: usize, failures: usize) -> Self {
            let writer = Self::new(failures);
            *writer.prefix.lock().unwrap() = Some(prefix);
            writer
        }

        fn bytes(&self) -> Vec<u8> {
            self.written.lock().unwrap().clone()
        }

        fn frames(&self) -> usize {
            self.written.lock().unwrap().iter().filter(|b| **b == b'\n').count()
        }
    }

    impl AsyncWrite for FlakyWriter {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            if let Some(prefix) = self.prefix.lock().unwrap().take() {
                let accepted = prefix.min(buf.len());
                self.written.lock().unwrap().extend_from_slice(&buf[..accepted]);
                return Poll::Ready(Ok(accepted));
            }
            let mut failures = self.failures_left.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "flaky")));
            }
            self.written.lock().unwrap().extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn scripted_requests(kinds: &[MessageKind]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for kind in kinds {
            bytes.extend(serde_json::to_vec(&Message::new("", *kind)).unwrap());
            bytes.push(b'\n');
        }
        bytes
    }

    // ============== Login / Logout Tests ==============

    #[tokio::test]
    async fn test_login_registers_session() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));
        let (mut client, handle) = open_session(1, &context);

        let response = client.request(MessageKind::LogMeIn, "hello").await.unwrap();
        assert_eq!(response.kind(), Ok(MessageKind::LogMeIn));
        assert_eq!(response.text, CONNECTED);
        assert!(context.registry.contains(1).await);

        let response = client.request(MessageKind::LogOut, "bye").await.unwrap();
        assert_eq!(response.kind(), Ok(MessageKind::LogOut));
        assert_eq!(response.text, LOGGED_OUT);

        assert_eq!(handle.await.unwrap(), SessionState::Closed);
        assert_eq!(context.registry.size().await, 0);
    }

    #[tokio::test]
    async fn test_repeated_login_registers_once() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));
        let (mut client, _handle) = open_session(3, &context);

        client.request(MessageKind::LogMeIn, "").await.unwrap();
        let again = client.request(MessageKind::LogMeIn, "").await.unwrap();
        assert_eq!(again.text, CONNECTED);
        assert_eq!(context.registry.size().await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_deregisters() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));
        let (mut client, handle) = open_session(2, &context);

        client.request(MessageKind::LogMeIn, "").await.unwrap();
        assert_eq!(context.registry.size().await, 1);

        drop(client);
        assert_eq!(handle.await.unwrap(), SessionState::Closed);
        assert_eq!(context.registry.size().await, 0);
    }

    // ============== Protocol Violation Tests ==============

    #[tokio::test]
    async fn test_request_before_login_closes_session() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));
        let (mut client, handle) = open_session(4, &context);

        let response = client.request(MessageKind::GetRaport, "").await.unwrap();
        assert_eq!(response.kind(), Ok(MessageKind::GetRaport));
        assert!(response.text.starts_with("Error."));

        assert_eq!(handle.await.unwrap(), SessionState::Closed);
        assert_eq!(context.registry.size().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_header_closes_and_deregisters() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));
        let (mut client, handle) = open_session(5, &context);

        client.request(MessageKind::LogMeIn, "").await.unwrap();
        let response = client
            .request_raw(Message {
                header: 200,
                text: "???".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.header, 200);
        assert!(response.text.contains("Unknown message header 200"));

        assert_eq!(handle.await.unwrap(), SessionState::Closed);
        assert!(!context.registry.contains(5).await);
    }

    #[tokio::test]
    async fn test_malformed_frame_closes_silently() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let handle = tokio::spawn(
            SessionDispatcher::new(6, "raw", BufReader::new(server_read), server_write, context.clone())
                .run(),
        );

        let (client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(b"{ definitely not json\n").await.unwrap();

        assert_eq!(handle.await.unwrap(), SessionState::Closed);
        let mut reader = BufReader::new(client_read);
        assert_eq!(codec::read_message(&mut reader).await.unwrap(), None);
    }

    // ============== Query Tests ==============

    #[tokio::test]
    async fn test_report_and_recommendations() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));
        context.data_bank.append(create_record("Filemon")).unwrap();
        context.data_bank.append_illness("Filemon", "2024-03-03").unwrap();
        let (mut client, _handle) = open_session(7, &context);

        client.request(MessageKind::LogMeIn, "").await.unwrap();

        let report = client.request(MessageKind::GetRaport, "").await.unwrap();
        assert_eq!(report.kind(), Ok(MessageKind::GetRaport));
        assert!(report.text.contains("* Filemon; red eyes; weight: 3 kg;  42ms"));

        let advice = client.request(MessageKind::GetRecommendations, "").await.unwrap();
        assert_eq!(advice.kind(), Ok(MessageKind::GetRecommendations));
        assert!(advice.text.contains("Filemon was ill on 2024-03-03"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_cleaning_resets_dirtiness() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(1)));
        let cat = Cat::new("Garfield", "green", Gender::Male);
        for _ in 0..2 {
            context.litter_box.acquire_and_use(&cat).await.unwrap();
        }
        assert_eq!(context.litter_box.dirtiness().await, 4);
        let (mut client, _handle) = open_session(8, &context);

        client.request(MessageKind::LogMeIn, "").await.unwrap();
        let response = client.request(MessageKind::ForceCleaning, "").await.unwrap();

        assert_eq!(response.kind(), Ok(MessageKind::ForceCleaning));
        assert_eq!(response.text, CLEANING_DONE);
        assert_eq!(context.litter_box.dirtiness().await, 0);
        assert_eq!(
            context.litter_box.reclaim(false).await.unwrap(),
            CleaningOutcome::Skipped { dirtiness: 0 }
        );
    }

    #[tokio::test]
    async fn test_every_kind_is_answered_in_kind() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));
        let (mut client, _handle) = open_session(9, &context);

        // LOG_OUT closes the session, so it goes last.
        let mut kinds: Vec<_> = MessageKind::ALL
            .into_iter()
            .filter(|kind| *kind != MessageKind::LogOut)
            .collect();
        kinds.push(MessageKind::LogOut);

        for kind in kinds {
            let response = client.request(kind, "").await.unwrap();
            assert_eq!(response.header, kind.header(), "pairing broken for {}", kind);
        }
    }

    // ============== Send Retry Tests ==============

    #[tokio::test]
    async fn test_single_send_failure_is_retried() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));
        let writer = FlakyWriter::new(1);
        let requests = scripted_requests(&[MessageKind::LogMeIn, MessageKind::GetRaport]);

        let state = SessionDispatcher::new(10, "flaky", requests.as_slice(), writer.clone(), context.clone())
            .run()
            .await;

        assert_eq!(state, SessionState::Closed);
        assert_eq!(writer.frames(), 2);
    }

    #[tokio::test]
    async fn test_second_send_failure_closes_session() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));
        let writer = FlakyWriter::new(2);
        let requests = scripted_requests(&[MessageKind::LogMeIn, MessageKind::GetRaport]);

        let state = SessionDispatcher::new(11, "broken", requests.as_slice(), writer.clone(), context.clone())
            .run()
            .await;

        assert_eq!(state, SessionState::Closed);
        assert_eq!(writer.frames(), 0);
        assert_eq!(context.registry.size().await, 0);
    }

    #[tokio::test]
    async fn test_retry_after_partial_write_sends_only_the_rest() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));
        let writer = FlakyWriter::partial(5, 1);
        let requests = scripted_requests(&[MessageKind::LogMeIn, MessageKind::GetRaport]);

        let state = SessionDispatcher::new(13, "partial", requests.as_slice(), writer.clone(), context.clone())
            .run()
            .await;
        assert_eq!(state, SessionState::Closed);

        let bytes = writer.bytes();
        let mut reader = bytes.as_slice();
        let connected = codec::read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(connected.kind(), Ok(MessageKind::LogMeIn));
        assert_eq!(connected.text, CONNECTED);
        let report = codec::read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(report.kind(), Ok(MessageKind::GetRaport));
        assert_eq!(codec::read_message(&mut reader).await.unwrap(), None);
    }

    // ============== Shutdown / Concurrency Tests ==============

    #[tokio::test]
    async fn test_shutdown_closes_idle_session() {
        let (context, trigger) = create_context(Arc::new(FixedRandom(0)));
        let (mut client, handle) = open_session(12, &context);

        client.request(MessageKind::LogMeIn, "").await.unwrap();
        trigger.trigger();

        assert_eq!(handle.await.unwrap(), SessionState::Closed);
        assert_eq!(context.registry.size().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_registry_tracks_concurrent_sessions() {
        let (context, _trigger) = create_context(Arc::new(FixedRandom(0)));

        let mut stay = Vec::new();
        let mut leave = Vec::new();
        for id in 0..20u64 {
            let (mut client, handle) = open_session(id, &context);
            client.request(MessageKind::LogMeIn, "").await.unwrap();
            if id % 4 == 0 {
                leave.push((client, handle));
            } else {
                stay.push((client, handle));
            }
        }
        assert_eq!(context.registry.size().await, 20);

        let exits: Vec<_> = leave
            .into_iter()
            .map(|(mut client, handle)| {
                tokio::spawn(async move {
                    client.request(MessageKind::LogOut, "").await;
                    handle.await.unwrap()
                })
            })
            .collect();
        for exit in exits {
            assert_eq!(exit.await.unwrap(), SessionState::Closed);
        }

        assert_eq!(context.registry.size().await, 15);
        assert_eq!(stay.len(), 15);
    }
}
