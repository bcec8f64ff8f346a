//! Client state shared between the public handle and the connection task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::messages::InboundMessage;
use crate::config::ClientConfig;
use crate::error::{ChatWatchError, ChatWatchResult};
use crate::events::{EventBus, GatewayEvent};
use crate::session::{Session, SessionAcquirer};
use crate::traits::{CloseReason, HttpClient, SocketChannel, SocketConnector};

/// Lifecycle of the gateway connection.
///
/// `Disconnected → Acquiring → Connecting → Connected → Disconnected`, with
/// `Acquiring` skipped while a session is still held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Acquiring,
    Connecting,
    Connected,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolves once the shutdown flag is set (or its sender is gone).
pub(crate) async fn wait_until_stopped(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stopped| *stopped).await;
}

pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) http: Arc<dyn HttpClient>,
    connector: Arc<dyn SocketConnector>,
    acquirer: SessionAcquirer,
    credential: Mutex<Option<String>>,
    session: Mutex<Option<Session>>,
    /// Writer for the open socket; `None` while disconnected.
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    state_tx: watch::Sender<ConnectionState>,
    /// Number of readiness transitions so far.
    ready_tx: watch::Sender<u64>,
    shutdown_tx: watch::Sender<bool>,
    pub(crate) events: EventBus,
}

impl Shared {
    pub(crate) fn new(
        config: ClientConfig,
        http: Arc<dyn HttpClient>,
        connector: Arc<dyn SocketConnector>,
    ) -> Self {
        let acquirer = SessionAcquirer::new(http.clone(), &config);
        let events = EventBus::new(config.event_capacity);
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (ready_tx, _) = watch::channel(0);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            http,
            connector,
            acquirer,
            credential: Mutex::new(None),
            session: Mutex::new(None),
            outbound: Mutex::new(None),
            state_tx,
            ready_tx,
            shutdown_tx,
            events,
        }
    }

    pub(crate) fn credential(&self) -> Option<String> {
        lock(&self.credential).clone()
    }

    pub(crate) fn set_credential(&self, credential: &str) {
        *lock(&self.credential) = Some(credential.to_string());
    }

    pub(crate) fn session(&self) -> Option<Session> {
        lock(&self.session).clone()
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    pub(crate) fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// How many connections have reported ready. Only ever grows.
    pub(crate) fn ready_count(&self) -> u64 {
        *self.ready_tx.borrow()
    }

    pub(crate) fn ready_receiver(&self) -> watch::Receiver<u64> {
        self.ready_tx.subscribe()
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    pub(crate) fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub(crate) fn signal_shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        lock(&self.outbound).take();
    }

    /// Resolves once shutdown has been signalled.
    pub(crate) async fn cancelled(&self) {
        let mut rx = self.shutdown_receiver();
        wait_until_stopped(&mut rx).await;
    }

    /// Sleep for `delay` unless shut down first. Returns `false` on shutdown.
    pub(crate) async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => !self.is_shutdown(),
            _ = self.cancelled() => false,
        }
    }

    /// The held session, or a freshly acquired one.
    async fn obtain_session(&self) -> ChatWatchResult<Session> {
        if let Some(session) = self.session() {
            return Ok(session);
        }

        let credential = self
            .credential()
            .filter(|c| !c.is_empty())
            .ok_or(ChatWatchError::MissingCredential)?;

        self.set_state(ConnectionState::Acquiring);
        let session = tokio::select! {
            result = self.acquirer.acquire(&credential) => result?,
            _ = self.cancelled() => return Err(ChatWatchError::Shutdown),
        };

        *lock(&self.session) = Some(session.clone());
        Ok(session)
    }

    /// Acquire a session if needed and open a socket to its node.
    pub(crate) async fn open(&self) -> ChatWatchResult<SocketChannel> {
        if self.is_shutdown() {
            return Err(ChatWatchError::Shutdown);
        }

        let session = self.obtain_session().await?;
        let credential = self.credential().ok_or(ChatWatchError::MissingCredential)?;

        self.set_state(ConnectionState::Connecting);
        info!(endpoint = %session.endpoint(), "Connecting to ChatWatch node");

        tokio::select! {
            result = self.connector.connect(session.endpoint(), &credential) => {
                result.map_err(ChatWatchError::from)
            }
            _ = self.cancelled() => Err(ChatWatchError::Shutdown),
        }
    }

    /// Install a fresh outbound queue for a newly opened socket.
    pub(crate) fn attach(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.outbound) = Some(tx);
        rx
    }

    /// Queue a text frame on the open socket.
    pub(crate) fn enqueue(&self, frame: String) -> ChatWatchResult<()> {
        match lock(&self.outbound).as_ref() {
            Some(tx) => tx.send(frame).map_err(|_| ChatWatchError::NotConnected),
            None => Err(ChatWatchError::NotConnected),
        }
    }

    /// Drop socket and session, then tell the application.
    pub(crate) fn handle_close(&self, reason: CloseReason) {
        lock(&self.outbound).take();
        lock(&self.session).take();
        self.set_state(ConnectionState::Disconnected);

        info!(code = reason.code, reason = %reason.reason, "ChatWatch connection closed");
        self.events.emit(GatewayEvent::Close(reason));
    }

    /// React to one inbound text frame.
    pub(crate) fn dispatch_frame(&self, text: &str) {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to parse frame: {} - {}", e, text);
                return;
            }
        };

        if message.is_ready() {
            let became_ready = self.state_tx.send_if_modified(|state| {
                if *state == ConnectionState::Connecting {
                    *state = ConnectionState::Connected;
                    true
                } else {
                    false
                }
            });
            if became_ready {
                self.ready_tx.send_modify(|count| *count += 1);
                info!("ChatWatch node ready");
                self.events.emit(GatewayEvent::Connected);
            }
            return;
        }

        match message {
            InboundMessage::MessageResponse(data) => {
                self.events.emit(GatewayEvent::Response(data));
            }
            InboundMessage::Connection(data) => {
                debug!("Connection status {}", data);
            }
            InboundMessage::Unknown { event, .. } => {
                debug!("Ignoring {} envelope", event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockConnector, MockHttpClient};
    use std::sync::Mutex as StdMutex;

    fn shared() -> Shared {
        Shared::new(
            ClientConfig::default(),
            Arc::new(MockHttpClient::new()),
            Arc::new(MockConnector::new()),
        )
    }

    fn record(shared: &Shared) -> Arc<StdMutex<Vec<GatewayEvent>>> {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        shared
            .events
            .register(Arc::new(move |event: &GatewayEvent| {
                sink.lock().unwrap().push(event.clone());
            }));
        seen
    }

    #[test]
    fn test_ready_only_counts_while_connecting() {
        let shared = shared();
        let seen = record(&shared);

        shared.dispatch_frame(r#"{"event":"connection","data":"ok"}"#);
        assert_eq!(shared.state(), ConnectionState::Disconnected);

        shared.set_state(ConnectionState::Connecting);
        shared.dispatch_frame(r#"{"event":"connection","data":"ok"}"#);
        shared.dispatch_frame(r#"{"event":"connection","data":"ok"}"#);

        assert_eq!(shared.state(), ConnectionState::Connected);
        assert_eq!(shared.ready_count(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![GatewayEvent::Connected]);

        shared.handle_close(CloseReason::new(1000, ""));
        assert_eq!(shared.ready_count(), 1);
    }

    #[test]
    fn test_malformed_and_unknown_frames_are_ignored() {
        let shared = shared();
        let seen = record(&shared);

        shared.dispatch_frame("{{{");
        shared.dispatch_frame(r#"{"event":"heartbeat","data":1}"#);

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_enqueue_requires_attached_socket() {
        let shared = shared();
        assert!(matches!(
            shared.enqueue("x".to_string()),
            Err(ChatWatchError::NotConnected)
        ));

        let mut rx = shared.attach();
        shared.enqueue("x".to_string()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "x");

        shared.handle_close(CloseReason::new(1000, ""));
        assert!(shared.enqueue("y".to_string()).is_err());
    }

    #[tokio::test]
    async fn test_open_without_credential_fails_fast() {
        let shared = shared();
        let result = shared.open().await;
        assert!(matches!(result, Err(ChatWatchError::MissingCredential)));
        assert_eq!(shared.state(), ConnectionState::Disconnected);
    }
}
