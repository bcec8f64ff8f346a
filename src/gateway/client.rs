use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::connection::run_connection_loop;
use super::messages::{IngestPayload, MessageRef, OutboundEnvelope, Snowflake};
use super::state::{lock, wait_until_stopped, ConnectionState, Shared};
use crate::adapters::{ReqwestHttpClient, TungsteniteConnector};
use crate::config::ClientConfig;
use crate::error::{ChatWatchError, ChatWatchResult};
use crate::events::{EventHandler, GatewayEvent};
use crate::session::Session;
use crate::traits::{authorization_headers, HttpClient, SocketConnector};

/// Client for the ChatWatch moderation gateway.
///
/// `login` acquires a session, opens the node socket and spawns a task that
/// keeps reconnecting after every close until [`GatewayClient::shutdown`]
/// is called or the client is dropped. If a reconnect cannot acquire a
/// session within the status cap the task ends and the client stays
/// disconnected until the next `login`.
///
/// The credential can only be changed through `login`.
pub struct GatewayClient {
    shared: Arc<Shared>,
    /// Reconnect task, once `login` has started one.
    task: Mutex<Option<JoinHandle<()>>>,
    /// Serializes `login` calls.
    login_lock: tokio::sync::Mutex<()>,
}

impl GatewayClient {
    /// Create a client using reqwest and tokio-tungstenite.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transports(
            config,
            Arc::new(ReqwestHttpClient::new()),
            Arc::new(TungsteniteConnector::new()),
        )
    }

    /// Create a client over custom transports.
    pub fn with_transports(
        config: ClientConfig,
        http: Arc<dyn HttpClient>,
        connector: Arc<dyn SocketConnector>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared::new(config, http, connector)),
            task: Mutex::new(None),
            login_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Connect to the gateway and wait for the node to report ready.
    ///
    /// A given credential replaces the stored one. Resolves to `true` on
    /// readiness.
    ///
    /// # Errors
    ///
    /// - [`ChatWatchError::MissingCredential`] if no credential is known.
    /// - [`ChatWatchError::SessionAcquisition`] once the acquire endpoint
    ///   has answered with a non-200 status too many times.
    /// - [`ChatWatchError::ReadyTimeout`] if the configured readiness
    ///   deadline passes. The reconnect task keeps running.
    /// - [`ChatWatchError::Shutdown`] after [`GatewayClient::shutdown`].
    ///
    /// A socket that fails to open is not an error here: it is reported as
    /// a close event and retried by the reconnect task.
    pub async fn login(&self, credential: Option<&str>) -> ChatWatchResult<bool> {
        if let Some(credential) = credential {
            self.set_credential(credential);
        }
        if self.shared.is_shutdown() {
            return Err(ChatWatchError::Shutdown);
        }

        let since = {
            let _guard = self.login_lock.lock().await;

            if self.is_running() {
                debug!("Reconnect task already running, waiting for readiness");
                None
            } else {
                // Read before the socket opens so an early readiness is counted.
                let since = self.shared.ready_count();
                let first = match self.shared.open().await {
                    Ok(channel) => Ok(channel),
                    Err(ChatWatchError::Socket(e)) => Err(ChatWatchError::Socket(e)),
                    Err(e) => {
                        self.shared.set_state(ConnectionState::Disconnected);
                        return Err(e);
                    }
                };

                let handle = tokio::spawn(run_connection_loop(self.shared.clone(), first));
                *lock(&self.task) = Some(handle);
                Some(since)
            }
        };

        match since {
            Some(since) => self.wait_ready_after(since).await,
            None => self.wait_until_ready().await,
        }
    }

    /// Wait until the current connection is ready.
    ///
    /// Honours `ready_timeout` from the config.
    pub async fn wait_until_ready(&self) -> ChatWatchResult<bool> {
        let since = self.shared.ready_count();
        if self.shared.state() == ConnectionState::Connected {
            return Ok(true);
        }
        self.wait_ready_after(since).await
    }

    /// Resolves on the first readiness after `since` readiness transitions,
    /// even if that connection has already closed again.
    async fn wait_ready_after(&self, since: u64) -> ChatWatchResult<bool> {
        let mut ready_rx = self.shared.ready_receiver();
        let mut shutdown_rx = self.shared.shutdown_receiver();

        let ready = async {
            tokio::select! {
                biased;
                _ = wait_until_stopped(&mut shutdown_rx) => Err(ChatWatchError::Shutdown),
                reached = wait_for_count(&mut ready_rx, since) => {
                    if reached {
                        Ok(true)
                    } else {
                        Err(ChatWatchError::Shutdown)
                    }
                }
            }
        };

        match self.shared.config.ready_timeout {
            Some(limit) => tokio::time::timeout(limit, ready)
                .await
                .map_err(|_| ChatWatchError::ReadyTimeout(limit))?,
            None => ready.await,
        }
    }

    /// Submit a chat message for moderation.
    ///
    /// Fire-and-forget: the frame is queued on the open socket and the
    /// verdict arrives later as [`GatewayEvent::Response`].
    pub fn ingest(&self, content: &str, target: &MessageRef) -> ChatWatchResult<()> {
        let frame =
            OutboundEnvelope::MessageIngest(IngestPayload::new(content, target)).to_frame()?;
        self.shared.enqueue(frame)
    }

    /// Fetch the moderation profile of a user from the current node.
    ///
    /// The body is returned as parsed JSON whatever the status code.
    pub async fn profile(&self, user_id: impl Into<Snowflake>) -> ChatWatchResult<Value> {
        let session = self.shared.session().ok_or(ChatWatchError::NotConnected)?;
        let credential = self
            .shared
            .credential()
            .ok_or(ChatWatchError::MissingCredential)?;

        let user_id = user_id.into().to_string();
        let url = session.profile_url(&self.shared.config.profile_scheme, &user_id)?;
        debug!(%url, "Fetching moderation profile");

        let response = self
            .shared
            .http
            .get(url.as_str(), &authorization_headers(&credential))
            .await?;
        Ok(response.json()?)
    }

    /// Replace the credential used for the next acquisition and socket.
    pub(crate) fn set_credential(&self, credential: &str) {
        self.shared.set_credential(credential);
    }

    pub fn session(&self) -> Option<Session> {
        self.shared.session()
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_receiver()
    }

    /// Register an event observer. See [`crate::events`].
    pub fn on_event(&self, handler: Arc<dyn EventHandler>) {
        self.shared.events.register(handler);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.shared.events.subscribe()
    }

    /// Whether the reconnect task is alive.
    pub fn is_running(&self) -> bool {
        lock(&self.task)
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Stop reconnecting and close the socket. Later logins fail.
    pub fn shutdown(&self) {
        if self.shared.is_shutdown() {
            return;
        }
        info!("Shutting down ChatWatch client");
        self.shared.signal_shutdown();
    }
}

impl Drop for GatewayClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("state", &self.state())
            .field("session", &self.session())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// `false` if the readiness channel closed first.
async fn wait_for_count(rx: &mut watch::Receiver<u64>, since: u64) -> bool {
    rx.wait_for(|count| *count > since).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockConnector, MockHttpClient};

    fn client() -> (GatewayClient, MockHttpClient, MockConnector) {
        let http = MockHttpClient::new();
        let connector = MockConnector::new();
        let client = GatewayClient::with_transports(
            ClientConfig::default(),
            Arc::new(http.clone()),
            Arc::new(connector.clone()),
        );
        (client, http, connector)
    }

    #[tokio::test]
    async fn test_new_client_is_idle() {
        let (client, _, _) = client();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(client.session().is_none());
        assert!(!client.is_running());
    }

    #[tokio::test]
    async fn test_login_without_credential_makes_no_request() {
        let (client, http, connector) = client();

        let result = client.login(None).await;

        assert!(matches!(result, Err(ChatWatchError::MissingCredential)));
        assert_eq!(http.request_count(), 0);
        assert_eq!(connector.attempt_count(), 0);
        assert!(!client.is_running());
    }

    #[tokio::test]
    async fn test_ingest_while_disconnected() {
        let (client, _, _) = client();
        let result = client.ingest("hello", &MessageRef::new(1u64, 4u64, 2u64, 3u64));
        assert!(matches!(result, Err(ChatWatchError::NotConnected)));
    }

    #[tokio::test]
    async fn test_profile_without_session() {
        let (client, http, _) = client();
        client.set_credential("token");

        let result = client.profile(42u64).await;

        assert!(matches!(result, Err(ChatWatchError::NotConnected)));
        assert_eq!(http.request_count(), 0);
    }

    #[tokio::test]
    async fn test_login_after_shutdown() {
        let (client, http, _) = client();
        client.shutdown();

        let result = client.login(Some("token")).await;

        assert!(matches!(result, Err(ChatWatchError::Shutdown)));
        assert_eq!(http.request_count(), 0);
    }
}
