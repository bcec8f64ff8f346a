//! Shared fixtures for the integration tests.
//!
//! [`Harness`] wires a [`GatewayClient`] to the mock transports and records
//! every event it emits.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chatwatch::adapters::mock::http::MockResponse;
use chatwatch::adapters::mock::{MockConnector, MockHttpClient, MockSocket};
use chatwatch::traits::{HttpError, Response};
use chatwatch::{ChatWatchResult, ClientConfig, GatewayClient, GatewayEvent};
use serde_json::json;
use tokio::task::JoinHandle;

pub const TOKEN: &str = "test-token-12345";

/// What the acquire endpoint hands out for node `eu-1`.
pub const ACQUIRED_URL: &str = "https://eu-1.chatwatch.ksoft.si/ws?session=abc123";

/// Where the client should connect for [`ACQUIRED_URL`].
pub const NODE_ENDPOINT: &str = "wss://eu-1.cw.ksoft.si/ws?session=abc123";

pub fn acquire_ok(url: &str) -> MockResponse {
    MockResponse::Success(Response::json_body(200, &json!({ "url": url })))
}

pub fn acquire_status(status: u16, body: &str) -> MockResponse {
    MockResponse::Success(Response::new(status, body.to_string()))
}

pub fn network_down() -> MockResponse {
    MockResponse::Error(HttpError::ConnectionFailed("connection refused".to_string()))
}

pub struct Harness {
    pub client: Arc<GatewayClient>,
    pub http: MockHttpClient,
    pub connector: MockConnector,
    events: Arc<Mutex<Vec<GatewayEvent>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let http = MockHttpClient::new();
        let connector = MockConnector::new();
        let client = GatewayClient::with_transports(
            config,
            Arc::new(http.clone()),
            Arc::new(connector.clone()),
        );

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        client.on_event(Arc::new(move |event: &GatewayEvent| {
            sink.lock().unwrap().push(event.clone());
        }));

        Self {
            client: Arc::new(client),
            http,
            connector,
            events,
        }
    }

    /// Harness whose acquire endpoint always succeeds.
    pub fn serving() -> Self {
        let harness = Self::new();
        harness.http.set_default_response(acquire_ok(ACQUIRED_URL));
        harness
    }

    pub fn events(&self) -> Vec<GatewayEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Start `login` on its own task.
    pub fn spawn_login(&self) -> JoinHandle<ChatWatchResult<bool>> {
        let client = self.client.clone();
        tokio::spawn(async move { client.login(Some(TOKEN)).await })
    }

    /// Log in and complete the readiness handshake.
    pub async fn connect(&self) -> MockSocket {
        let login = self.spawn_login();
        let socket = self.next_socket().await;
        socket.send_ready();

        let ready = login.await.expect("login task panicked");
        assert!(matches!(ready, Ok(true)), "login failed: {:?}", ready);
        socket
    }

    pub async fn next_socket(&self) -> MockSocket {
        tokio::time::timeout(Duration::from_secs(60), self.connector.next_socket())
            .await
            .expect("no connection attempt")
            .expect("connector closed")
    }
}

/// Let spawned tasks run without advancing the clock.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
