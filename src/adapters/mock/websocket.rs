//! Mock WebSocket connector for testing.
//!
//! Every successful [`MockConnector::connect`] produces a [`MockSocket`]: the
//! server side of an in-memory connection. Tests pull sockets out of the
//! connector in connection order, push frames into them and read what the
//! client wrote.

use async_trait::async_trait;
use futures::channel::mpsc as fmpsc;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Mutex as AsyncMutex};

use crate::traits::{CloseReason, SocketChannel, SocketConnector, SocketEvent, WsError};

/// One call to [`SocketConnector::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectAttempt {
    pub endpoint: Url,
    pub credential: String,
}

/// Server side of a mock connection.
pub struct MockSocket {
    attempt: ConnectAttempt,
    inbound: fmpsc::UnboundedSender<Result<SocketEvent, WsError>>,
    outbound: fmpsc::UnboundedReceiver<String>,
}

impl MockSocket {
    pub fn endpoint(&self) -> &Url {
        &self.attempt.endpoint
    }

    pub fn credential(&self) -> &str {
        &self.attempt.credential
    }

    /// Deliver a text frame to the client.
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.inbound.unbounded_send(Ok(SocketEvent::Text(text.into())));
    }

    pub fn send_json(&self, value: &serde_json::Value) {
        self.send_text(value.to_string());
    }

    /// Deliver the `connection: "ok"` readiness envelope.
    pub fn send_ready(&self) {
        self.send_json(&serde_json::json!({ "event": "connection", "data": "ok" }));
    }

    /// Deliver a close frame.
    pub fn close(&self, code: u16, reason: &str) {
        let _ = self
            .inbound
            .unbounded_send(Ok(SocketEvent::Closed(CloseReason::new(code, reason))));
    }

    /// Deliver a transport error.
    pub fn fail(&self, err: WsError) {
        let _ = self.inbound.unbounded_send(Err(err));
    }

    /// Wait for the next frame written by the client.
    ///
    /// Returns `None` once the client dropped its half of the connection.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.outbound.next().await
    }

    /// Next frame written by the client, if one is already buffered.
    pub fn try_next_sent(&mut self) -> Option<String> {
        self.outbound.try_next().ok().flatten()
    }
}

impl std::fmt::Debug for MockSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSocket")
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}

/// Mock [`SocketConnector`]. Clones share state.
#[derive(Clone)]
pub struct MockConnector {
    sockets_tx: mpsc::UnboundedSender<MockSocket>,
    sockets_rx: Arc<AsyncMutex<mpsc::UnboundedReceiver<MockSocket>>>,
    attempts: Arc<Mutex<Vec<ConnectAttempt>>>,
    failures: Arc<Mutex<VecDeque<WsError>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        let (sockets_tx, sockets_rx) = mpsc::unbounded_channel();
        Self {
            sockets_tx,
            sockets_rx: Arc::new(AsyncMutex::new(sockets_rx)),
            attempts: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Make the next connect attempt fail with `err`.
    pub fn fail_next(&self, err: WsError) {
        self.failures.lock().unwrap().push_back(err);
    }

    /// Wait for the next opened connection.
    pub async fn next_socket(&self) -> Option<MockSocket> {
        self.sockets_rx.lock().await.recv().await
    }

    /// Next opened connection, if one is already waiting.
    pub fn try_next_socket(&self) -> Option<MockSocket> {
        self.sockets_rx.try_lock().ok()?.try_recv().ok()
    }

    pub fn attempts(&self) -> Vec<ConnectAttempt> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocketConnector for MockConnector {
    async fn connect(&self, endpoint: &Url, credential: &str) -> Result<SocketChannel, WsError> {
        let attempt = ConnectAttempt {
            endpoint: endpoint.clone(),
            credential: credential.to_string(),
        };
        self.attempts.lock().unwrap().push(attempt.clone());

        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }

        let (inbound_tx, inbound_rx) = fmpsc::unbounded();
        let (outbound_tx, outbound_rx) = fmpsc::unbounded();

        let socket = MockSocket {
            attempt,
            inbound: inbound_tx,
            outbound: outbound_rx,
        };
        // Receiver lives as long as the connector.
        let _ = self.sockets_tx.send(socket);

        Ok(SocketChannel {
            sink: Box::pin(outbound_tx.sink_map_err(|e| WsError::SendFailed(e.to_string()))),
            stream: inbound_rx.boxed(),
        })
    }
}
