//! Events delivered to the embedding application.
//!
//! Handlers registered with [`EventBus::register`] are called synchronously,
//! in registration order, on the client's connection task. Broadcast
//! subscribers receive the same events afterwards.

use std::sync::{Arc, RwLock};

use serde_json::Value;
use tokio::sync::broadcast;

use crate::traits::CloseReason;

/// Something the gateway connection reports.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// The node sent `connection: "ok"` on a fresh connection.
    Connected,
    /// A moderation verdict, passed through untouched.
    Response(Value),
    /// The socket closed. A reconnect is already scheduled.
    Close(CloseReason),
}

impl GatewayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GatewayEvent::Connected => "connected",
            GatewayEvent::Response(_) => "response",
            GatewayEvent::Close(_) => "close",
        }
    }
}

/// Observer for [`GatewayEvent`]s.
///
/// Handlers run on the connection task and must not block. Closures taking
/// `&GatewayEvent` implement this trait.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &GatewayEvent);
}

impl<F> EventHandler for F
where
    F: Fn(&GatewayEvent) + Send + Sync,
{
    fn handle(&self, event: &GatewayEvent) {
        self(event)
    }
}

/// Fan-out point for gateway events.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
    broadcast_tx: broadcast::Sender<GatewayEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (broadcast_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            handlers: RwLock::new(Vec::new()),
            broadcast_tx,
        }
    }

    pub fn register(&self, handler: Arc<dyn EventHandler>) {
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.push(handler);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.broadcast_tx.subscribe()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().map(|h| h.len()).unwrap_or(0)
    }

    /// Deliver `event` to every handler, then to broadcast subscribers.
    pub fn emit(&self, event: GatewayEvent) {
        // Snapshot so a handler may register another handler.
        let handlers: Vec<Arc<dyn EventHandler>> = match self.handlers.read() {
            Ok(handlers) => handlers.clone(),
            Err(_) => Vec::new(),
        };
        for handler in &handlers {
            handler.handle(&event);
        }
        // No subscribers is fine.
        let _ = self.broadcast_tx.send(event);
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count())
            .field("subscribers", &self.broadcast_tx.receiver_count())
            .finish()
    }
}
