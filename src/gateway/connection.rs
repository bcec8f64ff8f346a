//! The reconnect task.
//!
//! One task per client drives the open socket and, after every close,
//! waits the reconnect delay, re-acquires a session and opens a new socket.
//! It stops on shutdown, or when the acquire endpoint keeps rejecting the
//! credential until the status cap is reached.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::state::{wait_until_stopped, ConnectionState, Shared};
use crate::error::{ChatWatchError, ChatWatchResult};
use crate::traits::{CloseReason, SocketChannel, SocketEvent};

/// How a single connection ended.
#[derive(Debug)]
pub(crate) enum ConnectionEnd {
    Closed(CloseReason),
    Shutdown,
}

/// Pump frames between one open socket and the client until it closes.
pub(crate) async fn drive_connection(
    shared: &Shared,
    channel: SocketChannel,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
) -> ConnectionEnd {
    let SocketChannel {
        mut sink,
        mut stream,
    } = channel;
    let mut shutdown_rx = shared.shutdown_receiver();

    loop {
        tokio::select! {
            _ = wait_until_stopped(&mut shutdown_rx) => {
                debug!("Shutdown signal received, closing connection");
                let _ = sink.close().await;
                return ConnectionEnd::Shutdown;
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(SocketEvent::Text(text))) => {
                        debug!("Received frame: {}", text);
                        shared.dispatch_frame(&text);
                    }
                    Some(Ok(SocketEvent::Closed(reason))) => {
                        return ConnectionEnd::Closed(reason);
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        return ConnectionEnd::Closed(CloseReason::abnormal(e.to_string()));
                    }
                    None => {
                        info!("WebSocket stream ended");
                        return ConnectionEnd::Closed(CloseReason::abnormal(""));
                    }
                }
            }
            Some(frame) = outbound_rx.recv() => {
                debug!("Sending frame: {}", frame);
                if let Err(e) = sink.send(frame).await {
                    // The read side reports the close.
                    error!("Failed to send frame: {}", e);
                }
            }
        }
    }
}

/// Body of the reconnect task.
///
/// `first` is the outcome of the connection attempt made by `login`.
pub(crate) async fn run_connection_loop(
    shared: Arc<Shared>,
    first: ChatWatchResult<SocketChannel>,
) {
    let delay = shared.config.reconnect_delay;
    let mut pending = Some(first);

    loop {
        let attempt = match pending.take() {
            Some(attempt) => attempt,
            None => shared.open().await,
        };

        let reason = match attempt {
            Ok(channel) => {
                let outbound_rx = shared.attach();
                match drive_connection(&shared, channel, outbound_rx).await {
                    ConnectionEnd::Closed(reason) => reason,
                    ConnectionEnd::Shutdown => break,
                }
            }
            Err(ChatWatchError::Shutdown) => break,
            Err(ChatWatchError::Socket(e)) => {
                warn!("Could not open WebSocket: {}", e);
                CloseReason::abnormal(e.to_string())
            }
            Err(e @ ChatWatchError::SessionAcquisition { .. }) => {
                // The client stays without a session until the next login.
                error!(
                    code = e.error_code(),
                    "Giving up on session acquisition, not reconnecting: {}", e
                );
                break;
            }
            Err(e) => {
                error!(
                    code = e.error_code(),
                    "Could not acquire a session, retrying in {:?}: {}", delay, e
                );
                shared.set_state(ConnectionState::Disconnected);
                if !shared.pause(delay).await {
                    break;
                }
                continue;
            }
        };

        shared.handle_close(reason);
        info!("Reconnecting in {:?}", delay);
        if !shared.pause(delay).await {
            break;
        }
    }

    shared.set_state(ConnectionState::Disconnected);
    info!("Connection loop ended");
}
