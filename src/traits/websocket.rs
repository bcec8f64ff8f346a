//! WebSocket connector seam.
//!
//! A connector opens one socket to a node and hands back its two halves:
//! a sink of outgoing text frames and a stream of [`SocketEvent`]s. The
//! gateway client owns both halves for the lifetime of the connection and
//! drops them on close.

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::Sink;
use reqwest::Url;

/// Close code reported when the stream ends without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Close code reported for a close frame that carried no status.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// Why a socket closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

impl CloseReason {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// A close without a handshake: stream ended, transport error, or the
    /// socket never opened.
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(CLOSE_ABNORMAL, reason)
    }
}

/// Something that happened on an open socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// A UTF-8 frame.
    Text(String),
    /// The peer sent a close frame.
    Closed(CloseReason),
}

/// WebSocket errors.
#[derive(Debug, Clone)]
pub enum WsError {
    /// Connection failed
    ConnectionFailed(String),
    /// Disconnected from server
    Disconnected,
    /// Failed to send message
    SendFailed(String),
    /// The credential cannot be carried in a header
    InvalidCredential(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for WsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WsError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            WsError::Disconnected => write!(f, "Disconnected from server"),
            WsError::SendFailed(msg) => write!(f, "Send failed: {}", msg),
            WsError::InvalidCredential(msg) => write!(f, "Invalid credential: {}", msg),
            WsError::Other(msg) => write!(f, "WebSocket error: {}", msg),
        }
    }
}

impl std::error::Error for WsError {}

/// Outgoing half of a socket.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = WsError> + Send>>;

/// Incoming half of a socket. `None` means the stream ended.
pub type FrameStream = BoxStream<'static, Result<SocketEvent, WsError>>;

/// An open socket, split into halves.
pub struct SocketChannel {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl std::fmt::Debug for SocketChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketChannel").finish_non_exhaustive()
    }
}

/// Trait for opening node connections.
///
/// Implementations must attach `credential` as the `authorization` header of
/// the opening handshake.
#[async_trait]
pub trait SocketConnector: Send + Sync {
    async fn connect(&self, endpoint: &Url, credential: &str) -> Result<SocketChannel, WsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_error_display() {
        assert_eq!(
            WsError::ConnectionFailed("timeout".to_string()).to_string(),
            "Connection failed: timeout"
        );
        assert_eq!(WsError::Disconnected.to_string(), "Disconnected from server");
        assert_eq!(
            WsError::SendFailed("channel closed".to_string()).to_string(),
            "Send failed: channel closed"
        );
        assert_eq!(
            WsError::InvalidCredential("newline".to_string()).to_string(),
            "Invalid credential: newline"
        );
        assert_eq!(
            WsError::Other("unknown".to_string()).to_string(),
            "WebSocket error: unknown"
        );
    }

    #[test]
    fn test_abnormal_close_code() {
        let reason = CloseReason::abnormal("stream ended");
        assert_eq!(reason.code, CLOSE_ABNORMAL);
        assert_eq!(reason.reason, "stream ended");
    }

    #[test]
    fn test_ws_error_implements_error_trait() {
        let err = WsError::Disconnected;
        let _: &dyn std::error::Error = &err;
    }
}
