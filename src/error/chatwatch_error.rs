//! The crate-wide error type.

use std::time::Duration;

use thiserror::Error;

use super::category::ErrorCategory;
use crate::traits::{HttpError, WsError};

/// Errors returned by the ChatWatch client.
///
/// Socket closes are not errors: they surface as
/// [`GatewayEvent::Close`](crate::events::GatewayEvent::Close) and are
/// followed by an automatic reconnect.
#[derive(Debug, Error)]
pub enum ChatWatchError {
    /// No credential was known when a session had to be acquired.
    #[error("No ChatWatch token provided")]
    MissingCredential,

    /// The acquire endpoint answered with something other than 200.
    #[error(
        "Failed acquiring a session (HTTP {status}){}",
        .body.as_deref().map(|b| format!(": {}", b)).unwrap_or_default()
    )]
    SessionAcquisition { status: u16, body: Option<String> },

    /// The HTTP call itself failed.
    #[error("Transport error: {0}")]
    Transport(#[from] HttpError),

    /// Opening or writing to the WebSocket failed.
    #[error("WebSocket error: {0}")]
    Socket(#[from] WsError),

    /// The acquire response did not carry a usable node URL.
    #[error("Invalid session URL: {0}")]
    InvalidSessionUrl(String),

    /// No open connection (for `ingest`) or no session (for `profile`).
    #[error("Not connected to a ChatWatch node")]
    NotConnected,

    /// The node did not report readiness in time.
    #[error("Timed out after {0:?} waiting for the node to report ready")]
    ReadyTimeout(Duration),

    /// The client was shut down.
    #[error("Client has been shut down")]
    Shutdown,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChatWatchError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatWatchError::MissingCredential => ErrorCategory::Auth,
            ChatWatchError::SessionAcquisition { status, .. } => match status {
                401 | 403 => ErrorCategory::Auth,
                _ => ErrorCategory::Server,
            },
            ChatWatchError::Transport(_) | ChatWatchError::Socket(_) => ErrorCategory::Network,
            ChatWatchError::InvalidSessionUrl(_) => ErrorCategory::Server,
            ChatWatchError::ReadyTimeout(_) => ErrorCategory::Network,
            ChatWatchError::Json(_) => ErrorCategory::Protocol,
            ChatWatchError::Config(_) => ErrorCategory::Configuration,
            ChatWatchError::NotConnected | ChatWatchError::Shutdown => ErrorCategory::Client,
        }
    }

    /// Whether retrying the same operation later can succeed.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Stable short code for logs and metrics labels.
    pub fn error_code(&self) -> &'static str {
        match self {
            ChatWatchError::MissingCredential => "CW_MISSING_CREDENTIAL",
            ChatWatchError::SessionAcquisition { .. } => "CW_SESSION_ACQUISITION",
            ChatWatchError::Transport(_) => "CW_TRANSPORT",
            ChatWatchError::Socket(_) => "CW_SOCKET",
            ChatWatchError::InvalidSessionUrl(_) => "CW_INVALID_SESSION_URL",
            ChatWatchError::NotConnected => "CW_NOT_CONNECTED",
            ChatWatchError::ReadyTimeout(_) => "CW_READY_TIMEOUT",
            ChatWatchError::Shutdown => "CW_SHUTDOWN",
            ChatWatchError::Json(_) => "CW_JSON",
            ChatWatchError::Config(_) => "CW_CONFIG",
        }
    }
}
