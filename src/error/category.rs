//! Coarse classification of client errors.
//!
//! Categories drive the retry decisions made by the session acquirer and the
//! reconnect task, and give embedders a stable label for logging.

use std::fmt;

/// High-level categorization of a [`ChatWatchError`](super::ChatWatchError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connectivity problems: DNS, TLS, refused connections, dropped sockets.
    Network,

    /// The credential is missing or was rejected.
    Auth,

    /// The gateway answered, but not with something usable.
    Server,

    /// Frames or bodies that could not be encoded or decoded.
    Protocol,

    /// Invalid settings supplied by the embedding application.
    Configuration,

    /// The client was used in a state that does not allow the operation.
    Client,
}

impl ErrorCategory {
    /// Whether errors in this category are usually transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Short label suitable for structured logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Protocol => "protocol",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Client => "client",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_categories() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Server.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::Protocol.is_retryable());
        assert!(!ErrorCategory::Configuration.is_retryable());
        assert!(!ErrorCategory::Client.is_retryable());
    }

    #[test]
    fn test_display_matches_label() {
        assert_eq!(ErrorCategory::Network.to_string(), "network");
        assert_eq!(ErrorCategory::Configuration.to_string(), "configuration");
    }
}
