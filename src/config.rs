//! Client configuration.

use std::time::Duration;

use crate::error::{ChatWatchError, ChatWatchResult};

/// Default HTTP endpoint that hands out sessions.
pub const DEFAULT_ACQUIRE_URL: &str = "https://gateway.chatwatch.ksoft.si/acquire";

/// Default domain under which gateway nodes live.
pub const DEFAULT_NODE_DOMAIN: &str = "cw.ksoft.si";

/// How the URL returned by the acquire endpoint is turned into a socket
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAddressing {
    /// Rebuild `wss://<node>.<domain>/ws?session=<id>` from the node label and
    /// `session` parameter of the returned URL.
    NodeDomain(String),
    /// Connect to the returned URL as-is.
    RawUrl,
}

impl Default for NodeAddressing {
    fn default() -> Self {
        NodeAddressing::NodeDomain(DEFAULT_NODE_DOMAIN.to_string())
    }
}

/// Configuration for [`GatewayClient`](crate::gateway::GatewayClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub acquire_url: String,
    pub addressing: NodeAddressing,
    /// Scheme used for profile lookups against the session's node.
    pub profile_scheme: String,
    /// Pause between a close and the next connection attempt.
    pub reconnect_delay: Duration,
    /// Pause after each failed acquire call.
    pub acquire_retry_delay: Duration,
    /// Non-200 acquire responses tolerated before giving up.
    pub max_status_failures: u32,
    /// How long `login` waits for the readiness envelope. `None` waits forever.
    pub ready_timeout: Option<Duration>,
    /// Include response bodies in acquisition errors.
    pub verbose: bool,
    /// Capacity of the broadcast channel behind `GatewayClient::subscribe`.
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            acquire_url: DEFAULT_ACQUIRE_URL.to_string(),
            addressing: NodeAddressing::default(),
            profile_scheme: "https".to_string(),
            reconnect_delay: Duration::from_secs(5),
            acquire_retry_delay: Duration::from_secs(5),
            max_status_failures: 3,
            ready_timeout: Some(Duration::from_secs(30)),
            verbose: false,
            event_capacity: 100,
        }
    }
}

impl ClientConfig {
    pub fn with_acquire_url(mut self, url: impl Into<String>) -> Self {
        self.acquire_url = url.into();
        self
    }

    pub fn with_addressing(mut self, addressing: NodeAddressing) -> Self {
        self.addressing = addressing;
        self
    }

    pub fn with_profile_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.profile_scheme = scheme.into();
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_acquire_retry_delay(mut self, delay: Duration) -> Self {
        self.acquire_retry_delay = delay;
        self
    }

    pub fn with_max_status_failures(mut self, max: u32) -> Self {
        self.max_status_failures = max;
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Defaults overlaid with `CHATWATCH_*` environment variables.
    ///
    /// | Variable | Effect |
    /// |----------|--------|
    /// | `CHATWATCH_ACQUIRE_URL` | acquire endpoint |
    /// | `CHATWATCH_NODE_DOMAIN` | node domain for [`NodeAddressing::NodeDomain`] |
    /// | `CHATWATCH_RAW_SESSION_URL` | `true`/`1` selects [`NodeAddressing::RawUrl`] |
    /// | `CHATWATCH_PROFILE_SCHEME` | profile lookup scheme |
    /// | `CHATWATCH_VERBOSE` | `true`/`1` includes bodies in errors |
    /// | `CHATWATCH_RECONNECT_SECS` | reconnect delay in seconds |
    /// | `CHATWATCH_READY_TIMEOUT_SECS` | readiness timeout, `0` disables |
    pub fn from_env() -> ChatWatchResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> ChatWatchResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CHATWATCH_ACQUIRE_URL") {
            config.acquire_url = url;
        }
        if let Some(domain) = lookup("CHATWATCH_NODE_DOMAIN") {
            config.addressing = NodeAddressing::NodeDomain(domain);
        }
        if let Some(raw) = lookup("CHATWATCH_RAW_SESSION_URL") {
            if parse_flag("CHATWATCH_RAW_SESSION_URL", &raw)? {
                config.addressing = NodeAddressing::RawUrl;
            }
        }
        if let Some(scheme) = lookup("CHATWATCH_PROFILE_SCHEME") {
            config.profile_scheme = scheme;
        }
        if let Some(verbose) = lookup("CHATWATCH_VERBOSE") {
            config.verbose = parse_flag("CHATWATCH_VERBOSE", &verbose)?;
        }
        if let Some(secs) = lookup("CHATWATCH_RECONNECT_SECS") {
            config.reconnect_delay =
                Duration::from_secs(parse_secs("CHATWATCH_RECONNECT_SECS", &secs)?);
        }
        if let Some(secs) = lookup("CHATWATCH_READY_TIMEOUT_SECS") {
            config.ready_timeout = match parse_secs("CHATWATCH_READY_TIMEOUT_SECS", &secs)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            };
        }

        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> ChatWatchResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ChatWatchError::Config(format!(
            "{} must be a boolean, got {:?}",
            key, other
        ))),
    }
}

fn parse_secs(key: &str, value: &str) -> ChatWatchResult<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        ChatWatchError::Config(format!("{} must be a whole number of seconds, got {:?}", key, value))
    })
}
