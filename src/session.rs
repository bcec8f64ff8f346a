//! Gateway sessions and how they are acquired.
//!
//! A session names the node to connect to and the session id on that node.
//! It is obtained from the HTTP acquire endpoint and is only valid until the
//! socket opened with it closes.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::{ClientConfig, NodeAddressing};
use crate::error::{ChatWatchError, ChatWatchResult};
use crate::traits::{authorization_headers, HttpClient};

/// A resolved gateway session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    node: String,
    session_id: String,
    endpoint: Url,
}

impl Session {
    /// Build a session from the URL returned by the acquire endpoint.
    pub fn from_acquired_url(raw: &str, addressing: &NodeAddressing) -> ChatWatchResult<Self> {
        let url = Url::parse(raw)
            .map_err(|e| ChatWatchError::InvalidSessionUrl(format!("{}: {}", raw, e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| ChatWatchError::InvalidSessionUrl(format!("{}: no host", raw)))?;
        let node = host.split('.').next().unwrap_or(host).to_string();
        let session_id = url
            .query_pairs()
            .find(|(key, _)| key == "session")
            .map(|(_, value)| value.into_owned());

        match addressing {
            NodeAddressing::NodeDomain(domain) => {
                let session_id = session_id.filter(|id| !id.is_empty()).ok_or_else(|| {
                    ChatWatchError::InvalidSessionUrl(format!("{}: missing session parameter", raw))
                })?;
                let mut endpoint = Url::parse(&format!("wss://{}.{}/ws", node, domain))
                    .map_err(|e| ChatWatchError::InvalidSessionUrl(format!("{}: {}", raw, e)))?;
                endpoint
                    .query_pairs_mut()
                    .append_pair("session", &session_id);
                Ok(Self {
                    node,
                    session_id,
                    endpoint,
                })
            }
            NodeAddressing::RawUrl => Ok(Self {
                node,
                session_id: session_id.unwrap_or_default(),
                endpoint: url,
            }),
        }
    }

    /// Node label, e.g. `eu-1` for `eu-1.cw.ksoft.si`.
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Session id; empty for raw URLs that carry none.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// WebSocket URL to open for this session.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `<scheme>://<node host>/api/profile?user=<user_id>`.
    pub fn profile_url(&self, scheme: &str, user_id: &str) -> ChatWatchResult<Url> {
        let mut url = self.endpoint.clone();
        url.set_scheme(scheme).map_err(|_| {
            ChatWatchError::Config(format!("cannot use {:?} for profile lookups", scheme))
        })?;
        url.set_path("/api/profile");
        url.set_query(None);
        url.set_fragment(None);
        url.query_pairs_mut().append_pair("user", user_id);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct AcquireResponse {
    url: String,
}

/// Runs the acquire call with the gateway's retry rules.
///
/// - A non-200 status counts towards `max_status_failures`; once the cap is
///   reached the last status is returned as
///   [`ChatWatchError::SessionAcquisition`].
/// - Transport failures and unusable bodies do not count and are retried
///   indefinitely.
/// - Every failure is followed by `acquire_retry_delay`.
/// - A cap of zero is a [`ChatWatchError::Config`] error; no request is made.
///
/// Dropping the future cancels the loop.
#[derive(Clone)]
pub struct SessionAcquirer {
    http: Arc<dyn HttpClient>,
    acquire_url: String,
    addressing: NodeAddressing,
    retry_delay: Duration,
    max_status_failures: u32,
    verbose: bool,
}

impl SessionAcquirer {
    pub fn new(http: Arc<dyn HttpClient>, config: &ClientConfig) -> Self {
        Self {
            http,
            acquire_url: config.acquire_url.clone(),
            addressing: config.addressing.clone(),
            retry_delay: config.acquire_retry_delay,
            max_status_failures: config.max_status_failures,
            verbose: config.verbose,
        }
    }

    pub async fn acquire(&self, credential: &str) -> ChatWatchResult<Session> {
        if credential.is_empty() {
            return Err(ChatWatchError::MissingCredential);
        }

        if self.max_status_failures == 0 {
            return Err(ChatWatchError::Config(
                "max_status_failures must be at least 1".to_string(),
            ));
        }

        let headers = authorization_headers(credential);
        let mut status_failures = 0u32;

        loop {
            let err = match self.http.get(&self.acquire_url, &headers).await {
                Ok(response) if response.status == 200 => {
                    match response
                        .json::<AcquireResponse>()
                        .map_err(ChatWatchError::from)
                        .and_then(|body| Session::from_acquired_url(&body.url, &self.addressing))
                    {
                        Ok(session) => {
                            info!(
                                node = %session.node(),
                                "Acquired ChatWatch session"
                            );
                            return Ok(session);
                        }
                        Err(e) => {
                            warn!("Acquire returned an unusable body: {}", e);
                            e
                        }
                    }
                }
                Ok(response) => {
                    status_failures += 1;
                    let err = ChatWatchError::SessionAcquisition {
                        status: response.status,
                        body: self.verbose.then(|| response.text()),
                    };
                    warn!(
                        attempt = status_failures,
                        max = self.max_status_failures,
                        "{}",
                        err
                    );
                    err
                }
                Err(e) => {
                    error!("Session acquire request failed: {}", e);
                    ChatWatchError::Transport(e)
                }
            };

            // Only a status failure can reach the cap, so `err` is that status.
            let exhausted = status_failures >= self.max_status_failures;
            if !exhausted {
                debug!("Retrying session acquisition in {:?}", self.retry_delay);
            }
            tokio::time::sleep(self.retry_delay).await;
            if exhausted {
                return Err(err);
            }
        }
    }
}

impl std::fmt::Debug for SessionAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAcquirer")
            .field("acquire_url", &self.acquire_url)
            .field("addressing", &self.addressing)
            .field("max_status_failures", &self.max_status_failures)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_domain() -> NodeAddressing {
        NodeAddressing::NodeDomain("cw.ksoft.si".to_string())
    }

    #[test]
    fn test_node_domain_rebuilds_endpoint() {
        let session = Session::from_acquired_url(
            "https://eu-1.chatwatch.ksoft.si/whatever?session=abc123&x=1",
            &node_domain(),
        )
        .unwrap();

        assert_eq!(session.node(), "eu-1");
        assert_eq!(session.session_id(), "abc123");
        assert_eq!(
            session.endpoint().as_str(),
            "wss://eu-1.cw.ksoft.si/ws?session=abc123"
        );
    }

    #[test]
    fn test_node_domain_requires_session() {
        let err = Session::from_acquired_url("wss://eu-1.cw.ksoft.si/ws", &node_domain())
            .unwrap_err();
        assert!(matches!(err, ChatWatchError::InvalidSessionUrl(_)));
    }

    #[test]
    fn test_raw_url_is_kept_verbatim() {
        let session = Session::from_acquired_url(
            "ws://127.0.0.1:9001/ws?session=s1",
            &NodeAddressing::RawUrl,
        )
        .unwrap();

        assert_eq!(session.node(), "127");
        assert_eq!(session.session_id(), "s1");
        assert_eq!(
            session.endpoint().as_str(),
            "ws://127.0.0.1:9001/ws?session=s1"
        );

        let session =
            Session::from_acquired_url("wss://n2.cw.ksoft.si/ws", &NodeAddressing::RawUrl).unwrap();
        assert_eq!(session.session_id(), "");
    }

    #[test]
    fn test_garbage_url_is_rejected() {
        let err = Session::from_acquired_url("not a url", &node_domain()).unwrap_err();
        assert!(matches!(err, ChatWatchError::InvalidSessionUrl(_)));
    }

    #[test]
    fn test_profile_url_reuses_node_host() {
        let session = Session::from_acquired_url(
            "wss://eu-1.cw.ksoft.si/ws?session=abc",
            &node_domain(),
        )
        .unwrap();

        let url = session.profile_url("https", "123456789").unwrap();
        assert_eq!(
            url.as_str(),
            "https://eu-1.cw.ksoft.si/api/profile?user=123456789"
        );
    }

    #[test]
    fn test_profile_url_keeps_port_for_raw_urls() {
        let session = Session::from_acquired_url(
            "ws://127.0.0.1:9001/ws?session=s1",
            &NodeAddressing::RawUrl,
        )
        .unwrap();

        let url = session.profile_url("http", "42").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9001/api/profile?user=42");
    }
}
