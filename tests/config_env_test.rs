//! `ClientConfig::from_env` against the real process environment.

use std::time::Duration;

use chatwatch::{ChatWatchError, ClientConfig, NodeAddressing};
use serial_test::serial;

const VARS: &[&str] = &[
    "CHATWATCH_ACQUIRE_URL",
    "CHATWATCH_NODE_DOMAIN",
    "CHATWATCH_RAW_SESSION_URL",
    "CHATWATCH_PROFILE_SCHEME",
    "CHATWATCH_VERBOSE",
    "CHATWATCH_RECONNECT_SECS",
    "CHATWATCH_READY_TIMEOUT_SECS",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_without_variables_uses_defaults() {
    clear_env();

    let config = ClientConfig::from_env().unwrap();
    let defaults = ClientConfig::default();

    assert_eq!(config.acquire_url, defaults.acquire_url);
    assert_eq!(config.addressing, defaults.addressing);
    assert_eq!(config.ready_timeout, Some(Duration::from_secs(30)));
}

#[test]
#[serial]
fn test_from_env_overlays_variables() {
    clear_env();
    std::env::set_var("CHATWATCH_ACQUIRE_URL", "http://localhost:8080/acquire");
    std::env::set_var("CHATWATCH_RAW_SESSION_URL", "true");
    std::env::set_var("CHATWATCH_PROFILE_SCHEME", "http");
    std::env::set_var("CHATWATCH_VERBOSE", "1");
    std::env::set_var("CHATWATCH_RECONNECT_SECS", "2");
    std::env::set_var("CHATWATCH_READY_TIMEOUT_SECS", "0");

    let config = ClientConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.acquire_url, "http://localhost:8080/acquire");
    assert_eq!(config.addressing, NodeAddressing::RawUrl);
    assert_eq!(config.profile_scheme, "http");
    assert!(config.verbose);
    assert_eq!(config.reconnect_delay, Duration::from_secs(2));
    assert_eq!(config.ready_timeout, None);
}

#[test]
#[serial]
fn test_from_env_rejects_bad_numbers() {
    clear_env();
    std::env::set_var("CHATWATCH_RECONNECT_SECS", "soon");

    let result = ClientConfig::from_env();
    clear_env();

    match result {
        Err(err @ ChatWatchError::Config(_)) => {
            assert!(err.to_string().contains("CHATWATCH_RECONNECT_SECS"));
        }
        other => panic!("expected config error, got {:?}", other),
    }
}
