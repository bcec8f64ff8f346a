//! In-memory test doubles for the network seams.
//!
//! - [`MockHttpClient`] - scripted HTTP responses with request recording
//! - [`MockConnector`] / [`MockSocket`] - in-memory WebSocket connections

pub mod http;
pub mod websocket;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use websocket::{ConnectAttempt, MockConnector, MockSocket};
