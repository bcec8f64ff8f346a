//! Trait seams for the network layers.
//!
//! - [`HttpClient`] - authorized GET requests (session acquisition, profiles)
//! - [`SocketConnector`] - opening a WebSocket to a gateway node

pub mod http;
pub mod websocket;

pub use http::{authorization_headers, Headers, HttpClient, HttpError, Response};
pub use websocket::{
    CloseReason, FrameSink, FrameStream, SocketChannel, SocketConnector, SocketEvent, WsError,
    CLOSE_ABNORMAL, CLOSE_NO_STATUS,
};
