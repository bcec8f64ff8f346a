//! Tungstenite-based WebSocket connector.

use async_trait::async_trait;
use futures::future;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as TungsteniteError, Message};
use tracing::debug;

use crate::traits::{
    CloseReason, SocketChannel, SocketConnector, SocketEvent, WsError, CLOSE_NO_STATUS,
};

/// [`SocketConnector`] using `tokio-tungstenite`, with TLS for `wss://` nodes.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self
    }
}

/// Map a raw tungstenite message onto the events the gateway cares about.
///
/// Pings and pongs are answered by tungstenite itself and are dropped here.
fn translate(message: Message) -> Option<SocketEvent> {
    match message {
        Message::Text(text) => Some(SocketEvent::Text(text)),
        Message::Binary(bytes) => String::from_utf8(bytes).ok().map(SocketEvent::Text),
        Message::Close(frame) => Some(SocketEvent::Closed(match frame {
            Some(frame) => CloseReason::new(u16::from(frame.code), frame.reason.into_owned()),
            None => CloseReason::new(CLOSE_NO_STATUS, String::new()),
        })),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}

/// Errors on an established socket. A closed connection is reported as
/// [`WsError::Disconnected`] so callers can tell it from protocol faults.
fn convert_error(err: TungsteniteError) -> WsError {
    match err {
        TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed => {
            WsError::Disconnected
        }
        other => WsError::Other(other.to_string()),
    }
}

#[async_trait]
impl SocketConnector for TungsteniteConnector {
    async fn connect(&self, endpoint: &Url, credential: &str) -> Result<SocketChannel, WsError> {
        let mut request = endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
        let value = HeaderValue::from_str(credential)
            .map_err(|e| WsError::InvalidCredential(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);

        let (ws_stream, response) = connect_async(request)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
        debug!("WebSocket handshake completed with status {}", response.status());

        let (ws_sink, ws_stream) = ws_stream.split();

        let sink = ws_sink
            .sink_map_err(|e| match convert_error(e) {
                WsError::Other(msg) => WsError::SendFailed(msg),
                other => other,
            })
            .with(|text: String| future::ready(Ok::<_, WsError>(Message::Text(text))));

        let stream = ws_stream
            .filter_map(|message| {
                future::ready(match message {
                    Ok(message) => translate(message).map(Ok),
                    Err(e) => Some(Err(convert_error(e))),
                })
            })
            .boxed();

        Ok(SocketChannel {
            sink: Box::pin(sink),
            stream,
        })
    }
}
