use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event tag of the readiness envelope.
pub const EVENT_CONNECTION: &str = "connection";
/// Event tag of moderation verdicts.
pub const EVENT_MESSAGE_RESPONSE: &str = "message_response";
/// Payload of the readiness envelope.
pub const READY_PAYLOAD: &str = "ok";

/// A chat platform identifier.
///
/// Serialized as a JSON number or string, whichever the caller supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Snowflake {
    Id(u64),
    Text(String),
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Snowflake::Id(id)
    }
}

impl From<&str> for Snowflake {
    fn from(id: &str) -> Self {
        Snowflake::Text(id.to_string())
    }
}

impl From<String> for Snowflake {
    fn from(id: String) -> Self {
        Snowflake::Text(id)
    }
}

impl std::fmt::Display for Snowflake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Snowflake::Id(id) => write!(f, "{}", id),
            Snowflake::Text(id) => f.write_str(id),
        }
    }
}

/// Where an ingested message came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub user: Snowflake,
    pub message: Snowflake,
    pub channel: Snowflake,
    pub guild: Snowflake,
}

impl MessageRef {
    pub fn new(
        user: impl Into<Snowflake>,
        message: impl Into<Snowflake>,
        channel: impl Into<Snowflake>,
        guild: impl Into<Snowflake>,
    ) -> Self {
        Self {
            user: user.into(),
            message: message.into(),
            channel: channel.into(),
            guild: guild.into(),
        }
    }
}

/// Data of a `message_ingest` envelope. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestPayload {
    pub guild: Snowflake,
    pub channel: Snowflake,
    pub user: Snowflake,
    pub message_id: Snowflake,
    pub message: String,
}

impl IngestPayload {
    pub fn new(content: impl Into<String>, target: &MessageRef) -> Self {
        Self {
            guild: target.guild.clone(),
            channel: target.channel.clone(),
            user: target.user.clone(),
            message_id: target.message.clone(),
            message: content.into(),
        }
    }
}

/// Envelopes the client sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum OutboundEnvelope {
    #[serde(rename = "message_ingest")]
    MessageIngest(IngestPayload),
}

impl OutboundEnvelope {
    /// Encode as a text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `{event, data}` as received, before classification.
#[derive(Debug, Clone, Deserialize)]
struct RawEnvelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Envelopes the node sends.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Connection status; `"ok"` means ready.
    Connection(Value),
    /// Moderation verdict; shape is owned by the gateway.
    MessageResponse(Value),
    /// Any other tag.
    Unknown { event: String, data: Value },
}

impl InboundMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawEnvelope = serde_json::from_str(text)?;
        Ok(match raw.event.as_str() {
            EVENT_CONNECTION => InboundMessage::Connection(raw.data),
            EVENT_MESSAGE_RESPONSE => InboundMessage::MessageResponse(raw.data),
            _ => InboundMessage::Unknown {
                event: raw.event,
                data: raw.data,
            },
        })
    }

    /// Whether this is the readiness signal.
    pub fn is_ready(&self) -> bool {
        matches!(self, InboundMessage::Connection(Value::String(s)) if s == READY_PAYLOAD)
    }
}
