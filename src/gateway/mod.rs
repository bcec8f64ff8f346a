//! Connection to a ChatWatch gateway node.
//!
//! [`GatewayClient`] owns the whole lifecycle: session acquisition, the node
//! socket, readiness, and reconnecting after every close. Wire envelopes live
//! in [`messages`].

mod client;
mod connection;
pub mod messages;
mod state;

pub use client::GatewayClient;
pub use messages::{
    InboundMessage, IngestPayload, MessageRef, OutboundEnvelope, Snowflake, EVENT_CONNECTION,
    EVENT_MESSAGE_RESPONSE, READY_PAYLOAD,
};
pub use state::ConnectionState;
