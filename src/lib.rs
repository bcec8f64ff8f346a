//! ChatWatch - client for the ChatWatch chat moderation gateway
//!
//! The library acquires a gateway session over HTTP, keeps a WebSocket open
//! to the assigned node, submits chat messages for moderation and relays the
//! verdicts back as events.
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatwatch::{ClientConfig, GatewayClient, GatewayEvent, MessageRef};
//!
//! # async fn run() -> chatwatch::ChatWatchResult<()> {
//! let client = GatewayClient::new(ClientConfig::default());
//! client.on_event(Arc::new(|event: &GatewayEvent| println!("{:?}", event)));
//!
//! client.login(Some("my-token")).await?;
//! client.ingest("hello", &MessageRef::new(1u64, 4u64, 2u64, 3u64))?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod session;
pub mod traits;

pub use config::{ClientConfig, NodeAddressing};
pub use error::{ChatWatchError, ChatWatchResult, ErrorCategory};
pub use events::{EventHandler, GatewayEvent};
pub use gateway::{ConnectionState, GatewayClient, MessageRef, Snowflake};
pub use session::Session;
pub use traits::CloseReason;
