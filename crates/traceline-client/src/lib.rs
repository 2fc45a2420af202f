//! Traceline Client
//!
//! This crate provides the session-facing half of the Traceline SDK:
//! - A caller-owned [`Client`] holding the session registry
//! - [`Session`] handles that record events and manage their JWT
//! - The background event dispatcher (batching and flush)
//! - Configuration
//!
//! # Quickstart
//!
//! ```no_run
//! use traceline_client::{ActionEvent, Client, ClientConfig, EndState};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let client = Client::new(config)?;
//!
//! let session = client.start_session().await?;
//! session.record(ActionEvent::new().with_action_type("checkout"))?;
//! client.end_session(&session, EndState::Success, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod session;

pub use client::Client;
pub use config::{ClientConfig, VersionCheckConfig, DEFAULT_ENDPOINT};
pub use dispatcher::{DispatcherConfig, EventDispatcher, EventSender, EventSink};
pub use error::{ClientError, Result, TransportResult};
pub use session::Session;

// Re-export the event family and the transport knobs callers touch
pub use traceline_core::{
    ActionEvent, ApiKey, EndState, ErrorEvent, Event, EventCounts, EventKind, LlmEvent,
    SessionId, SessionState, ToolEvent,
};
pub use traceline_transport::HttpClientConfig;
