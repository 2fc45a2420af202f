//! Traceline Core Types
//!
//! This crate provides the fundamental types used throughout Traceline:
//! - The recorded event family (actions, tools, LLM calls, errors)
//! - Session identifiers, state, and the wire-level session snapshot
//! - API key validation
//! - Core error types

pub mod api_key;
pub mod error;
pub mod events;
pub mod session;

pub use api_key::ApiKey;
pub use error::{Error, Result};
pub use events::{ActionEvent, ErrorEvent, Event, EventKind, LlmEvent, ToolEvent};
pub use session::{EndState, EventCounts, HostEnv, SessionDescriptor, SessionId, SessionState};
