//! Error types for Traceline Core

use crate::session::SessionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Session lifecycle errors
    #[error("Session {0} has already ended")]
    SessionEnded(SessionId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Event queue full")]
    QueueFull,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
