//! Error types for the Traceline client layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Core(#[from] traceline_core::Error),

    #[error(transparent)]
    Transport(#[from] traceline_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Shorthand for results from the transport layer
pub type TransportResult<T> = std::result::Result<T, traceline_transport::TransportError>;
