//! Client error types.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Provider error.
    #[error("provider error: {0}")]
    Provider(#[from] calsync_providers::ProviderError),

    /// Engine construction error.
    #[error("engine error: {0}")]
    Engine(#[from] calsync_engine::EngineError),

    /// Ledger store error.
    #[error("ledger error: {0}")]
    Store(#[from] calsync_engine::StoreError),

    /// Event input could not be read or parsed.
    #[error("invalid event input: {0}")]
    Input(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization error.
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}
