//! Error types for the restgate core.

/// Core error type for restgate infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for restgate operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
