//! Error types for the AODVv2 core

use thiserror::Error;

/// Errors raised while building core values
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
