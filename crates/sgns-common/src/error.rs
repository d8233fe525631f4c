//! Error types for the SGNS workspace

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, SgnsError>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum SgnsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by kernel entry points before any matrix is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("Invalid kernel arguments: {reason}")]
    InvalidArguments { reason: String },

    #[error("{buffer} id {index} out of bounds for vocab_size {vocab_size}")]
    IndexOutOfBounds { buffer: &'static str, index: u32, vocab_size: usize },

    #[error("Thread pool error: {reason}")]
    ThreadPool { reason: String },
}

impl SgnsError {
    /// Shorthand for `SgnsError::Kernel(KernelError::InvalidArguments { .. })`.
    pub fn invalid_args(reason: impl Into<String>) -> Self {
        Self::Kernel(KernelError::InvalidArguments { reason: reason.into() })
    }
}

impl From<crate::config::ConfigError> for SgnsError {
    fn from(err: crate::config::ConfigError) -> Self {
        match err {
            crate::config::ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other.to_string()),
        }
    }
}
