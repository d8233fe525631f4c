//! Error reporting across the C boundary

use sgns_common::{KernelError, SgnsError};
use std::cell::RefCell;
use std::os::raw::c_int;
use thiserror::Error;

pub const SGNS_SUCCESS: c_int = 0;
pub const SGNS_ERROR_INVALID_ARGUMENT: c_int = -1;
pub const SGNS_ERROR_INDEX_OUT_OF_BOUNDS: c_int = -2;
pub const SGNS_ERROR_THREAD_POOL: c_int = -3;
pub const SGNS_ERROR_CONFIG: c_int = -4;
pub const SGNS_ERROR_INTERNAL: c_int = -5;

/// Error classes visible to C callers, one per status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SgnsCError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SgnsCError {
    pub fn code(&self) -> c_int {
        match self {
            Self::InvalidArgument(_) => SGNS_ERROR_INVALID_ARGUMENT,
            Self::IndexOutOfBounds(_) => SGNS_ERROR_INDEX_OUT_OF_BOUNDS,
            Self::ThreadPool(_) => SGNS_ERROR_THREAD_POOL,
            Self::Config(_) => SGNS_ERROR_CONFIG,
            Self::Internal(_) => SGNS_ERROR_INTERNAL,
        }
    }
}

impl From<SgnsError> for SgnsCError {
    fn from(err: SgnsError) -> Self {
        match err {
            SgnsError::Kernel(KernelError::InvalidArguments { reason }) => Self::InvalidArgument(reason),
            SgnsError::Kernel(e @ KernelError::IndexOutOfBounds { .. }) => Self::IndexOutOfBounds(e.to_string()),
            SgnsError::Kernel(KernelError::ThreadPool { reason }) => Self::ThreadPool(reason),
            SgnsError::Config(msg) => Self::Config(msg),
            SgnsError::Validation(msg) => Self::InvalidArgument(msg),
            SgnsError::Io(e) => Self::Config(e.to_string()),
        }
    }
}

impl From<sgns_common::ConfigError> for SgnsCError {
    fn from(err: sgns_common::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<SgnsCError>> = const { RefCell::new(None) };
}

/// Record `err` as the calling thread's last error.
pub fn set_last_error(err: SgnsCError) {
    log::debug!("sgns-ffi: {err}");
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(err));
}

pub fn get_last_error() -> Option<SgnsCError> {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

pub fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}
