//! C API bindings for the SGNS kernels
//!
//! Every kernel entry point takes its buffers as `(pointer, length)` pairs,
//! returns an `SGNS_*` status code, and leaves a message for
//! [`sgns_get_last_error`] on failure. The process-wide kernel is created by
//! [`sgns_init`] or lazily on first use, and released by [`sgns_cleanup`].

pub mod c_api;
pub mod error;
pub mod runtime;

pub use c_api::*;
pub use error::*;
