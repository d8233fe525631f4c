//! Common types for the SGNS embedding kernels
//!
//! This crate provides the error taxonomy and the runtime configuration
//! shared by the kernel, FFI and CLI crates.

pub mod config;
pub mod error;

pub use config::*;
pub use error::*;
