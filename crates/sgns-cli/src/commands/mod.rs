//! CLI command implementations

pub mod bench;
pub mod config;
pub mod demo;

pub use bench::BenchCommand;
pub use config::ConfigAction;
pub use demo::DemoCommand;
