//! This crate contains the code required to make a deployment run observable:
//! initialization logic for logging and a panic hook that routes panics
//! through the same log pipeline.
pub mod config;
pub mod tracing;

pub use config::Config;
