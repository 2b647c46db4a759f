//! Shared library for the anime-explorer workspace.
//!
//! This crate provides common functionality used by the client crate:
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod logging;

// Re-export commonly used types
pub use config::{Config, ConfigSource};
pub use logging::LogConfig;
