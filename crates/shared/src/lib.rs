//! Shared library for the MyAnimeList client workspace.
//!
//! This crate provides the ambient pieces used by the client crate and by
//! whatever application embeds it:
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod logging;

// Re-export commonly used types
pub use config::{Config, MalConfig};
pub use logging::LogConfig;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
