//! Configuration module
//!
//! Optional TOML file plus environment variables, resolved into a
//! [`RuntimeConfig`] at startup.

pub mod config;

pub use config::{Config, ConfigError, RuntimeConfig, SevDeskSection};
