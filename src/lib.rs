//! sevDesk MCP Library
//!
//! Model Context Protocol server exposing sevDesk contacts, invoices and
//! offers as tools.

pub mod auth;
pub mod config;
pub mod mcp;
pub mod sevdesk;

pub use auth::ApiToken;
pub use config::{Config, ConfigError, RuntimeConfig};
pub use mcp::SevDeskMcpServer;
pub use sevdesk::{SevDeskClient, SevDeskError};
