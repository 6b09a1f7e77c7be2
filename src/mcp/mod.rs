//! MCP Server implementation for sevDesk
//!
//! JSON-RPC protocol types, tool dispatch and the stdio transport

pub mod protocol;
mod server;
pub mod transport;

pub use protocol::*;
pub use server::{SevDeskMcpServer, ToolName, SERVER_NAME};
pub use transport::{serve, TransportError};
