//! sevDesk module
//!
//! HTTP client, request shapes and resource operations for the sevDesk API

pub mod client;
pub mod model;
mod resources;

pub use client::{SevDeskClient, SevDeskError};
pub use model::{HttpMethod, ParentKind, PositionInput, Reference, Scalar};
pub use resources::{
    extract_created_id, invoice_positions_query, list_contacts_query, list_invoices_query,
};
