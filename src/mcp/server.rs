//! MCP Server implementation for sevDesk
//!
//! Exposes tools for managing contacts, invoices and offers

use crate::mcp::protocol::*;
use crate::sevdesk::{SevDeskClient, SevDeskError};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::str::FromStr;
use std::sync::Arc;

pub const SERVER_NAME: &str = "sevdesk-mcp";

/// Tools this server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    RawRequest,
    ListContacts,
    CreateContact,
    UpdateContact,
    ListInvoices,
    GetInvoicePositions,
    CreateInvoice,
    UpdateInvoice,
    CreateOffer,
    UpdateOffer,
}

impl ToolName {
    pub const ALL: [ToolName; 10] = [
        ToolName::RawRequest,
        ToolName::ListContacts,
        ToolName::CreateContact,
        ToolName::UpdateContact,
        ToolName::ListInvoices,
        ToolName::GetInvoicePositions,
        ToolName::CreateInvoice,
        ToolName::UpdateInvoice,
        ToolName::CreateOffer,
        ToolName::UpdateOffer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::RawRequest => "raw_request",
            ToolName::ListContacts => "list_contacts",
            ToolName::CreateContact => "create_contact",
            ToolName::UpdateContact => "update_contact",
            ToolName::ListInvoices => "list_invoices",
            ToolName::GetInvoicePositions => "get_invoice_positions",
            ToolName::CreateInvoice => "create_invoice",
            ToolName::UpdateInvoice => "update_invoice",
            ToolName::CreateOffer => "create_offer",
            ToolName::UpdateOffer => "update_offer",
        }
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

/// MCP Server for sevDesk
pub struct SevDeskMcpServer {
    client: Arc<SevDeskClient>,
}

impl SevDeskMcpServer {
    /// Create a new MCP server instance
    pub fn new(client: Arc<SevDeskClient>) -> Self {
        Self { client }
    }

    /// Get list of available tools
    pub fn get_tools(&self) -> Vec<Tool> {
        Self::get_tools_static()
    }

    pub fn get_tools_static() -> Vec<Tool> {
        ToolName::ALL.into_iter().map(tool_definition).collect()
    }

    /// Handle one JSON-RPC message. Notifications yield `None`.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!("Notification: {}", request.method);
            return None;
        }
        let id = request.id.clone();

        let response = match request.method.as_str() {
            "initialize" => {
                let result = InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability {
                            list_changed: Some(false),
                        }),
                    },
                    server_info: ServerInfo {
                        name: SERVER_NAME.to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                };
                JsonRpcResponse::from_result(id, &result)
            }

            "tools/list" => {
                let result = ListToolsResult {
                    tools: self.get_tools(),
                };
                JsonRpcResponse::from_result(id, &result)
            }

            "tools/call" => {
                let params = match request
                    .params
                    .map(serde_json::from_value::<CallToolParams>)
                {
                    Some(Ok(params)) => params,
                    Some(Err(e)) => {
                        return Some(JsonRpcResponse::error(
                            id,
                            INVALID_PARAMS,
                            &format!("Invalid params: {}", e),
                        ));
                    }
                    None => {
                        return Some(JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"));
                    }
                };

                let tool = match params.name.parse::<ToolName>() {
                    Ok(tool) => tool,
                    Err(message) => {
                        return Some(JsonRpcResponse::error(id, METHOD_NOT_FOUND, &message));
                    }
                };

                let args = params.arguments.unwrap_or_default();
                let result = self.call_tool(tool, args).await;
                JsonRpcResponse::from_result(id, &result)
            }

            "ping" => JsonRpcResponse::success(id, json!({})),

            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", request.method),
            ),
        };

        Some(response)
    }

    /// Handle a tool call. Failures come back as error-flagged results.
    pub async fn call_tool(&self, tool: ToolName, args: Map<String, Value>) -> CallToolResult {
        match self.execute(tool, args).await {
            Ok(value) => {
                let json = serde_json::to_string_pretty(&value).unwrap_or_default();
                CallToolResult::text(json)
            }
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", tool.as_str(), e);
                CallToolResult::error(e.to_string())
            }
        }
    }

    async fn execute(
        &self,
        tool: ToolName,
        args: Map<String, Value>,
    ) -> Result<Value, SevDeskError> {
        let client = &self.client;
        match tool {
            ToolName::RawRequest => client.raw_request(decode(args)?).await,
            ToolName::ListContacts => client.list_contacts(decode(args)?).await,
            ToolName::CreateContact => client.create_contact(decode(args)?).await,
            ToolName::UpdateContact => client.update_contact(decode(args)?).await,
            ToolName::ListInvoices => client.list_invoices(decode(args)?).await,
            ToolName::GetInvoicePositions => client.get_invoice_positions(decode(args)?).await,
            ToolName::CreateInvoice => client.create_invoice(decode(args)?).await,
            ToolName::UpdateInvoice => client.update_invoice(decode(args)?).await,
            ToolName::CreateOffer => client.create_offer(decode(args)?).await,
            ToolName::UpdateOffer => client.update_offer(decode(args)?).await,
        }
    }
}

fn decode<T: DeserializeOwned>(args: Map<String, Value>) -> Result<T, SevDeskError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| SevDeskError::InvalidArguments(e.to_string()))
}

fn tool_definition(tool: ToolName) -> Tool {
    use crate::mcp::protocol::ParamType as P;

    let (description, input_schema) = match tool {
        ToolName::RawRequest => (
            "Send a request to any sevDesk API path (relative to the API base URL). Use for endpoints without a dedicated tool.",
            create_tool_schema(
                vec![
                    ("method", P::String, "HTTP method: GET, POST, PUT or DELETE", true),
                    ("url", P::String, "API path, e.g. '/Contact/123' or '/Tools/bookkeepingSystemVersion'", true),
                    ("data", P::Object, "JSON request body", false),
                    ("params", P::Object, "Query parameters", false),
                ],
                false,
            ),
        ),
        ToolName::ListContacts => (
            "List contacts (customers, suppliers, persons and organisations). Always includes the total count.",
            create_tool_schema(
                vec![
                    ("limit", P::Integer, "Maximum contacts to return (default: 50)", false),
                    ("offset", P::Integer, "Number of contacts to skip (default: 0)", false),
                    ("customerNumber", P::String, "Only return the contact with this customer number", false),
                    ("depth", P::Integer, "Set to 1 to embed category and parent contact", false),
                ],
                false,
            ),
        ),
        ToolName::CreateContact => (
            "Create a contact. Give 'name' for an organisation, or 'surename'/'familyname' for a person.",
            create_tool_schema(
                vec![
                    ("name", P::String, "Organisation name", false),
                    ("status", P::String, "Contact status (default: '1000' = active)", false),
                    ("customerNumber", P::String, "Customer number", false),
                    ("surename", P::String, "First name of a person", false),
                    ("familyname", P::String, "Last name of a person", false),
                    ("categoryId", P::Id, "Contact category: 3 = customer, 2 = supplier", true),
                ],
                false,
            ),
        ),
        ToolName::UpdateContact => (
            "Update a contact. Every field other than 'contactId' is sent to sevDesk unchanged.",
            create_tool_schema(vec![("contactId", P::Id, "Contact id", true)], true),
        ),
        ToolName::ListInvoices => (
            "List invoices, optionally filtered by status or contact. Always includes the total count.",
            create_tool_schema(
                vec![
                    ("limit", P::Integer, "Maximum invoices to return (default: 50)", false),
                    ("offset", P::Integer, "Number of invoices to skip (default: 0)", false),
                    ("status", P::String, "Invoice status: 100 = draft, 200 = open, 1000 = paid", false),
                    ("contactId", P::Id, "Only invoices of this contact", false),
                ],
                false,
            ),
        ),
        ToolName::GetInvoicePositions => (
            "List the positions (line items) of an invoice",
            create_tool_schema(
                vec![
                    ("invoiceId", P::Id, "Invoice id", true),
                    ("limit", P::Integer, "Maximum positions to return (default: 50)", false),
                    ("offset", P::Integer, "Number of positions to skip (default: 0)", false),
                ],
                false,
            ),
        ),
        ToolName::CreateInvoice => (
            "Create a standard invoice (type RE) for a contact, then create its positions in order.",
            create_tool_schema(
                vec![
                    ("contactId", P::Id, "Contact id of the recipient", true),
                    ("invoiceDate", P::String, "Invoice date (default: now)", false),
                    ("header", P::String, "Invoice header (default: 'Invoice')", false),
                    ("status", P::String, "Invoice status (default: '100' = draft)", false),
                    ("deliveryDate", P::String, "Delivery date", false),
                    ("taxType", P::String, "Tax type (default: 'default')", false),
                    ("currency", P::String, "Currency (default: 'EUR')", false),
                    ("positions", P::Positions, "Line items to add to the invoice", false),
                ],
                false,
            ),
        ),
        ToolName::UpdateInvoice => (
            "Update an invoice. Every field other than 'invoiceId' is sent to sevDesk unchanged.",
            create_tool_schema(vec![("invoiceId", P::Id, "Invoice id", true)], true),
        ),
        ToolName::CreateOffer => (
            "Create an offer (order type AN) for a contact, then create its positions in order.",
            create_tool_schema(
                vec![
                    ("contactId", P::Id, "Contact id of the recipient", true),
                    ("orderDate", P::String, "Offer date (default: now)", false),
                    ("header", P::String, "Offer header (default: 'Offer')", false),
                    ("status", P::String, "Offer status (default: '100' = draft)", false),
                    ("positions", P::Positions, "Line items to add to the offer", false),
                ],
                false,
            ),
        ),
        ToolName::UpdateOffer => (
            "Update an offer. Every field other than 'orderId' is sent to sevDesk unchanged.",
            create_tool_schema(vec![("orderId", P::Id, "Order id of the offer", true)], true),
        ),
    };

    Tool {
        name: tool.as_str().to_string(),
        description: description.to_string(),
        input_schema,
    }
}
