//! Contact, invoice and offer operations
//!
//! Each operation maps its argument struct to one HTTP call, except
//! `create_invoice`/`create_offer`, which create the document first and
//! then its positions one by one.

use crate::sevdesk::client::{SevDeskClient, SevDeskError};
use crate::sevdesk::model::*;
use chrono::Utc;
use serde_json::{json, Map, Value};

impl SevDeskClient {
    /// Pass-through request against an arbitrary path under the base URL
    pub async fn raw_request(&self, args: RawRequestArgs) -> Result<Value, SevDeskError> {
        let path = checked_relative_path(&args.url)?;
        let query = args.params.as_ref().map(params_to_query).unwrap_or_default();
        self.send(args.method, path, &query, args.data.as_ref()).await
    }

    pub async fn list_contacts(&self, args: ListContactsArgs) -> Result<Value, SevDeskError> {
        self.get("/Contact", &list_contacts_query(&args)).await
    }

    pub async fn create_contact(&self, args: CreateContactArgs) -> Result<Value, SevDeskError> {
        let payload = ContactPayload::from(args);
        self.post("/Contact", &payload).await
    }

    pub async fn update_contact(&self, args: UpdateContactArgs) -> Result<Value, SevDeskError> {
        let path = resource_path("/Contact", &args.contact_id)?;
        self.put(&path, &args.fields).await
    }

    pub async fn list_invoices(&self, args: ListInvoicesArgs) -> Result<Value, SevDeskError> {
        self.get("/Invoice", &list_invoices_query(&args)).await
    }

    pub async fn get_invoice_positions(
        &self,
        args: GetInvoicePositionsArgs,
    ) -> Result<Value, SevDeskError> {
        self.get("/InvoicePos", &invoice_positions_query(&args))
            .await
    }

    /// Create an invoice, then its positions if any were given
    pub async fn create_invoice(&self, args: CreateInvoiceArgs) -> Result<Value, SevDeskError> {
        let payload = InvoicePayload::new(&args, Utc::now());
        let document = self.post("/Invoice", &payload).await?;
        self.attach_positions(document, ParentKind::Invoice, args.positions.as_deref())
            .await
    }

    pub async fn update_invoice(&self, args: UpdateInvoiceArgs) -> Result<Value, SevDeskError> {
        let path = resource_path("/Invoice", &args.invoice_id)?;
        self.put(&path, &args.fields).await
    }

    /// Create an offer (order of type `AN`), then its positions if any were given
    pub async fn create_offer(&self, args: CreateOfferArgs) -> Result<Value, SevDeskError> {
        let payload = OrderPayload::new(&args, Utc::now());
        let document = self.post("/Order", &payload).await?;
        self.attach_positions(document, ParentKind::Order, args.positions.as_deref())
            .await
    }

    pub async fn update_offer(&self, args: UpdateOfferArgs) -> Result<Value, SevDeskError> {
        let path = resource_path("/Order", &args.order_id)?;
        self.put(&path, &args.fields).await
    }

    /// Create positions under `parent_id`, strictly in input order
    ///
    /// The first failure aborts the remaining creations. Nothing already
    /// created (document or positions) is rolled back.
    pub async fn create_positions(
        &self,
        parent_id: &Scalar,
        kind: ParentKind,
        positions: &[PositionInput],
    ) -> Result<Vec<Value>, SevDeskError> {
        let path = kind.position_path();
        let mut created = Vec::with_capacity(positions.len());

        for (index, position) in positions.iter().enumerate() {
            let payload = PositionPayload::new(parent_id, kind, position);
            let response = self.post(&path, &payload).await.map_err(|e| {
                tracing::warn!(
                    "Position {}/{} for {} {} failed, skipping the rest",
                    index + 1,
                    positions.len(),
                    kind.object_name(),
                    parent_id
                );
                e
            })?;
            created.push(response);
        }

        tracing::debug!(
            "Created {} positions for {} {}",
            created.len(),
            kind.object_name(),
            parent_id
        );
        Ok(created)
    }

    async fn attach_positions(
        &self,
        document: Value,
        kind: ParentKind,
        positions: Option<&[PositionInput]>,
    ) -> Result<Value, SevDeskError> {
        let positions = match positions {
            Some(p) if !p.is_empty() => p,
            _ => return Ok(document),
        };

        let parent_id = match extract_created_id(&document) {
            Some(id) => id,
            None => {
                tracing::warn!(
                    "No id in {} creation response, {} positions not created",
                    kind.object_name(),
                    positions.len()
                );
                return Ok(document);
            }
        };

        tracing::info!("Created {} {}", kind.object_name(), parent_id);
        let created = self.create_positions(&parent_id, kind, positions).await?;

        let document_key = match kind {
            ParentKind::Invoice => "document",
            ParentKind::Order => "offer",
        };
        Ok(json!({ document_key: document, "positions": created }))
    }
}

/// Id of a freshly created resource
///
/// sevDesk wraps most responses in `objects`; `objects.id` wins, the
/// top-level `id` is the fallback.
pub fn extract_created_id(response: &Value) -> Option<Scalar> {
    response
        .pointer("/objects/id")
        .and_then(Scalar::from_json)
        .or_else(|| response.get("id").and_then(Scalar::from_json))
}

fn paging(limit: Option<u64>, offset: Option<u64>) -> Vec<(String, String)> {
    vec![
        ("limit".to_string(), limit.unwrap_or(DEFAULT_LIMIT).to_string()),
        ("offset".to_string(), offset.unwrap_or(DEFAULT_OFFSET).to_string()),
    ]
}

pub fn list_contacts_query(args: &ListContactsArgs) -> Vec<(String, String)> {
    let mut query = paging(args.limit, args.offset);
    query.push(("countAll".to_string(), "true".to_string()));
    if let Some(ref depth) = args.depth {
        query.push(("depth".to_string(), depth.to_string()));
        query.push(("embed".to_string(), "category,parent".to_string()));
    }
    if let Some(ref number) = args.customer_number {
        query.push(("customerNumber".to_string(), number.to_string()));
    }
    query
}

pub fn list_invoices_query(args: &ListInvoicesArgs) -> Vec<(String, String)> {
    let mut query = paging(args.limit, args.offset);
    query.push(("countAll".to_string(), "true".to_string()));
    if let Some(ref status) = args.status {
        query.push(("status".to_string(), status.to_string()));
    }
    if let Some(ref contact_id) = args.contact_id {
        query.push(("contact[id]".to_string(), contact_id.to_string()));
        query.push(("contact[objectName]".to_string(), "Contact".to_string()));
    }
    query
}

pub fn invoice_positions_query(args: &GetInvoicePositionsArgs) -> Vec<(String, String)> {
    let mut query = vec![
        ("invoice[id]".to_string(), args.invoice_id.to_string()),
        ("invoice[objectName]".to_string(), "Invoice".to_string()),
    ];
    query.extend(paging(args.limit, args.offset));
    query
}

/// `<collection>/<id>`, refusing ids that would leave the collection
fn resource_path(collection: &str, id: &Scalar) -> Result<String, SevDeskError> {
    if let Scalar::Text(text) = id {
        let text = text.trim();
        if text.is_empty()
            || text == "."
            || text.contains("..")
            || text.contains(['/', '\\', '?', '#', '%'])
        {
            return Err(SevDeskError::InvalidArguments(format!(
                "'{}' is not a valid resource id",
                text
            )));
        }
        return Ok(format!("{}/{}", collection, text));
    }
    Ok(format!("{}/{}", collection, id))
}

/// Reject anything that could send the token to another host
fn checked_relative_path(url: &str) -> Result<&str, SevDeskError> {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();
    if trimmed.is_empty()
        || trimmed.starts_with("//")
        || trimmed.contains('\\')
        || lower.contains("://")
    {
        return Err(SevDeskError::InvalidPath(url.to_string()));
    }
    Ok(trimmed)
}

fn params_to_query(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}
