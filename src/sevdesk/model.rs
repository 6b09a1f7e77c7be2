//! Request and payload shapes for the sevDesk resources
//!
//! Nothing here is persisted. Tool arguments are decoded into the `*Args`
//! structs, then turned into the `*Payload` structs that serialize to the
//! nested JSON sevDesk expects.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

pub const DEFAULT_LIMIT: u64 = 50;
pub const DEFAULT_OFFSET: u64 = 0;
pub const DEFAULT_CONTACT_STATUS: &str = "1000";
pub const DEFAULT_DOCUMENT_STATUS: &str = "100";
pub const DEFAULT_INVOICE_HEADER: &str = "Invoice";
pub const DEFAULT_OFFER_HEADER: &str = "Offer";
pub const DEFAULT_TAX_TYPE: &str = "default";
pub const DEFAULT_CURRENCY: &str = "EUR";
/// Base unit of measure ("Stück")
pub const DEFAULT_UNITY_ID: &str = "1";
/// Standard invoice
pub const INVOICE_TYPE_STANDARD: &str = "RE";
/// Offer / quote
pub const ORDER_TYPE_OFFER: &str = "AN";

/// String-or-integer value forwarded in the shape the caller supplied
///
/// sevDesk accepts ids, status codes and customer numbers either way, so
/// `3` stays `3` and `"3"` stays `"3"` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    pub fn text(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }

    /// Read an id out of a response field. Empty strings count as absent.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Scalar::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(Scalar::Int),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Pointer to a remote resource: `{ "id": .., "objectName": .. }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub id: Scalar,
    pub object_name: &'static str,
}

impl Reference {
    pub fn new(id: Scalar, object_name: &'static str) -> Self {
        Self { id, object_name }
    }
}

/// Document kind a position belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    Invoice,
    Order,
}

impl ParentKind {
    /// Resource-type tag of the parent document
    pub fn object_name(self) -> &'static str {
        match self {
            ParentKind::Invoice => "Invoice",
            ParentKind::Order => "Order",
        }
    }

    /// Reference a position uses to point at its parent
    pub fn parent_reference(self, id: Scalar) -> ParentRef {
        let reference = Reference::new(id, self.object_name());
        match self {
            ParentKind::Invoice => ParentRef::Invoice(reference),
            ParentKind::Order => ParentRef::Order(reference),
        }
    }

    /// Resource-type tag (and collection name) of the positions
    pub fn position_object_name(self) -> &'static str {
        match self {
            ParentKind::Invoice => "InvoicePos",
            ParentKind::Order => "OrderPos",
        }
    }

    pub fn position_path(self) -> String {
        format!("/{}", self.position_object_name())
    }
}

/// Parent of a position, serialized under its kind-specific key
/// (`invoice` or `order`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParentRef {
    Invoice(Reference),
    Order(Reference),
}

/// Restricted verb set for `raw_request`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!(
                "unsupported method '{}', expected GET, POST, PUT or DELETE",
                other
            )),
        }
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        HttpMethod::try_from(raw).map_err(de::Error::custom)
    }
}

/// Accept a paging count as a JSON number or a numeric string
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Int(n)) => u64::try_from(n)
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a non-negative count, got {}", n))),
        Some(Scalar::Text(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a non-negative count, got '{}'", s))),
    }
}

// Tool arguments

#[derive(Debug, Clone, Deserialize)]
pub struct RawRequestArgs {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContactsArgs {
    #[serde(default, deserialize_with = "lenient_count")]
    pub limit: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub offset: Option<u64>,
    #[serde(default)]
    pub customer_number: Option<Scalar>,
    #[serde(default)]
    pub depth: Option<Scalar>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactArgs {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<Scalar>,
    #[serde(default)]
    pub customer_number: Option<Scalar>,
    #[serde(default)]
    pub surename: Option<String>,
    #[serde(default)]
    pub familyname: Option<String>,
    pub category_id: Scalar,
}

/// Fields of an update are forwarded exactly as supplied: only keys the
/// caller sent end up in the PUT body, explicit `null`s included.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactArgs {
    pub contact_id: Scalar,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesArgs {
    #[serde(default, deserialize_with = "lenient_count")]
    pub limit: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub offset: Option<u64>,
    #[serde(default)]
    pub status: Option<Scalar>,
    #[serde(default)]
    pub contact_id: Option<Scalar>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInvoicePositionsArgs {
    pub invoice_id: Scalar,
    #[serde(default, deserialize_with = "lenient_count")]
    pub limit: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceArgs {
    pub contact_id: Scalar,
    #[serde(default)]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub status: Option<Scalar>,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub tax_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub positions: Option<Vec<PositionInput>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceArgs {
    pub invoice_id: Scalar,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferArgs {
    pub contact_id: Scalar,
    #[serde(default)]
    pub order_date: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub status: Option<Scalar>,
    #[serde(default)]
    pub positions: Option<Vec<PositionInput>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfferArgs {
    pub order_id: Scalar,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One billable row of an invoice or offer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInput {
    pub name: String,
    pub price: Number,
    #[serde(default)]
    pub quantity: Option<Number>,
    #[serde(default)]
    pub tax_rate: Option<Number>,
    #[serde(default)]
    pub unity_id: Option<Scalar>,
    #[serde(default)]
    pub text: Option<String>,
}

// Payloads

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub object_name: &'static str,
    pub status: Scalar,
    pub category: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub familyname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_number: Option<Scalar>,
}

impl From<CreateContactArgs> for ContactPayload {
    fn from(args: CreateContactArgs) -> Self {
        Self {
            object_name: "Contact",
            status: args
                .status
                .unwrap_or_else(|| Scalar::text(DEFAULT_CONTACT_STATUS)),
            category: Reference::new(args.category_id, "Category"),
            name: args.name,
            surename: args.surename,
            familyname: args.familyname,
            customer_number: args.customer_number,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayload {
    pub object_name: &'static str,
    pub contact: Reference,
    pub invoice_date: String,
    pub header: String,
    pub status: Scalar,
    pub invoice_type: &'static str,
    pub currency: String,
    pub tax_type: String,
    pub map_all: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
}

impl InvoicePayload {
    /// Build the document body; `now` fills a missing invoice date.
    pub fn new(args: &CreateInvoiceArgs, now: DateTime<Utc>) -> Self {
        Self {
            object_name: "Invoice",
            contact: Reference::new(args.contact_id.clone(), "Contact"),
            invoice_date: args
                .invoice_date
                .clone()
                .unwrap_or_else(|| timestamp(now)),
            header: args
                .header
                .clone()
                .unwrap_or_else(|| DEFAULT_INVOICE_HEADER.to_string()),
            status: args
                .status
                .clone()
                .unwrap_or_else(|| Scalar::text(DEFAULT_DOCUMENT_STATUS)),
            invoice_type: INVOICE_TYPE_STANDARD,
            currency: args
                .currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            tax_type: args
                .tax_type
                .clone()
                .unwrap_or_else(|| DEFAULT_TAX_TYPE.to_string()),
            map_all: true,
            delivery_date: args.delivery_date.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub object_name: &'static str,
    pub contact: Reference,
    pub order_date: String,
    pub header: String,
    pub status: Scalar,
    pub order_type: &'static str,
    pub map_all: bool,
}

impl OrderPayload {
    /// Build an offer body; `now` fills a missing order date.
    pub fn new(args: &CreateOfferArgs, now: DateTime<Utc>) -> Self {
        Self {
            object_name: "Order",
            contact: Reference::new(args.contact_id.clone(), "Contact"),
            order_date: args.order_date.clone().unwrap_or_else(|| timestamp(now)),
            header: args
                .header
                .clone()
                .unwrap_or_else(|| DEFAULT_OFFER_HEADER.to_string()),
            status: args
                .status
                .clone()
                .unwrap_or_else(|| Scalar::text(DEFAULT_DOCUMENT_STATUS)),
            order_type: ORDER_TYPE_OFFER,
            map_all: true,
        }
    }
}

/// Body of one `InvoicePos` / `OrderPos` create call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPayload {
    pub object_name: &'static str,
    #[serde(flatten)]
    pub parent: ParentRef,
    pub quantity: Number,
    pub price: Number,
    pub name: String,
    pub unity: Reference,
    pub tax_rate: Number,
    pub map_all: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl PositionPayload {
    pub fn new(parent_id: &Scalar, kind: ParentKind, position: &PositionInput) -> Self {
        let unity_id = position
            .unity_id
            .clone()
            .unwrap_or_else(|| Scalar::text(DEFAULT_UNITY_ID));
        Self {
            object_name: kind.position_object_name(),
            parent: kind.parent_reference(parent_id.clone()),
            quantity: position.quantity.clone().unwrap_or_else(|| Number::from(1)),
            price: position.price.clone(),
            name: position.name.clone(),
            unity: Reference::new(unity_id, "Unity"),
            tax_rate: position.tax_rate.clone().unwrap_or_else(|| Number::from(0)),
            map_all: true,
            text: position.text.clone(),
        }
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}
