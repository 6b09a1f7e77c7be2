//! sevDesk HTTP client
//!
//! One shared `reqwest::Client` carrying the static token and base URL.
//! Every call goes through [`SevDeskClient::send`], which maps non-2xx
//! responses to [`SevDeskError::Api`].

use crate::config::RuntimeConfig;
use crate::sevdesk::model::HttpMethod;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// sevDesk client errors
#[derive(Error, Debug)]
pub enum SevDeskError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sevDesk API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid request path '{0}': only paths relative to the API base URL are allowed")]
    InvalidPath(String),

    #[error("API token contains characters that are not allowed in an HTTP header")]
    InvalidToken,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl SevDeskError {
    /// HTTP status of an upstream rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            SevDeskError::Api { status, .. } => Some(*status),
            SevDeskError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Client for the sevDesk REST API
#[derive(Debug, Clone)]
pub struct SevDeskClient {
    base_url: String,
    http_client: Client,
}

impl SevDeskClient {
    /// Create a client from resolved runtime settings
    pub fn new(config: &RuntimeConfig) -> Result<Self, SevDeskError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            config
                .api_token
                .header_value()
                .map_err(|_| SevDeskError::InvalidToken)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(SevDeskError::ClientBuild)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issue exactly one request and return the parsed response body
    ///
    /// # Arguments
    /// * `method` - HTTP verb
    /// * `path` - Resource path relative to the base URL, e.g. `/Contact`
    /// * `query` - Query parameters, sent in order
    /// * `body` - Optional JSON body
    pub async fn send<B>(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<Value, SevDeskError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(path);
        tracing::debug!("{} {} ({} query params)", method.as_str(), url, query.len());

        let mut request = self.http_client.request(method.into(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!("sevDesk returned {} for {} {}", status, method.as_str(), path);
            return Err(SevDeskError::Api {
                status: status.as_u16(),
                body: error_body_text(&text),
            });
        }

        Ok(parse_body(&text))
    }

    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, SevDeskError> {
        self.send::<Value>(HttpMethod::Get, path, query, None).await
    }

    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Value, SevDeskError>
    where
        B: Serialize + ?Sized,
    {
        self.send(HttpMethod::Post, path, &[], Some(body)).await
    }

    pub async fn put<B>(&self, path: &str, body: &B) -> Result<Value, SevDeskError>
    where
        B: Serialize + ?Sized,
    {
        self.send(HttpMethod::Put, path, &[], Some(body)).await
    }
}

/// Successful body: JSON if it parses, the raw text otherwise, `null` if empty
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Error body as compact JSON text, or the raw text if it is not JSON
fn error_body_text(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => value.to_string(),
        Err(_) => text.to_string(),
    }
}
