#![allow(dead_code)]

use serde_json::Value;
use sevdesk_mcp::{ApiToken, RuntimeConfig, SevDeskClient};
use std::time::Duration;
use wiremock::{MockServer, Request};

pub const TOKEN: &str = "test-token";

pub fn client_for(server: &MockServer) -> SevDeskClient {
    let config = RuntimeConfig {
        api_token: ApiToken::new(TOKEN),
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
    };
    SevDeskClient::new(&config).expect("client")
}

/// Requests the mock server saw for `path`, in arrival order
pub async fn requests_to(server: &MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|req| req.url.path() == path)
        .collect()
}

pub fn json_body(req: &Request) -> Value {
    serde_json::from_slice(&req.body).expect("JSON body")
}
