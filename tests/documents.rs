mod common;

use common::{client_for, json_body, requests_to};
use serde_json::{json, Value};
use sevdesk_mcp::sevdesk::model::*;
use sevdesk_mcp::SevDeskError;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn args<T: serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}

async fn mount_document(server: &MockServer, route: &str, response: Value) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(201).set_body_json(response))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_invoice_without_positions_returns_bare_response() {
    let server = MockServer::start().await;
    let created = json!({ "objects": { "id": "500", "objectName": "Invoice" } });
    mount_document(&server, "/Invoice", created.clone()).await;
    Mock::given(method("POST"))
        .and(path("/InvoicePos"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .create_invoice(args(json!({ "contactId": "5" })))
        .await
        .unwrap();
    assert_eq!(result, created);
    assert!(result.get("positions").is_none());

    let sent = json_body(&requests_to(&server, "/Invoice").await[0]);
    assert_eq!(sent["objectName"], "Invoice");
    assert_eq!(sent["invoiceType"], "RE");
    assert_eq!(sent["status"], "100");
    assert_eq!(sent["header"], "Invoice");
    assert_eq!(sent["currency"], "EUR");
    assert_eq!(sent["taxType"], "default");
    assert_eq!(sent["mapAll"], true);
    assert_eq!(sent["contact"], json!({ "id": "5", "objectName": "Contact" }));
    assert!(sent.get("deliveryDate").is_none());
    let date = sent["invoiceDate"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(date).is_ok());
}

#[tokio::test]
async fn test_create_invoice_with_empty_positions_returns_bare_response() {
    let server = MockServer::start().await;
    let created = json!({ "objects": { "id": "501" } });
    mount_document(&server, "/Invoice", created.clone()).await;

    let client = client_for(&server);
    let result = client
        .create_invoice(args(json!({ "contactId": "5", "positions": [] })))
        .await
        .unwrap();
    assert_eq!(result, created);
    assert!(requests_to(&server, "/InvoicePos").await.is_empty());
}

#[tokio::test]
async fn test_create_invoice_positions_in_input_order() {
    let server = MockServer::start().await;
    let created = json!({ "objects": { "id": "600", "objectName": "Invoice" } });
    mount_document(&server, "/Invoice", created.clone()).await;
    for (name, id) in [("First", "1"), ("Second", "2"), ("Third", "3")] {
        Mock::given(method("POST"))
            .and(path("/InvoicePos"))
            .and(body_partial_json(json!({ "name": name })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({ "objects": { "id": id, "name": name } })),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    let result = client
        .create_invoice(args(json!({
            "contactId": 5,
            "positions": [
                { "name": "First", "price": 10 },
                { "name": "Second", "price": 20, "quantity": 3, "taxRate": 19 },
                { "name": "Third", "price": 30.5, "text": "Rush order" }
            ]
        })))
        .await
        .unwrap();

    assert_eq!(result["document"], created);
    assert!(result.get("invoice").is_none());
    let names: Vec<&str> = result["positions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["objects"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["First", "Second", "Third"]);

    let sent: Vec<Value> = requests_to(&server, "/InvoicePos")
        .await
        .iter()
        .map(json_body)
        .collect();
    assert_eq!(sent.len(), 3);
    for body in &sent {
        assert_eq!(body["objectName"], "InvoicePos");
        assert_eq!(body["invoice"], json!({ "id": "600", "objectName": "Invoice" }));
        assert_eq!(body["mapAll"], true);
    }
    assert_eq!(sent[0]["name"], "First");
    assert_eq!(sent[0]["quantity"], 1);
    assert_eq!(sent[0]["taxRate"], 0);
    assert_eq!(sent[1]["name"], "Second");
    assert_eq!(sent[1]["quantity"], 3);
    assert_eq!(sent[1]["taxRate"], 19);
    assert_eq!(sent[2]["name"], "Third");
    assert_eq!(sent[2]["price"], json!(30.5));
    assert_eq!(sent[2]["text"], "Rush order");
    assert!(sent[0].get("text").is_none());

    // Document first, then positions
    let all = server.received_requests().await.unwrap();
    assert_eq!(all[0].url.path(), "/Invoice");
    assert!(all[1..].iter().all(|r| r.url.path() == "/InvoicePos"));
}

#[tokio::test]
async fn test_create_offer_example() {
    let server = MockServer::start().await;
    let created = json!({ "objects": { "id": "900", "objectName": "Order" } });
    mount_document(&server, "/Order", created.clone()).await;
    Mock::given(method("POST"))
        .and(path("/OrderPos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "objects": { "id": "1" } })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .create_offer(args(json!({
            "contactId": "5",
            "positions": [{ "name": "Widget", "price": 10 }]
        })))
        .await
        .unwrap();

    assert_eq!(result["offer"], created);
    assert_eq!(result["positions"], json!([{ "objects": { "id": "1" } }]));

    let order = json_body(&requests_to(&server, "/Order").await[0]);
    assert_eq!(order["orderType"], "AN");
    assert_eq!(order["objectName"], "Order");
    assert_eq!(order["status"], "100");
    assert_eq!(order["contact"], json!({ "id": "5", "objectName": "Contact" }));

    let position = json_body(&requests_to(&server, "/OrderPos").await[0]);
    assert_eq!(
        position,
        json!({
            "objectName": "OrderPos",
            "order": { "id": "900", "objectName": "Order" },
            "quantity": 1,
            "price": 10,
            "name": "Widget",
            "unity": { "id": "1", "objectName": "Unity" },
            "taxRate": 0,
            "mapAll": true
        })
    );
}

#[tokio::test]
async fn test_top_level_id_fallback() {
    let server = MockServer::start().await;
    mount_document(&server, "/Order", json!({ "id": 321, "objectName": "Order" })).await;
    Mock::given(method("POST"))
        .and(path("/OrderPos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .create_offer(args(json!({ "contactId": "5", "positions": [{ "name": "A", "price": 1 }] })))
        .await
        .unwrap();

    let position = json_body(&requests_to(&server, "/OrderPos").await[0]);
    assert_eq!(position["order"], json!({ "id": 321, "objectName": "Order" }));
}

#[tokio::test]
async fn test_unresolved_id_skips_positions() {
    let server = MockServer::start().await;
    let created = json!({ "objects": null });
    mount_document(&server, "/Invoice", created.clone()).await;

    let client = client_for(&server);
    let result = client
        .create_invoice(args(json!({
            "contactId": "5",
            "positions": [{ "name": "A", "price": 1 }]
        })))
        .await
        .unwrap();
    assert_eq!(result, created);
    assert!(requests_to(&server, "/InvoicePos").await.is_empty());
}

#[tokio::test]
async fn test_position_failure_aborts_remaining() {
    let server = MockServer::start().await;
    mount_document(&server, "/Invoice", json!({ "objects": { "id": "700" } })).await;
    Mock::given(method("POST"))
        .and(path("/InvoicePos"))
        .and(body_partial_json(json!({ "name": "Ok" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "objects": { "id": "1" } })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/InvoicePos"))
        .and(body_partial_json(json!({ "name": "Broken" })))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "error": { "message": "Unity not found" } })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/InvoicePos"))
        .and(body_partial_json(json!({ "name": "Never" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .create_invoice(args(json!({
            "contactId": "5",
            "positions": [
                { "name": "Ok", "price": 1 },
                { "name": "Broken", "price": 2, "unityId": "999" },
                { "name": "Never", "price": 3 }
            ]
        })))
        .await
        .unwrap_err();

    assert!(matches!(err, SevDeskError::Api { status: 500, .. }));
    assert!(err.to_string().contains("Unity not found"));
    assert_eq!(requests_to(&server, "/InvoicePos").await.len(), 2);
}

#[tokio::test]
async fn test_create_positions_directly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/InvoicePos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "objects": { "id": "1" } })))
        .expect(2)
        .mount(&server)
        .await;

    let positions: Vec<PositionInput> = args(json!([
        { "name": "A", "price": 1, "unityId": 2 },
        { "name": "B", "price": 2 }
    ]));
    let client = client_for(&server);
    let created = client
        .create_positions(&Scalar::Int(44), ParentKind::Invoice, &positions)
        .await
        .unwrap();
    assert_eq!(created.len(), 2);

    let first = json_body(&requests_to(&server, "/InvoicePos").await[0]);
    assert_eq!(first["invoice"], json!({ "id": 44, "objectName": "Invoice" }));
    assert_eq!(first["unity"], json!({ "id": 2, "objectName": "Unity" }));
}
