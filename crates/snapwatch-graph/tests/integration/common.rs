//! Shared test helpers for Graph API integration tests
//!
//! Provides wiremock-based mock server setup for the drive listing and OAuth
//! endpoints.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use snapwatch_graph::client::GraphClient;

/// Starts a mock server and returns a GraphClient pointing at it
pub async fn setup_graph_mock() -> (MockServer, GraphClient) {
    let server = MockServer::start().await;
    let client = GraphClient::with_base_url("test-access-token", server.uri(), Duration::from_secs(5))
        .expect("build client");
    (server, client)
}

pub fn folder(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "size": 0,
        "createdDateTime": "2024-01-01T00:00:00Z",
        "lastModifiedDateTime": "2024-01-01T00:00:00Z",
        "folder": {"childCount": 1}
    })
}

pub fn file(id: &str, name: &str, created: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "size": 4096,
        "createdDateTime": created,
        "lastModifiedDateTime": created,
        "file": {"mimeType": "application/octet-stream"}
    })
}

/// Mounts a single-page `children` listing for an item
pub async fn mount_children(server: &MockServer, item_id: &str, items: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/me/drive/items/{item_id}/children")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": items })))
        .mount(server)
        .await;
}
