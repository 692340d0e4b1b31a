//! Integration tests for drive listings through GraphStorageProvider

use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use snapwatch_core::domain::ProviderError;
use snapwatch_core::ports::IStorageProvider;
use snapwatch_graph::client::GraphClient;
use snapwatch_graph::provider::GraphStorageProvider;

use crate::common;

#[tokio::test]
async fn test_list_subfolders_keeps_only_folders() {
    let (server, client) = common::setup_graph_mock().await;
    common::mount_children(
        &server,
        "ROOT",
        json!([
            common::folder("A1", "Alpha"),
            common::file("X1", "readme.txt", "2024-03-10T01:00:00Z"),
            common::folder("B1", "Beta"),
        ]),
    )
    .await;

    let provider = GraphStorageProvider::new(client);
    let folders = provider.list_subfolders("ROOT").await.expect("list folders");

    let names: Vec<&str> = folders.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);
    assert_eq!(folders[0].id, "A1");
}

#[tokio::test]
async fn test_list_files_decodes_timestamps() {
    let (server, client) = common::setup_graph_mock().await;
    common::mount_children(
        &server,
        "SNAP",
        json!([
            common::file("F1", "snap-1", "2024-03-10T02:30:00Z"),
            common::folder("D1", "nested"),
        ]),
    )
    .await;

    let provider = GraphStorageProvider::new(client);
    let files = provider.list_files("SNAP").await.expect("list files");

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "snap-1");
    assert_eq!(files[0].size, 4096);
    assert_eq!(
        files[0].created_at,
        Utc.with_ymd_and_hms(2024, 3, 10, 2, 30, 0).unwrap()
    );
}

#[tokio::test]
async fn test_listing_follows_next_link() {
    let (server, client) = common::setup_graph_mock().await;

    Mock::given(method("GET"))
        .and(path("/me/drive/items/SNAP/children"))
        .and(query_param("$skiptoken", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [common::file("F2", "snap-2", "2024-03-09T02:30:00Z")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/drive/items/SNAP/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [common::file("F1", "snap-1", "2024-03-10T02:30:00Z")],
            "@odata.nextLink": format!(
                "{}/me/drive/items/SNAP/children?$skiptoken=page2",
                server.uri()
            )
        })))
        .mount(&server)
        .await;

    let provider = GraphStorageProvider::new(client);
    let files = provider.list_files("SNAP").await.expect("list files");

    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["snap-1", "snap-2"]);
}

#[tokio::test]
async fn test_not_found_maps_to_provider_error() {
    let (server, client) = common::setup_graph_mock().await;
    Mock::given(method("GET"))
        .and(path("/me/drive/items/GONE/children"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "itemNotFound", "message": "Item does not exist"}
        })))
        .mount(&server)
        .await;

    let provider = GraphStorageProvider::new(client);
    let err = provider.list_subfolders("GONE").await.unwrap_err();

    assert_eq!(
        err,
        ProviderError::NotFound("itemNotFound: Item does not exist".into())
    );
}

#[tokio::test]
async fn test_server_error_is_transport() {
    let (server, client) = common::setup_graph_mock().await;
    Mock::given(method("GET"))
        .and(path("/me/drive/items/ROOT/children"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = GraphStorageProvider::new(client);
    let err = provider.list_subfolders("ROOT").await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_throttled_request_is_retried() {
    let (server, client) = common::setup_graph_mock().await;

    Mock::given(method("GET"))
        .and(path("/me/drive/items/ROOT/children"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    common::mount_children(&server, "ROOT", json!([common::folder("A1", "Alpha")])).await;

    let provider = GraphStorageProvider::new(client);
    let folders = provider.list_subfolders("ROOT").await.expect("retry succeeds");
    assert_eq!(folders.len(), 1);
}

#[tokio::test]
async fn test_throttling_exhausts_retry_budget() {
    let (server, client) = common::setup_graph_mock().await;
    Mock::given(method("GET"))
        .and(path("/me/drive/items/ROOT/children"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let provider = GraphStorageProvider::new(client.with_max_retries(1));
    let err = provider.list_subfolders("ROOT").await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_long_retry_after_fails_instead_of_sleeping() {
    let (server, client) = common::setup_graph_mock().await;
    Mock::given(method("GET"))
        .and(path("/me/drive/items/ROOT/children"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3600"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GraphStorageProvider::new(client);
    let err = tokio::time::timeout(Duration::from_secs(5), provider.list_subfolders("ROOT"))
        .await
        .expect("listing must not wait out the Retry-After")
        .unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_back_off_budget_spans_pages() {
    let (server, client) = common::setup_graph_mock().await;
    let next = format!(
        "{}/me/drive/items/ROOT/children?$skiptoken=page2",
        server.uri()
    );

    // Page two is throttled after page one already used the whole budget.
    Mock::given(method("GET"))
        .and(path("/me/drive/items/ROOT/children"))
        .and(query_param("$skiptoken", "page2"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/drive/items/ROOT/children"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/drive/items/ROOT/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [common::folder("A1", "Alpha")],
            "@odata.nextLink": next,
        })))
        .mount(&server)
        .await;

    let provider = GraphStorageProvider::new(client.with_max_backoff(Duration::from_secs(1)));
    let err = provider.list_subfolders("ROOT").await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/drive/items/ROOT/children"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"value": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = GraphClient::with_base_url("token", server.uri(), Duration::from_millis(200))
        .expect("build client");
    let provider = GraphStorageProvider::new(client);

    let err = provider.list_subfolders("ROOT").await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn test_access_token_swap_is_used() {
    let (server, client) = common::setup_graph_mock().await;
    Mock::given(method("GET"))
        .and(path("/me/drive/items/ROOT/children"))
        .and(header("authorization", "Bearer rotated-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GraphStorageProvider::new(client);
    provider.set_access_token("rotated-token").await;

    let folders = provider.list_subfolders("ROOT").await.expect("list folders");
    assert!(folders.is_empty());
}

#[tokio::test]
async fn test_list_root_folders() {
    let (server, client) = common::setup_graph_mock().await;
    Mock::given(method("GET"))
        .and(path("/me/drive/root/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                common::folder("R1", "Backups"),
                common::file("R2", "notes.txt", "2024-03-10T01:00:00Z")
            ]
        })))
        .mount(&server)
        .await;

    let provider = GraphStorageProvider::new(client);
    let folders = provider.list_root_folders().await.expect("list root");
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].name, "Backups");
}
