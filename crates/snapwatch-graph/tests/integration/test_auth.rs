//! Integration tests for the OAuth2 device code flow and token refresh

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use snapwatch_core::domain::ProviderError;
use snapwatch_core::ports::IAuthProvider;
use snapwatch_graph::auth::{DeviceCodeConfig, DeviceCodePrompt, GraphAuthAdapter};

fn adapter(server: &MockServer) -> GraphAuthAdapter {
    let config = DeviceCodeConfig::new("test-client", "common")
        .with_authority(server.uri())
        .with_request_timeout(Duration::from_secs(5));
    GraphAuthAdapter::new(&config).expect("build adapter")
}

#[tokio::test]
async fn test_refresh_returns_new_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/common/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-rt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-at",
            "token_type": "Bearer",
            "expires_in": 3599,
            "refresh_token": "new-rt"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = adapter(&server).refresh("old-rt").await.expect("refresh");

    assert_eq!(grant.access_token, "new-at");
    assert_eq!(grant.refresh_token.as_deref(), Some("new-rt"));
    assert_eq!(grant.expires_in_secs, 3599);
}

#[tokio::test]
async fn test_refresh_invalid_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/common/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "AADSTS70008: The refresh token has expired"
        })))
        .mount(&server)
        .await;

    let err = adapter(&server).refresh("stale-rt").await.unwrap_err();

    assert_eq!(
        err,
        ProviderError::InvalidGrant("AADSTS70008: The refresh token has expired".into())
    );
}

#[tokio::test]
async fn test_refresh_unreachable_is_transport() {
    let config = DeviceCodeConfig::new("test-client", "common")
        .with_authority("http://127.0.0.1:1")
        .with_request_timeout(Duration::from_secs(2));
    let adapter = GraphAuthAdapter::new(&config).expect("build adapter");

    let err = adapter.refresh("rt").await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_device_code_login_polls_until_approved() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/common/oauth2/v2.0/devicecode"))
        .and(body_string_contains("client_id=test-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_code": "dev-code",
            "user_code": "ABCD-EFGH",
            "verification_uri": "https://microsoft.com/devicelogin",
            "expires_in": 900,
            "interval": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/common/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "authorization_pending"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/common/oauth2/v2.0/token"))
        .and(body_string_contains("device_code=dev-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "first-at",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "first-rt"
        })))
        .mount(&server)
        .await;

    let seen: Arc<Mutex<Option<DeviceCodePrompt>>> = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let adapter = adapter(&server).with_prompt(Arc::new(move |prompt: &DeviceCodePrompt| {
        *sink.lock().unwrap() = Some(prompt.clone());
    }));

    let grant = adapter.authenticate().await.expect("login");

    assert_eq!(grant.access_token, "first-at");
    assert_eq!(grant.refresh_token.as_deref(), Some("first-rt"));

    let prompt = seen.lock().unwrap().clone().expect("prompt shown");
    assert_eq!(prompt.user_code, "ABCD-EFGH");
    assert_eq!(prompt.verification_uri, "https://microsoft.com/devicelogin");
    assert_eq!(prompt.expires_in, Duration::from_secs(900));
}

#[tokio::test]
async fn test_device_code_declined() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/common/oauth2/v2.0/devicecode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_code": "dev-code",
            "user_code": "ABCD-EFGH",
            "verification_uri": "https://microsoft.com/devicelogin",
            "expires_in": 900,
            "interval": 0
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/common/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "access_denied",
            "error_description": "The user declined"
        })))
        .mount(&server)
        .await;

    let err = adapter(&server).authenticate().await.unwrap_err();
    assert!(matches!(err, ProviderError::Unauthorized(_)), "got {err:?}");
}
