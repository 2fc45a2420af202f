//! Common test utilities for integration tests

use traceline_client::{ApiKey, Client, ClientConfig, VersionCheckConfig};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

#[allow(dead_code)]
pub const TEST_API_KEY: &str = "11111111-1111-4111-8111-111111111111";

/// Mount the full collection API surface with success-shaped responses,
/// plus a failing registry lookup for the version check.
#[allow(dead_code)]
pub async fn mount_collection_api(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/create_session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "jwt": "some_jwt"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/update_session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "token_cost": 5
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/create_events"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/developer_errors"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/reauthorize_jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "jwt": "some_jwt"
        })))
        .mount(server)
        .await;

    // The registry lookup fails; the SDK must shrug it off
    Mock::given(method("GET"))
        .and(path("/api/v1/crates/traceline"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

/// Client configuration pointed at the mock server, tuned for fast flushes
#[allow(dead_code)]
pub fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(ApiKey::new(TEST_API_KEY).unwrap())
        .with_endpoint(server.uri())
        .with_batch_interval_ms(25)
        .with_version_check(VersionCheckConfig {
            enabled: true,
            registry_url: Some(format!("{}/api/v1/crates/traceline", server.uri())),
        })
}

/// Client wired to the mock server
#[allow(dead_code)]
pub fn test_client(server: &MockServer) -> Client {
    Client::new(test_config(server)).unwrap()
}
