//! Common test utilities

#![allow(dead_code)]

use port_export_client::{PortClient, PortConfig};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";

/// Start a mock Port API that accepts the `id` / `secret` credentials
pub async fn mock_port() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/access_token"))
        .and(body_json(json!({"clientId": "id", "clientSecret": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "accessToken": TOKEN,
            "expiresIn": 10800,
            "tokenType": "Bearer"
        })))
        .mount(&server)
        .await;
    server
}

pub fn config_for(server: &MockServer) -> PortConfig {
    PortConfig::new("id", "secret").with_base_url(server.uri())
}

/// Create a client against `server` and authenticate it
pub async fn authenticated_client(server: &MockServer) -> PortClient {
    let mut client = PortClient::new(config_for(server)).expect("valid config");
    client.authenticate().await.expect("authentication succeeds");
    client
}

pub fn entity(blueprint: &str, identifier: &str, properties: Value) -> Value {
    json!({
        "identifier": identifier,
        "title": identifier.to_uppercase(),
        "blueprint": blueprint,
        "properties": properties,
        "relations": {},
        "createdAt": "2024-01-01T00:00:00.000Z",
        "createdBy": "tester"
    })
}

/// Mount `GET /blueprints` returning the given identifiers
pub async fn mount_blueprints(server: &MockServer, blueprints: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/blueprints"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "blueprints": blueprints})),
        )
        .mount(server)
        .await;
}

/// Mount a single-page `GET /blueprints/{id}/entities`
pub async fn mount_entities(server: &MockServer, blueprint: &str, entities: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/blueprints/{blueprint}/entities")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "entities": entities})),
        )
        .mount(server)
        .await;
}

/// Mount `GET /blueprints/{id}/entities/{entity}`
pub async fn mount_entity(server: &MockServer, blueprint: &str, body: Value) {
    let identifier = body["identifier"].as_str().unwrap_or_default().to_string();
    Mock::given(method("GET"))
        .and(path(format!("/blueprints/{blueprint}/entities/{identifier}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "entity": body})))
        .mount(server)
        .await;
}
