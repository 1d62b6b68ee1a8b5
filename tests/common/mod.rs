//! Shared test utilities and fixtures
//!
//! A wiremock stand-in for the backend's token, list and logout endpoints.

#![allow(dead_code)]

use std::time::Duration;

use desk_client::{DeskClient, Settings};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/api/method/frontend_api.auth.get_csrf_token";
pub const LOGOUT_PATH: &str = "/api/method/logout";
pub const LIST_PATH: &str = "/api/method/frappe.client.get_list";
pub const COUNT_PATH: &str = "/api/method/frappe.client.get_count";

/// Settings pointing at `server` with a live session id.
pub fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::new(&server.uri()).expect("mock server URI is valid");
    settings.timeout = Duration::from_secs(5);
    settings.sid = Some("integration-sid".to_string());
    settings
}

pub fn client_for(server: &MockServer) -> DeskClient {
    DeskClient::new(settings_for(server)).expect("client builds")
}

/// Token endpoint answering with `token` in the response header.
pub async fn mount_token(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Frappe-CSRF-Token", token))
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub async fn mount_logout(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(LOGOUT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub async fn mount_list(server: &MockServer, rows: Value, total: u64) {
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": rows })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(COUNT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": total })))
        .mount(server)
        .await;
}

/// The stale-token rejection the backend sends.
pub fn csrf_rejection() -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "exc_type": "CSRFTokenError",
        "exception": "frappe.exceptions.CSRFTokenError: Invalid Request",
    }))
}

/// Value of query parameter `key` on the first request received at `path`.
pub async fn query_param_of(server: &MockServer, path: &str, key: &str) -> Option<String> {
    server
        .received_requests()
        .await?
        .into_iter()
        .find(|r| r.url.path() == path)?
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
