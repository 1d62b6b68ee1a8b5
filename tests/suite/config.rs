//! Config file to working client

use std::fs;

use desk_client::DeskClient;
use desk_config::{DeskConfig, Settings};
use desk_types::CsrfDetection;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn configured_endpoints_and_namespace_are_used() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        &format!(
            r#"
[server]
base_url = "{}"
rpc_namespace = "crm_api."
csrf_endpoint = "/api/method/crm_api.auth.token"
csrf_detection = "structured"

[session]
sid = "${{DESK_TEST_SID}}"
"#,
            server.uri()
        ),
    );

    Mock::given(method("GET"))
        .and(wiremock::matchers::path("/api/method/crm_api.auth.token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "body-token"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(wiremock::matchers::path("/api/method/crm_api.leads.convert_to_deal"))
        .and(header("X-Frappe-CSRF-Token", "body-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "CRM-OPP-0009"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = DeskConfig::load_from(&path).unwrap().unwrap();
    let settings = Settings::resolve_with(Some(&config), |name| {
        (name == "DESK_TEST_SID").then(|| "from-env".to_string())
    })
    .unwrap();
    assert_eq!(settings.rpc_namespace, "crm_api");
    assert_eq!(settings.csrf_detection, CsrfDetection::Structured);

    let client = DeskClient::new(settings).unwrap();
    assert_eq!(client.cookies().get("sid").as_deref(), Some("from-env"));
    let deal = client.convert_lead_to_deal("CRM-LEAD-0009").await.unwrap();
    assert_eq!(deal, "CRM-OPP-0009");
}

#[test]
fn malformed_config_reports_its_path() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server\nbase_url = ");
    let err = DeskConfig::load_from(&path).unwrap_err();
    assert_eq!(err.path(), Some(path.as_path()));
}

#[test]
fn missing_base_url_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server]\ntimeout_secs = 10\n");
    let config = DeskConfig::load_from(&path).unwrap();
    let err = Settings::resolve_with(config.as_ref(), |_| None).unwrap_err();
    assert!(err.to_string().contains("server.base_url"));
}
