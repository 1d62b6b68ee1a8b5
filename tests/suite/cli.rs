//! The `desk` binary end to end

use std::process::{Command, Output};

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{LIST_PATH, mount_list, mount_token, query_param_of};

/// Run `desk` with an isolated environment (no user config, fixed session).
async fn desk(server: &MockServer, args: &[&str]) -> Output {
    let home = TempDir::new().unwrap();
    let config = home.path().join("absent.toml");
    let mut command = Command::new(env!("CARGO_BIN_EXE_desk"));
    command
        .args(args)
        .env("DESK_CONFIG", &config)
        .env("DESK_BASE_URL", server.uri())
        .env("DESK_SID", "cli-sid")
        .env_remove("RUST_LOG");

    tokio::task::spawn_blocking(move || {
        let output = command.output().expect("desk binary runs");
        drop(home);
        output
    })
    .await
    .unwrap()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[tokio::test]
async fn list_prints_page_as_json() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 1).await;
    mount_list(&server, json!([{"name": "ACC-SINV-0001"}]), 7).await;

    let output = desk(
        &server,
        &[
            "list",
            "Sales Invoice",
            "--page",
            "2",
            "--page-size",
            "5",
            "--filter",
            "status:=:Unpaid",
        ],
    )
    .await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_json(&output),
        json!({"data": [{"name": "ACC-SINV-0001"}], "total": 7})
    );
    assert_eq!(query_param_of(&server, LIST_PATH, "limit_start").await.as_deref(), Some("5"));
    assert_eq!(
        query_param_of(&server, LIST_PATH, "filters").await.as_deref(),
        Some(r#"[["status","=","Unpaid"]]"#)
    );
}

#[tokio::test]
async fn whoami_reports_user() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 1).await;
    Mock::given(method("GET"))
        .and(path("/api/method/frappe.auth.get_logged_user"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "jane@example.com"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let output = desk(&server, &["whoami"]).await;
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!({"user": "jane@example.com"}));
}

#[tokio::test]
async fn backend_error_goes_to_stderr_with_exit_code_one() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 1).await;
    Mock::given(method("GET"))
        .and(path("/api/resource/Lead/CRM-LEAD-404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "exc_type": "DoesNotExistError",
            "exception": "frappe.exceptions.DoesNotExistError: Lead CRM-LEAD-404 not found",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = desk(&server, &["get", "Lead", "CRM-LEAD-404"]).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert_eq!(
        String::from_utf8_lossy(&output.stderr).trim(),
        "desk: Lead CRM-LEAD-404 not found"
    );
}

#[tokio::test]
async fn call_get_turns_args_into_query() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 1).await;
    Mock::given(method("GET"))
        .and(path("/api/method/frontend_api.reports.sales_summary"))
        .and(query_param("from_date", "2024-05-01"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": {"total_sales": 10}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let output = desk(
        &server,
        &[
            "call",
            "frontend_api.reports.sales_summary",
            r#"{"from_date": "2024-05-01"}"#,
            "--get",
        ],
    )
    .await;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output), json!({"total_sales": 10}));
}
