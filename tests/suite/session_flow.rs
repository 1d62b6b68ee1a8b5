//! Token refresh and session expiry through the typed API

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use desk_client::DeskClient;
use desk_client::api::expenses::APPROVED;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{csrf_rejection, client_for, mount_logout, mount_token, settings_for};

const SET_VALUE_PATH: &str = "/api/method/frappe.client.set_value";

#[tokio::test]
async fn first_request_fetches_token_then_reuses_it() {
    let server = MockServer::start().await;
    mount_token(&server, "first-token", 1).await;
    Mock::given(method("POST"))
        .and(path(SET_VALUE_PATH))
        .and(header("X-Frappe-CSRF-Token", "first-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"name": "HR-EXP-0001", "approval_status": "Approved"}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    for _ in 0..2 {
        let claim = client.approve_expense("HR-EXP-0001").await.unwrap();
        assert_eq!(claim.approval_status.as_deref(), Some(APPROVED));
    }
}

#[tokio::test]
async fn stale_token_is_refreshed_transparently() {
    let server = MockServer::start().await;
    mount_token(&server, "renewed", 1).await;
    mount_logout(&server, 0).await;

    Mock::given(method("POST"))
        .and(path(SET_VALUE_PATH))
        .and(header("X-Frappe-CSRF-Token", "expired"))
        .respond_with(csrf_rejection())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SET_VALUE_PATH))
        .and(header("X-Frappe-CSRF-Token", "renewed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"name": "CRM-LEAD-0001", "status": "Replied"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.cookies().set("csrf_token", "expired");

    let lead = client.set_lead_status("CRM-LEAD-0001", "Replied").await.unwrap();
    assert_eq!(lead.status.as_deref(), Some("Replied"));
    assert_eq!(client.cookies().get("csrf_token").as_deref(), Some("renewed"));
    assert!(!client.is_session_expired());
}

#[tokio::test]
async fn repeated_rejection_expires_the_session_once() {
    let server = MockServer::start().await;
    mount_token(&server, "also-rejected", 1).await;
    mount_logout(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(SET_VALUE_PATH))
        .respond_with(csrf_rejection())
        .expect(2)
        .mount(&server)
        .await;

    let redirects = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&redirects);
    let client = DeskClient::with_observer(settings_for(&server), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();
    client.cookies().set("csrf_token", "expired");

    let err = client.set_lead_status("CRM-LEAD-0001", "Lost").await.unwrap_err();
    assert!(err.is_session_expired());
    assert_eq!(err.user_message(), "session expired, please log in again");
    assert!(client.cookies().is_empty());
    assert!(!client.cookies().has_session());
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn clones_share_session_state() {
    let server = MockServer::start().await;
    mount_token(&server, "shared", 1).await;

    let client = client_for(&server);
    let clone = client.clone();
    assert_eq!(client.token().await, "shared");
    assert_eq!(clone.token().await, "shared");
    assert_eq!(clone.cookies().get("sid").as_deref(), Some("integration-sid"));
}
