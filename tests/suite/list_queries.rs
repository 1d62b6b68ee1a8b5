//! Paginated list views against a mock backend

use desk_client::api::ListParams;
use desk_client::api::invoices::InvoiceListParams;
use desk_client::api::leads::LeadListParams;
use desk_client::{LatestOnly, ListSpec};
use desk_types::{Filters, Page};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{COUNT_PATH, LIST_PATH, client_for, mount_list, mount_token, query_param_of};

#[tokio::test]
async fn lead_search_on_second_page() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 1).await;
    mount_list(&server, json!([{"name": "CRM-LEAD-0011", "lead_name": "Acme"}]), 11).await;

    let client = client_for(&server);
    let params = LeadListParams {
        list: ListParams::new(Page::new(2, 10).unwrap()).with_search("acme"),
        ..LeadListParams::default()
    };
    let page = client.fetch_leads(&params).await.unwrap();
    assert_eq!(page.total, 11);
    assert_eq!(page.data.len(), 1);

    assert_eq!(query_param_of(&server, LIST_PATH, "limit_start").await.as_deref(), Some("10"));
    assert_eq!(
        query_param_of(&server, LIST_PATH, "limit_page_length").await.as_deref(),
        Some("10")
    );
    let raw = query_param_of(&server, LIST_PATH, "or_filters").await.unwrap();
    let or_filters: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        or_filters,
        json!([
            ["lead_name", "like", "%acme%"],
            ["email", "like", "%acme%"],
            ["company_name", "like", "%acme%"],
        ])
    );
}

#[tokio::test]
async fn count_uses_the_same_filters_as_the_list() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 1).await;
    mount_list(&server, json!([]), 0).await;

    let client = client_for(&server);
    let params = InvoiceListParams {
        list: ListParams::default().with_search("CUST-0001"),
        status: Some("Overdue".to_string()),
        ..InvoiceListParams::default()
    };
    let page = client.fetch_invoices(&params).await.unwrap();
    assert!(page.is_empty());

    for key in ["filters", "or_filters"] {
        assert_eq!(
            query_param_of(&server, LIST_PATH, key).await,
            query_param_of(&server, COUNT_PATH, key).await,
            "{key} differs between list and count"
        );
    }
}

#[tokio::test]
async fn superseded_list_result_is_dropped() {
    const LEADS: ListSpec = ListSpec {
        doctype: "Lead",
        fields: &["name"],
        search_fields: &["lead_name"],
        order_by: "modified desc",
    };

    let server = MockServer::start().await;
    mount_token(&server, "tok", 1).await;
    // The first search ("ac") answers late, after the user typed "acme".
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("or_filters", r#"[["lead_name","like","%ac%"]]"#))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": [{"name": "CRM-LEAD-0001"}]}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("or_filters", r#"[["lead_name","like","%acme%"]]"#))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": [{"name": "CRM-LEAD-0002"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(COUNT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": 1})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    // Prime the token so both lists go straight to the list endpoints.
    client.token().await;

    let guard = LatestOnly::new();
    let first = guard.run(client.fetch_list::<Value>(
        &LEADS,
        Filters::new(),
        Some("ac"),
        Page::default(),
    ));
    let second = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        guard
            .run(client.fetch_list::<Value>(&LEADS, Filters::new(), Some("acme"), Page::default()))
            .await
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_none());
    let page = second.unwrap().unwrap();
    assert_eq!(page.data, vec![json!({"name": "CRM-LEAD-0002"})]);
}
