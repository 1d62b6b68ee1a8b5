//! Fixed assets (`Asset`).

use chrono::NaiveDate;
use desk_types::{Doctype, Filters, ListPage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ListParams, to_doc};
use crate::{DeskClient, DeskError, ListSpec};

pub const ASSETS: ListSpec = ListSpec {
    doctype: "Asset",
    fields: &[
        "name",
        "asset_name",
        "item_code",
        "location",
        "custodian",
        "purchase_date",
        "gross_purchase_amount",
        "status",
    ],
    search_fields: &["asset_name", "item_code", "location"],
    order_by: "modified desc",
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub name: String,
    pub asset_name: Option<String>,
    pub item_code: Option<String>,
    pub location: Option<String>,
    pub custodian: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub gross_purchase_amount: Option<f64>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewAsset {
    pub asset_name: String,
    pub item_code: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_purchase_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetListParams {
    pub list: ListParams,
    pub status: Option<String>,
    pub location: Option<String>,
}

fn doctype() -> Doctype {
    ASSETS.doctype()
}

impl DeskClient {
    pub async fn fetch_assets(
        &self,
        params: &AssetListParams,
    ) -> Result<ListPage<Asset>, DeskError> {
        let filters = Filters::new()
            .with_eq_if_set("status", params.status.as_deref())
            .with_eq_if_set("location", params.location.as_deref());
        self.fetch_list(&ASSETS, filters, params.list.search(), params.list.page)
            .await
    }

    pub async fn get_asset(&self, name: &str) -> Result<Asset, DeskError> {
        self.get(&doctype(), name).await
    }

    pub async fn create_asset(&self, asset: &NewAsset) -> Result<Asset, DeskError> {
        self.insert(&doctype(), to_doc(asset)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{mount_list, received_param};
    use crate::test_support::client_with_token;
    use desk_types::Page;
    use serde_json::json;
    use wiremock::MockServer;

    const LIST_PATH: &str = "/api/method/frappe.client.get_list";

    #[tokio::test]
    async fn status_location_and_search_filters() {
        let server = MockServer::start().await;
        mount_list(
            &server,
            json!([{
                "name": "AST-0007",
                "asset_name": "Laptop",
                "purchase_date": "2023-09-14",
                "gross_purchase_amount": 1450.0,
            }]),
            12,
        )
        .await;

        let client = client_with_token(&server.uri(), "tok");
        let params = AssetListParams {
            list: ListParams::new(Page::new(2, 5).unwrap()).with_search("lap"),
            status: Some("In Maintenance".to_string()),
            location: Some("Pune".to_string()),
        };
        let page = client.fetch_assets(&params).await.unwrap();

        assert_eq!(page.total, 12);
        assert_eq!(page.data[0].asset_name.as_deref(), Some("Laptop"));
        assert_eq!(page.data[0].purchase_date, NaiveDate::from_ymd_opt(2023, 9, 14));
        assert_eq!(
            received_param(&server, LIST_PATH, "filters").await.as_deref(),
            Some(r#"[["status","=","In Maintenance"],["location","=","Pune"]]"#)
        );
        assert_eq!(
            received_param(&server, LIST_PATH, "or_filters").await.as_deref(),
            Some(
                r#"[["asset_name","like","%lap%"],["item_code","like","%lap%"],["location","like","%lap%"]]"#
            )
        );
        assert_eq!(
            received_param(&server, LIST_PATH, "limit_start").await.as_deref(),
            Some("5")
        );
    }

    #[tokio::test]
    async fn unfiltered_list_sends_empty_filters() {
        let server = MockServer::start().await;
        mount_list(&server, json!([]), 0).await;

        let client = client_with_token(&server.uri(), "tok");
        let page = client.fetch_assets(&AssetListParams::default()).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(
            received_param(&server, LIST_PATH, "filters").await.as_deref(),
            Some("[]")
        );
    }
}
