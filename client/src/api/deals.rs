//! Sales pipeline deals (`Opportunity`).

use chrono::NaiveDate;
use desk_types::{Doctype, Filters, ListPage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{ListParams, to_doc};
use crate::{DeskClient, DeskError, ListSpec};

pub const DEALS: ListSpec = ListSpec {
    doctype: "Opportunity",
    fields: &[
        "name",
        "opportunity_from",
        "party_name",
        "customer_name",
        "opportunity_amount",
        "sales_stage",
        "status",
        "expected_closing",
        "modified",
    ],
    search_fields: &["opportunity_from", "party_name", "customer_name"],
    order_by: "modified desc",
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    #[serde(default)]
    pub name: String,
    pub opportunity_from: Option<String>,
    pub party_name: Option<String>,
    pub customer_name: Option<String>,
    pub opportunity_amount: Option<f64>,
    pub sales_stage: Option<String>,
    pub status: Option<String>,
    pub expected_closing: Option<NaiveDate>,
    pub modified: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewDeal {
    /// `Lead` or `Customer`.
    pub opportunity_from: String,
    pub party_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opportunity_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_closing: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealListParams {
    pub list: ListParams,
    pub stage: Option<String>,
    pub status: Option<String>,
}

fn doctype() -> Doctype {
    DEALS.doctype()
}

impl DeskClient {
    pub async fn fetch_deals(&self, params: &DealListParams) -> Result<ListPage<Deal>, DeskError> {
        let filters = Filters::new()
            .with_eq_if_set("sales_stage", params.stage.as_deref())
            .with_eq_if_set("status", params.status.as_deref());
        self.fetch_list(&DEALS, filters, params.list.search(), params.list.page)
            .await
    }

    pub async fn get_deal(&self, name: &str) -> Result<Deal, DeskError> {
        self.get(&doctype(), name).await
    }

    pub async fn create_deal(&self, deal: &NewDeal) -> Result<Deal, DeskError> {
        if deal.party_name.trim().is_empty() {
            return Err(DeskError::InvalidArgument("party is required".to_string()));
        }
        self.insert(&doctype(), to_doc(deal)?).await
    }

    pub async fn set_deal_stage(&self, name: &str, stage: &str) -> Result<Deal, DeskError> {
        self.set_value(&doctype(), name, "sales_stage", json!(stage))
            .await
    }
}
