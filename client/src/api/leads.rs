//! CRM leads (`Lead`).

use desk_types::{Doctype, Filters, ListPage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{ListParams, to_doc};
use crate::{DeskClient, DeskError, ListSpec};

pub const LEADS: ListSpec = ListSpec {
    doctype: "Lead",
    fields: &[
        "name",
        "lead_name",
        "company_name",
        "email",
        "mobile_no",
        "status",
        "source",
        "lead_owner",
        "modified",
    ],
    search_fields: &["lead_name", "email", "company_name"],
    order_by: "modified desc",
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default)]
    pub name: String,
    pub lead_name: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub mobile_no: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub lead_owner: Option<String>,
    pub modified: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewLead {
    pub lead_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadListParams {
    pub list: ListParams,
    pub status: Option<String>,
    pub source: Option<String>,
}

impl LeadListParams {
    fn filters(&self) -> Filters {
        Filters::new()
            .with_eq_if_set("status", self.status.as_deref())
            .with_eq_if_set("source", self.source.as_deref())
    }
}

fn doctype() -> Doctype {
    LEADS.doctype()
}

impl DeskClient {
    pub async fn fetch_leads(&self, params: &LeadListParams) -> Result<ListPage<Lead>, DeskError> {
        self.fetch_list(&LEADS, params.filters(), params.list.search(), params.list.page)
            .await
    }

    pub async fn get_lead(&self, name: &str) -> Result<Lead, DeskError> {
        self.get(&doctype(), name).await
    }

    pub async fn create_lead(&self, lead: &NewLead) -> Result<Lead, DeskError> {
        if lead.lead_name.trim().is_empty() {
            return Err(DeskError::InvalidArgument(
                "lead name is required".to_string(),
            ));
        }
        self.insert(&doctype(), to_doc(lead)?).await
    }

    pub async fn set_lead_status(&self, name: &str, status: &str) -> Result<Lead, DeskError> {
        self.set_value(&doctype(), name, "status", json!(status)).await
    }

    pub async fn delete_lead(&self, name: &str) -> Result<(), DeskError> {
        self.delete(&doctype(), name).await
    }

    /// Convert a lead into a deal; returns the new deal's name.
    pub async fn convert_lead_to_deal(&self, name: &str) -> Result<String, DeskError> {
        self.rpc("leads.convert_to_deal", json!({ "lead": name })).await
    }
}
