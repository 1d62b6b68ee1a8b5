//! Telephony call log (`Call Log`).

use desk_types::{Filters, ListPage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ListParams;
use crate::{DeskClient, DeskError, ListSpec};

pub const CALLS: ListSpec = ListSpec {
    doctype: "Call Log",
    fields: &[
        "name",
        "from",
        "to",
        "type",
        "status",
        "duration",
        "customer",
        "start_time",
    ],
    search_fields: &["from", "to", "customer"],
    order_by: "start_time desc",
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallLog {
    #[serde(default)]
    pub name: String,
    pub from: Option<String>,
    pub to: Option<String>,
    /// `Incoming` or `Outgoing`.
    #[serde(rename = "type")]
    pub direction: Option<String>,
    pub status: Option<String>,
    /// Seconds.
    pub duration: Option<f64>,
    pub customer: Option<String>,
    pub start_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallListParams {
    pub list: ListParams,
    pub direction: Option<String>,
    pub status: Option<String>,
}

impl DeskClient {
    pub async fn fetch_calls(
        &self,
        params: &CallListParams,
    ) -> Result<ListPage<CallLog>, DeskError> {
        let filters = Filters::new()
            .with_eq_if_set("type", params.direction.as_deref())
            .with_eq_if_set("status", params.status.as_deref());
        self.fetch_list(&CALLS, filters, params.list.search(), params.list.page)
            .await
    }

    pub async fn get_call(&self, name: &str) -> Result<CallLog, DeskError> {
        self.get(&CALLS.doctype(), name).await
    }
}
