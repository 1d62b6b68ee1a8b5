//! Sales invoices (`Sales Invoice`).

use chrono::NaiveDate;
use desk_types::{Doctype, Filters, ListPage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{ListParams, date_range, to_doc};
use crate::{DeskClient, DeskError, ListSpec};

pub const INVOICES: ListSpec = ListSpec {
    doctype: "Sales Invoice",
    fields: &[
        "name",
        "customer",
        "customer_name",
        "posting_date",
        "due_date",
        "grand_total",
        "outstanding_amount",
        "currency",
        "status",
    ],
    search_fields: &["name", "customer", "customer_name"],
    order_by: "posting_date desc",
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default)]
    pub name: String,
    pub customer: Option<String>,
    pub customer_name: Option<String>,
    pub posting_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub grand_total: Option<f64>,
    pub outstanding_amount: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceItem {
    pub item_code: String,
    pub qty: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewInvoice {
    pub customer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub items: Vec<InvoiceItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceListParams {
    pub list: ListParams,
    pub status: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

fn doctype() -> Doctype {
    INVOICES.doctype()
}

impl DeskClient {
    pub async fn fetch_invoices(
        &self,
        params: &InvoiceListParams,
    ) -> Result<ListPage<Invoice>, DeskError> {
        let filters = Filters::new()
            .with_eq_if_set("status", params.status.as_deref())
            .with_date_range("posting_date", date_range(params.from, params.to));
        self.fetch_list(&INVOICES, filters, params.list.search(), params.list.page)
            .await
    }

    pub async fn get_invoice(&self, name: &str) -> Result<Invoice, DeskError> {
        self.get(&doctype(), name).await
    }

    pub async fn create_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, DeskError> {
        if invoice.customer.trim().is_empty() {
            return Err(DeskError::InvalidArgument("customer is required".to_string()));
        }
        if invoice.items.is_empty() {
            return Err(DeskError::InvalidArgument(
                "an invoice needs at least one item".to_string(),
            ));
        }
        self.insert(&doctype(), to_doc(invoice)?).await
    }

    /// Record full payment of the outstanding amount.
    pub async fn mark_invoice_paid(&self, name: &str) -> Result<Invoice, DeskError> {
        self.rpc("invoices.mark_paid", json!({ "invoice": name }))
            .await
    }
}
