//! Expense claims (`Expense Claim`) and their approval flow.

use chrono::NaiveDate;
use desk_types::{Doctype, Filters, ListPage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{ListParams, to_doc};
use crate::{DeskClient, DeskError, FilePart, ListSpec};

pub const EXPENSES: ListSpec = ListSpec {
    doctype: "Expense Claim",
    fields: &[
        "name",
        "employee",
        "employee_name",
        "posting_date",
        "total_claimed_amount",
        "approval_status",
        "status",
        "remark",
    ],
    search_fields: &["name", "employee_name", "remark"],
    order_by: "posting_date desc",
};

pub const APPROVED: &str = "Approved";
pub const REJECTED: &str = "Rejected";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseClaim {
    #[serde(default)]
    pub name: String,
    pub employee: Option<String>,
    pub employee_name: Option<String>,
    pub posting_date: Option<NaiveDate>,
    pub total_claimed_amount: Option<f64>,
    pub approval_status: Option<String>,
    pub status: Option<String>,
    pub remark: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseLine {
    pub expense_type: String,
    pub amount: f64,
    pub expense_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewExpenseClaim {
    pub employee: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_approver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub expenses: Vec<ExpenseLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseListParams {
    pub list: ListParams,
    pub approval_status: Option<String>,
    pub employee: Option<String>,
}

fn doctype() -> Doctype {
    EXPENSES.doctype()
}

impl DeskClient {
    pub async fn fetch_expenses(
        &self,
        params: &ExpenseListParams,
    ) -> Result<ListPage<ExpenseClaim>, DeskError> {
        let filters = Filters::new()
            .with_eq_if_set("approval_status", params.approval_status.as_deref())
            .with_eq_if_set("employee", params.employee.as_deref());
        self.fetch_list(&EXPENSES, filters, params.list.search(), params.list.page)
            .await
    }

    pub async fn create_expense(&self, claim: &NewExpenseClaim) -> Result<ExpenseClaim, DeskError> {
        if claim.expenses.is_empty() {
            return Err(DeskError::InvalidArgument(
                "an expense claim needs at least one line".to_string(),
            ));
        }
        self.insert(&doctype(), to_doc(claim)?).await
    }

    pub async fn approve_expense(&self, name: &str) -> Result<ExpenseClaim, DeskError> {
        self.set_value(&doctype(), name, "approval_status", json!(APPROVED))
            .await
    }

    /// Reject a claim, recording `reason` in the remark when given.
    pub async fn reject_expense(
        &self,
        name: &str,
        reason: Option<&str>,
    ) -> Result<ExpenseClaim, DeskError> {
        let mut values = Map::new();
        values.insert("approval_status".to_string(), json!(REJECTED));
        if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
            values.insert("remark".to_string(), json!(reason));
        }
        self.set_values(&doctype(), name, values).await
    }

    /// Attach a receipt to a claim. Receipts are always private files.
    pub async fn attach_receipt(&self, name: &str, receipt: FilePart) -> Result<Value, DeskError> {
        self.upload_file(&doctype(), name, receipt, true).await
    }
}
