//! Dashboard summary reports, computed server-side by custom RPC methods.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{check_range, date_param};
use crate::{DeskClient, DeskError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_sales: Option<f64>,
    pub invoice_count: Option<u64>,
    pub outstanding: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub total_claimed: Option<f64>,
    pub total_approved: Option<f64>,
    pub pending_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub present: Option<u64>,
    pub absent: Option<u64>,
    pub on_leave: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeskClient {
    pub async fn sales_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<SalesSummary, DeskError> {
        self.report("reports.sales_summary", from, to).await
    }

    pub async fn expense_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ExpenseSummary, DeskError> {
        self.report("reports.expense_summary", from, to).await
    }

    pub async fn attendance_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<AttendanceSummary, DeskError> {
        self.report("reports.attendance_summary", from, to).await
    }

    async fn report<T: serde::de::DeserializeOwned>(
        &self,
        function: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<T, DeskError> {
        check_range(from, to)?;
        let query = [("from_date", date_param(from)), ("to_date", date_param(to))];
        self.rpc_get(function, &query).await
    }
}
