//! Payroll (`Salary Slip`).

use chrono::NaiveDate;
use desk_types::{Filter, FilterOp, Filters, ListPage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{ListParams, check_range, date_param};
use crate::{DeskClient, DeskError, ListSpec};

pub const SALARY_SLIPS: ListSpec = ListSpec {
    doctype: "Salary Slip",
    fields: &[
        "name",
        "employee",
        "employee_name",
        "start_date",
        "end_date",
        "gross_pay",
        "total_deduction",
        "net_pay",
        "status",
    ],
    search_fields: &["employee_name", "employee"],
    order_by: "start_date desc",
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalarySlip {
    #[serde(default)]
    pub name: String,
    pub employee: Option<String>,
    pub employee_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub gross_pay: Option<f64>,
    pub total_deduction: Option<f64>,
    pub net_pay: Option<f64>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pay period: slips starting on or after `start` and ending on or before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PayPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DeskError> {
        check_range(start, end)?;
        Ok(Self { start, end })
    }

    fn filters(self) -> [Filter; 2] {
        [
            Filter::new("start_date", FilterOp::Gte, date_param(self.start)),
            Filter::new("end_date", FilterOp::Lte, date_param(self.end)),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalarySlipListParams {
    pub list: ListParams,
    pub status: Option<String>,
    pub period: Option<PayPeriod>,
}

impl DeskClient {
    pub async fn fetch_salary_slips(
        &self,
        params: &SalarySlipListParams,
    ) -> Result<ListPage<SalarySlip>, DeskError> {
        let mut filters = Filters::new().with_eq_if_set("status", params.status.as_deref());
        if let Some(period) = params.period {
            for filter in period.filters() {
                filters.push(filter);
            }
        }
        self.fetch_list(&SALARY_SLIPS, filters, params.list.search(), params.list.page)
            .await
    }

    /// Create draft slips for every active employee in `period`.
    ///
    /// Returns whatever summary the backend reports (typically the created names).
    pub async fn generate_salary_slips(&self, period: PayPeriod) -> Result<Value, DeskError> {
        self.rpc(
            "payroll.generate_slips",
            json!({
                "start_date": date_param(period.start),
                "end_date": date_param(period.end),
            }),
        )
        .await
    }
}
