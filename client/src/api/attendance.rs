//! Daily attendance (`Attendance`) and check-in/out.

use chrono::NaiveDate;
use desk_types::{Filters, ListPage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{ListParams, date_range};
use crate::{DeskClient, DeskError, ListSpec};

pub const ATTENDANCE: ListSpec = ListSpec {
    doctype: "Attendance",
    fields: &[
        "name",
        "employee",
        "employee_name",
        "attendance_date",
        "status",
        "in_time",
        "out_time",
    ],
    search_fields: &["employee_name", "employee"],
    order_by: "attendance_date desc",
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(default)]
    pub name: String,
    pub employee: Option<String>,
    pub employee_name: Option<String>,
    pub attendance_date: Option<NaiveDate>,
    /// `Present`, `Absent`, `On Leave`, `Half Day`, `Work From Home`.
    pub status: Option<String>,
    pub in_time: Option<String>,
    pub out_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceListParams {
    pub list: ListParams,
    pub employee: Option<String>,
    pub status: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DeskClient {
    pub async fn fetch_attendance(
        &self,
        params: &AttendanceListParams,
    ) -> Result<ListPage<AttendanceRecord>, DeskError> {
        let filters = Filters::new()
            .with_eq_if_set("employee", params.employee.as_deref())
            .with_eq_if_set("status", params.status.as_deref())
            .with_date_range("attendance_date", date_range(params.from, params.to));
        self.fetch_list(&ATTENDANCE, filters, params.list.search(), params.list.page)
            .await
    }

    pub async fn check_in(&self, employee: &str) -> Result<AttendanceRecord, DeskError> {
        self.rpc("attendance.check_in", json!({ "employee": employee }))
            .await
    }

    pub async fn check_out(&self, employee: &str) -> Result<AttendanceRecord, DeskError> {
        self.rpc("attendance.check_out", json!({ "employee": employee }))
            .await
    }
}
