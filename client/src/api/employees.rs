//! Employee directory (`Employee`).

use chrono::NaiveDate;
use desk_types::{Doctype, Filters, ListPage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ListParams;
use crate::{DeskClient, DeskError, ListSpec};

pub const EMPLOYEES: ListSpec = ListSpec {
    doctype: "Employee",
    fields: &[
        "name",
        "employee_name",
        "designation",
        "department",
        "company_email",
        "cell_number",
        "date_of_joining",
        "status",
    ],
    search_fields: &["employee_name", "name", "designation"],
    order_by: "employee_name asc",
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub name: String,
    pub employee_name: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub company_email: Option<String>,
    pub cell_number: Option<String>,
    pub date_of_joining: Option<NaiveDate>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeListParams {
    pub list: ListParams,
    pub department: Option<String>,
    pub status: Option<String>,
}

impl DeskClient {
    pub async fn fetch_employees(
        &self,
        params: &EmployeeListParams,
    ) -> Result<ListPage<Employee>, DeskError> {
        let filters = Filters::new()
            .with_eq_if_set("department", params.department.as_deref())
            .with_eq_if_set("status", params.status.as_deref());
        self.fetch_list(&EMPLOYEES, filters, params.list.search(), params.list.page)
            .await
    }

    pub async fn get_employee(&self, name: &str) -> Result<Employee, DeskError> {
        self.get(&EMPLOYEES.doctype(), name).await
    }
}
