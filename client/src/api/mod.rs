//! Typed views over the generic document API, one module per dashboard area.
//!
//! Records name only the fields the dashboard reads or writes; everything else
//! the backend returns is kept in each record's `extra` map.

pub mod assets;
pub mod attendance;
pub mod calls;
pub mod chat;
pub mod deals;
pub mod employees;
pub mod expenses;
pub mod invoices;
pub mod leads;
pub mod meetings;
pub mod payroll;
pub mod reports;

use chrono::NaiveDate;
use desk_types::Page;
use serde::Serialize;
use serde_json::Value;

use crate::DeskError;

/// Page and search-box state shared by every list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: Page,
    pub search: Option<String>,
}

impl ListParams {
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self { page, search: None }
    }

    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub(crate) fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }
}

/// Inclusive date range; `None` when either end is missing.
#[must_use]
pub fn date_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Option<(NaiveDate, NaiveDate)> {
    from.zip(to)
}

pub(crate) fn check_range(from: NaiveDate, to: NaiveDate) -> Result<(), DeskError> {
    if from > to {
        return Err(DeskError::InvalidArgument(format!(
            "start date {from} is after end date {to}"
        )));
    }
    Ok(())
}

pub(crate) fn to_doc<T: Serialize>(value: &T) -> Result<Value, DeskError> {
    serde_json::to_value(value)
        .map_err(|e| DeskError::InvalidArgument(format!("document is not serializable: {e}")))
}

pub(crate) fn date_param(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
