//! Paginated list queries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Doctype, Filters};

/// A 1-based page of `page_size` rows.
///
/// Deserialization goes through [`Page::new`], so a decoded page obeys the
/// same bounds as a constructed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPage")]
pub struct Page {
    page: u32,
    page_size: u32,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

const fn first_page() -> u32 {
    1
}

const fn default_page_size() -> u32 {
    Page::DEFAULT_PAGE_SIZE
}

impl TryFrom<RawPage> for Page {
    type Error = PageError;

    fn try_from(raw: RawPage) -> Result<Self, Self::Error> {
        Self::new(raw.page, raw.page_size)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("page size must be at least 1")]
    ZeroPageSize,
    #[error("page size {0} exceeds the maximum of {max}", max = Page::MAX_PAGE_SIZE)]
    PageSizeTooLarge(u32),
}

impl Page {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 500;

    /// Page numbers below 1 are clamped to the first page.
    pub fn new(page: u32, page_size: u32) -> Result<Self, PageError> {
        if page_size == 0 {
            return Err(PageError::ZeroPageSize);
        }
        if page_size > Self::MAX_PAGE_SIZE {
            return Err(PageError::PageSizeTooLarge(page_size));
        }
        Ok(Self {
            page: page.max(1),
            page_size,
        })
    }

    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(self) -> u32 {
        self.page_size
    }

    /// Offset of the first row: `(page - 1) * page_size`.
    #[must_use]
    pub const fn limit_start(self) -> u64 {
        (self.page as u64).saturating_sub(1) * self.page_size as u64
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            page_size: self.page_size,
        }
    }

    /// Number of pages needed to show `total` rows (at least one).
    #[must_use]
    pub const fn page_count(self, total: u64) -> u64 {
        let pages = total.div_ceil(self.page_size as u64);
        if pages == 0 { 1 } else { pages }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// A list request against one doctype.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    doctype: Doctype,
    fields: Vec<String>,
    filters: Filters,
    or_filters: Filters,
    order_by: Option<String>,
    page: Page,
}

impl ListQuery {
    #[must_use]
    pub fn new(doctype: Doctype) -> Self {
        Self {
            doctype,
            fields: Vec::new(),
            filters: Filters::new(),
            or_filters: Filters::new(),
            order_by: None,
            page: Page::default(),
        }
    }

    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_or_filters(mut self, or_filters: Filters) -> Self {
        self.or_filters = or_filters;
        self
    }

    #[must_use]
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        let order_by = order_by.into();
        self.order_by = if order_by.trim().is_empty() {
            None
        } else {
            Some(order_by)
        };
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn doctype(&self) -> &Doctype {
        &self.doctype
    }

    #[must_use]
    pub fn page(&self) -> Page {
        self.page
    }

    #[must_use]
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    #[must_use]
    pub fn or_filters(&self) -> &Filters {
        &self.or_filters
    }

    /// Query parameters for `frappe.client.get_list`.
    ///
    /// `filters` and `or_filters` are always present, as `[]` when empty.
    /// Without explicit fields the backend default (`name` only) is requested.
    #[must_use]
    pub fn list_params(&self) -> Vec<(&'static str, String)> {
        let fields = if self.fields.is_empty() {
            String::from(r#"["name"]"#)
        } else {
            serde_json::to_string(&self.fields).unwrap_or_else(|_| String::from(r#"["name"]"#))
        };

        let mut params = vec![
            ("doctype", self.doctype.as_str().to_string()),
            ("fields", fields),
            ("filters", self.filters.to_json()),
            ("or_filters", self.or_filters.to_json()),
        ];
        if let Some(order_by) = &self.order_by {
            params.push(("order_by", order_by.clone()));
        }
        params.push(("limit_start", self.page.limit_start().to_string()));
        params.push(("limit_page_length", self.page.page_size().to_string()));
        params
    }

    /// Query parameters for `frappe.client.get_count`, sharing the list's filter set.
    ///
    /// A stock `get_count` accepts no `or_filters` and ignores it, so a
    /// searched total only matches the searched rows on backends whose count
    /// method honors it.
    #[must_use]
    pub fn count_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("doctype", self.doctype.as_str().to_string()),
            ("filters", self.filters.to_json()),
            ("or_filters", self.or_filters.to_json()),
        ]
    }
}

/// One page of rows plus the total row count for the same filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    pub total: u64,
}

impl<T> ListPage<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ListPage<U> {
        ListPage {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
