//! Paginated list fetches shared by every domain module.
//!
//! A page is two concurrent calls with the same filter set: the rows
//! (`get_list`) and the total (`get_count`). Either failing fails the page.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use desk_types::{Doctype, Filters, ListPage, ListQuery, Page};
use serde::de::DeserializeOwned;

use crate::{DeskClient, DeskError};

/// Static description of a list view: which doctype, which columns, which
/// fields the search box matches, and the default sort.
#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    pub doctype: &'static str,
    pub fields: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub order_by: &'static str,
}

impl ListSpec {
    #[must_use]
    pub fn doctype(&self) -> Doctype {
        Doctype::from_static(self.doctype)
    }

    /// Query for one page. A blank `search` adds no OR filters.
    #[must_use]
    pub fn query(&self, filters: Filters, search: Option<&str>, page: Page) -> ListQuery {
        let or_filters = search
            .map(|term| Filters::search(self.search_fields, term))
            .unwrap_or_default();
        ListQuery::new(self.doctype())
            .with_fields(self.fields.iter().copied())
            .with_filters(filters)
            .with_or_filters(or_filters)
            .with_order_by(self.order_by)
            .with_page(page)
    }
}

impl DeskClient {
    /// Rows and total for `query`, fetched concurrently.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        query: &ListQuery,
    ) -> Result<ListPage<T>, DeskError> {
        let count_params = query.count_params();
        let (data, total) = tokio::try_join!(
            self.list::<T>(query),
            self.count_with(query.doctype(), &count_params),
        )?;
        tracing::debug!(
            doctype = %query.doctype(),
            page = query.page().page(),
            rows = data.len(),
            total,
            "Fetched list page"
        );
        Ok(ListPage { data, total })
    }

    /// [`fetch_page`](Self::fetch_page) for a [`ListSpec`].
    pub async fn fetch_list<T: DeserializeOwned>(
        &self,
        spec: &ListSpec,
        filters: Filters,
        search: Option<&str>,
        page: Page,
    ) -> Result<ListPage<T>, DeskError> {
        self.fetch_page(&spec.query(filters, search, page)).await
    }
}

/// Drops results of superseded requests.
///
/// Each [`begin`](Self::begin) supersedes every earlier ticket, so a slow
/// response for an old search can never overwrite a newer one.
#[derive(Debug, Default)]
pub struct LatestOnly {
    generation: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl LatestOnly {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Run `fut` under a fresh ticket; `None` if a newer run started meanwhile.
    pub async fn run<F, T>(&self, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.begin();
        let output = fut.await;
        if self.is_current(ticket) {
            Some(output)
        } else {
            tracing::debug!("Discarding superseded result");
            None
        }
    }
}
