//! Filter triples for the document list API.
//!
//! The backend accepts filters as a JSON array of `[field, operator, value]`
//! triples. `filters` entries are ANDed together; `or_filters` entries are ORed,
//! which is how free-text search across several columns is expressed.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Comparison operator of a filter triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "not like")]
    NotLike,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "is")]
    Is,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown filter operator: {0}")]
pub struct FilterOpError(pub String);

impl FilterOp {
    const ALL: [Self; 12] = [
        Self::Eq,
        Self::NotEq,
        Self::Gt,
        Self::Lt,
        Self::Gte,
        Self::Lte,
        Self::Like,
        Self::NotLike,
        Self::In,
        Self::NotIn,
        Self::Between,
        Self::Is,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Like => "like",
            Self::NotLike => "not like",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Between => "between",
            Self::Is => "is",
        }
    }

    /// Parse the backend spelling of an operator (case-insensitive).
    pub fn parse(raw: &str) -> Result<Self, FilterOpError> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| FilterOpError(raw.to_string()))
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `[field, operator, value]` triple.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "(String, FilterOp, Value)")]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// `field like %term%`
    pub fn contains(field: impl Into<String>, term: &str) -> Self {
        Self::new(field, FilterOp::Like, format!("%{term}%"))
    }

    /// Inclusive date range, serialized as `["YYYY-MM-DD", "YYYY-MM-DD"]`.
    pub fn between_dates(field: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
        let range = vec![
            Value::String(from.format("%Y-%m-%d").to_string()),
            Value::String(to.format("%Y-%m-%d").to_string()),
        ];
        Self::new(field, FilterOp::Between, Value::Array(range))
    }
}

impl From<(String, FilterOp, Value)> for Filter {
    fn from((field, op, value): (String, FilterOp, Value)) -> Self {
        Self { field, op, value }
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.field, self.op, &self.value).serialize(serializer)
    }
}

/// Ordered list of filter triples.
///
/// Always serializes to a JSON array; an empty set is `[]`, never `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(Vec<Filter>);

impl Filters {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// OR-triples matching `term` as a substring of any of `fields`.
    ///
    /// A blank term produces no filters at all, so an empty search box does
    /// not narrow the result set.
    #[must_use]
    pub fn search(fields: &[&str], term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() {
            return Self::new();
        }
        Self(
            fields
                .iter()
                .map(|field| Filter::contains(*field, term))
                .collect(),
        )
    }

    pub fn push(&mut self, filter: Filter) {
        self.0.push(filter);
    }

    #[must_use]
    pub fn with(mut self, filter: Filter) -> Self {
        self.0.push(filter);
        self
    }

    /// Add `field = value` only when a non-blank value is present.
    ///
    /// Mirrors the dashboard's optional dropdown filters, where "All" means
    /// no constraint rather than an empty-string match.
    #[must_use]
    pub fn with_eq_if_set(self, field: &str, value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => self.with(Filter::eq(field, v)),
            _ => self,
        }
    }

    #[must_use]
    pub fn with_date_range(self, field: &str, range: Option<(NaiveDate, NaiveDate)>) -> Self {
        match range {
            Some((from, to)) => self.with(Filter::between_dates(field, from, to)),
            None => self,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.0.iter()
    }

    /// JSON text for the `filters` / `or_filters` query parameter.
    #[must_use]
    pub fn to_json(&self) -> String {
        // Strings, operators and JSON values always serialize.
        serde_json::to_string(&self.0).unwrap_or_else(|_| String::from("[]"))
    }
}

impl From<Vec<Filter>> for Filters {
    fn from(value: Vec<Filter>) -> Self {
        Self(value)
    }
}

impl FromIterator<Filter> for Filters {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Filters {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
