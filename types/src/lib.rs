//! Core domain types for Desk.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here describes the wire vocabulary of the backend's generic document API:
//! doctype names, filter triples, paginated list queries, and response envelopes.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod envelope;
mod filter;
mod query;

pub use envelope::{DataEnvelope, Envelope, GENERIC_ERROR_MESSAGE, ServerErrorPayload};
pub use filter::{Filter, FilterOp, FilterOpError, Filters};
pub use query::{ListPage, ListQuery, Page, PageError};

/// Exception marker the backend uses for a stale or missing anti-forgery token.
pub const CSRF_ERROR_MARKER: &str = "CSRFTokenError";

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Doctype
// ============================================================================

/// Name of a backend document schema ("Lead", "Sales Invoice", ...).
///
/// Guaranteed non-empty after trimming. The stored value is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Doctype(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("doctype name must not be empty")]
pub struct EmptyDoctypeError;

impl Doctype {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyDoctypeError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(EmptyDoctypeError);
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Doctype for a compile-time constant name.
    ///
    /// Panics on an empty name, which is a programming error.
    #[must_use]
    pub fn from_static(value: &'static str) -> Self {
        assert!(!value.trim().is_empty(), "Doctype must not be empty");
        Self(value.trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Doctype {
    type Error = EmptyDoctypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Doctype {
    type Error = EmptyDoctypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Doctype> for String {
    fn from(value: Doctype) -> Self {
        value.0
    }
}

impl AsRef<str> for Doctype {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Doctype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// CSRF Detection
// ============================================================================

/// How an error response is recognized as a stale-token rejection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsrfDetection {
    /// Only `exc_type == "CSRFTokenError"` counts.
    Structured,
    /// Structured match, or the marker anywhere in the exception text or traceback.
    #[default]
    Lenient,
}

impl CsrfDetection {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "structured" | "strict" => Some(Self::Structured),
            "lenient" | "heuristic" => Some(Self::Lenient),
            _ => None,
        }
    }

    /// Whether `payload` is a stale-token rejection under this policy.
    #[must_use]
    pub fn matches(self, payload: &ServerErrorPayload) -> bool {
        let structured = payload.exc_type.as_deref() == Some(CSRF_ERROR_MARKER);
        match self {
            Self::Structured => structured,
            Self::Lenient => structured || payload.mentions(CSRF_ERROR_MARKER),
        }
    }
}
