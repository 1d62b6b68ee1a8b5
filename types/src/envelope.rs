//! Response envelopes and server error payloads.
//!
//! Successful RPC calls answer `{"message": <payload>}`; the REST resource
//! endpoints answer `{"data": <doc>}`. Failures carry some subset of
//! `exc_type`, `exception`, `exc`, `_server_messages` and `message`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback text when no field of an error payload is usable.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Error body returned by the backend on a non-OK response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    /// Serialized traceback list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exc: Option<String>,
    /// JSON-encoded array of JSON-encoded `{message, title, indicator}` objects.
    #[serde(
        default,
        rename = "_server_messages",
        skip_serializing_if = "Option::is_none"
    )]
    pub server_messages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
}

impl ServerErrorPayload {
    /// Parse an error body. Returns `None` unless the body is a JSON object.
    #[must_use]
    pub fn parse(body: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(body).ok()?;
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Decoded `_server_messages` entries, in order.
    ///
    /// Each entry is itself JSON text; entries that are not objects with a
    /// `message` field are used verbatim.
    #[must_use]
    pub fn server_messages(&self) -> Vec<String> {
        let Some(raw) = self.server_messages.as_deref() else {
            return Vec::new();
        };
        let Ok(entries) = serde_json::from_str::<Vec<Value>>(raw) else {
            return Vec::new();
        };

        entries
            .into_iter()
            .filter_map(|entry| {
                let text = match entry {
                    Value::String(s) => match serde_json::from_str::<Value>(&s) {
                        Ok(inner) => inner
                            .get("message")
                            .and_then(Value::as_str)
                            .map_or(s.clone(), ToString::to_string),
                        Err(_) => s,
                    },
                    Value::Object(map) => map.get("message")?.as_str()?.to_string(),
                    _ => return None,
                };
                let text = text.trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .collect()
    }

    /// `exception` text with its `module.ExceptionName: ` prefix removed.
    #[must_use]
    pub fn exception_message(&self) -> Option<String> {
        let raw = self.exception.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        let text = match raw.split_once(": ") {
            Some((head, tail)) if is_exception_path(head) && !tail.trim().is_empty() => tail.trim(),
            _ => raw,
        };
        Some(text.to_string())
    }

    fn plain_message(&self) -> Option<String> {
        match self.message.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    /// Human-readable message: `_server_messages`, then `exception`, then `message`.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        let messages = self.server_messages();
        if !messages.is_empty() {
            return Some(messages.join("\n"));
        }
        self.exception_message().or_else(|| self.plain_message())
    }

    /// Whether the exception type, exception text, or traceback mentions `marker`.
    #[must_use]
    pub fn mentions(&self, marker: &str) -> bool {
        [&self.exc_type, &self.exception, &self.exc]
            .into_iter()
            .flatten()
            .any(|text| text.contains(marker))
    }
}

/// `frappe.exceptions.ValidationError`, `CSRFTokenError`, ...
fn is_exception_path(head: &str) -> bool {
    !head.is_empty()
        && !head.contains(char::is_whitespace)
        && (head.contains('.') || head.ends_with("Error"))
}
