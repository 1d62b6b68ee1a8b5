//! Client error type.
//!
//! Every failure ends up as one human-readable string at the UI boundary
//! ([`DeskError::user_message`]); the variants keep enough structure for callers
//! that want to branch on status or session state.

use desk_types::{GENERIC_ERROR_MESSAGE, ServerErrorPayload};
use reqwest::StatusCode;
use thiserror::Error;

use crate::response::ApiResponse;

/// Longest raw body excerpt carried in an error message.
const MAX_ERROR_EXCERPT_BYTES: usize = 512;

#[derive(Debug, Error)]
pub enum DeskError {
    /// Connection, TLS, timeout, or body read failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-OK response from the backend.
    #[error("{message}")]
    Api {
        status: StatusCode,
        exc_type: Option<String>,
        message: String,
    },

    /// Token refresh and retry both hit a stale-token rejection; local session state is gone.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// 2xx response whose body does not match the expected envelope.
    #[error("unexpected response from {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Response body larger than the client accepts.
    #[error("response body exceeded {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl DeskError {
    /// Build an `Api` error from a non-OK response.
    ///
    /// Message precedence: `_server_messages`, `exception`, `message`, then
    /// `fallback`, then the generic text.
    pub(crate) fn from_response(response: &ApiResponse, fallback: &str) -> Self {
        let payload = ServerErrorPayload::parse(response.body());
        let exc_type = payload.as_ref().and_then(|p| p.exc_type.clone());
        let message = payload
            .as_ref()
            .and_then(ServerErrorPayload::user_message)
            .or_else(|| non_blank(fallback))
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());

        if payload.is_none() {
            tracing::warn!(
                status = %response.status(),
                body = %excerpt(response.body()),
                "Error response without a JSON payload"
            );
        }

        Self::Api {
            status: response.status(),
            exc_type,
            message,
        }
    }

    /// The string a UI would show in a toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::SessionExpired => self.to_string(),
            Self::InvalidArgument(reason) => reason.clone(),
            Self::Transport(_)
            | Self::Decode { .. }
            | Self::InvalidUrl(_)
            | Self::BodyTooLarge { .. } => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn excerpt(body: &[u8]) -> String {
    if body.len() <= MAX_ERROR_EXCERPT_BYTES {
        return String::from_utf8_lossy(body).into_owned();
    }
    let text = String::from_utf8_lossy(&body[..MAX_ERROR_EXCERPT_BYTES]);
    format!("{text}...(truncated)")
}
