//! Anti-forgery token handling and the single-retry request wrapper.
//!
//! # Token lookup
//!
//! The token is read from the `csrf_token` cookie. When it is absent, one GET
//! to the configured token endpoint fetches a fresh one from (in order) the
//! `X-Frappe-CSRF-Token` response header, a `csrf_token` cookie set by that
//! response, or a `{"message": "<token>"}` body. A failed fetch yields an empty
//! token and the request goes out without one.
//!
//! # Retry policy
//!
//! - At most one retry, and only for a stale-token rejection
//! - Exactly one token refresh before that retry
//! - No backoff, no idempotency key: the backend rejected the first attempt
//!   before executing it, so the replay is the only execution
//! - A second stale-token rejection expires the session
//!
//! Stale-token detection is governed by [`CsrfDetection`]. A 2xx response is
//! never a rejection, and an error body that is not a JSON object is passed
//! back unchanged.

use std::sync::atomic::Ordering;

use desk_types::{CsrfDetection, Envelope, ServerErrorPayload};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Url};

use crate::session::CSRF_COOKIE;
use crate::{ApiResponse, DeskClient, DeskError, RequestBody};

pub const CSRF_HEADER: &str = "X-Frappe-CSRF-Token";

/// Whether `response` is a stale-token rejection under `detection`.
#[must_use]
pub fn is_stale_token_response(response: &ApiResponse, detection: CsrfDetection) -> bool {
    if response.is_success() {
        return false;
    }
    match ServerErrorPayload::parse(response.body()) {
        Some(payload) => detection.matches(&payload),
        None => false,
    }
}

fn token_from_header(value: Option<&HeaderValue>) -> Option<String> {
    value
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

impl DeskClient {
    /// Current anti-forgery token: cached cookie first, else one fetch.
    ///
    /// Returns an empty string when no token can be obtained.
    pub async fn token(&self) -> String {
        if let Some(token) = self.cookies().get(CSRF_COOKIE) {
            return token;
        }
        self.fetch_token().await
    }

    /// Drop the cached token and fetch a new one.
    pub async fn refresh_token(&self) -> String {
        self.cookies().remove(CSRF_COOKIE);
        self.fetch_token().await
    }

    async fn fetch_token(&self) -> String {
        let url = match self.endpoint_url(&self.settings().csrf_endpoint) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid CSRF token endpoint");
                return String::new();
            }
        };

        let response = match self.inner.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "CSRF token fetch failed");
                return String::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "CSRF token endpoint returned an error");
            return String::new();
        }

        // Header first; the cookie store has already absorbed any Set-Cookie.
        let token = token_from_header(response.headers().get(CSRF_HEADER))
            .or_else(|| self.cookies().get(CSRF_COOKIE));
        let token = match token {
            Some(token) => token,
            None => match response.json::<Envelope<String>>().await {
                Ok(envelope) if !envelope.message.trim().is_empty() => {
                    envelope.message.trim().to_string()
                }
                _ => {
                    tracing::warn!("CSRF token endpoint returned no token");
                    return String::new();
                }
            },
        };

        self.cookies().set(CSRF_COOKIE, token.clone());
        tracing::info!("CSRF token refreshed");
        token
    }

    /// Send a request through the token wrapper.
    ///
    /// Returns the response as-is (including non-OK responses) unless the
    /// request was rejected for a stale token twice, which expires the session.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        body: &RequestBody,
    ) -> Result<ApiResponse, DeskError> {
        let detection = self.settings().csrf_detection;

        let token = self.token().await;
        let first = self.attempt(&method, &url, body, &token, 0).await?;
        if !is_stale_token_response(&first, detection) {
            return Ok(first);
        }

        tracing::info!(
            method = %method,
            path = url.path(),
            "CSRF token rejected; refreshing and retrying once"
        );
        let token = self.refresh_token().await;
        let second = self.attempt(&method, &url, body, &token, 1).await?;
        if !is_stale_token_response(&second, detection) {
            return Ok(second);
        }

        self.expire_session().await;
        Err(DeskError::SessionExpired)
    }

    async fn attempt(
        &self,
        method: &Method,
        url: &Url,
        body: &RequestBody,
        token: &str,
        retry_count: u32,
    ) -> Result<ApiResponse, DeskError> {
        let mut builder = self.inner.http.request(method.clone(), url.clone());
        if !token.is_empty() {
            builder = builder.header(CSRF_HEADER, token);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(serde_json::to_vec(value).map_err(|e| {
                    DeskError::InvalidArgument(format!("request body is not serializable: {e}"))
                })?),
            // The multipart encoder owns Content-Type (it carries the boundary).
            RequestBody::Multipart(form) => builder.multipart(form.to_form()?),
        };

        tracing::debug!(method = %method, path = url.path(), retry_count, "Sending request");
        let response = builder.send().await?;
        ApiResponse::read(response).await
    }

    /// Declare the session dead: logout, clear local state, notify the observer.
    ///
    /// Runs at most once until the next successful login, no matter how many
    /// requests fail concurrently.
    pub(crate) async fn expire_session(&self) {
        if self.inner.expired.swap(true, Ordering::SeqCst) {
            tracing::debug!("Session already expired");
            return;
        }

        tracing::info!("Session expired; logging out and clearing local session state");
        self.call_logout_endpoint().await;
        self.cookies().clear();
        if let Some(observer) = &self.inner.observer {
            observer.session_expired();
        }
    }

    /// Best-effort GET to the logout endpoint (GET bypasses the token check).
    pub(crate) async fn call_logout_endpoint(&self) {
        let url = match self.endpoint_url(&self.settings().logout_endpoint) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid logout endpoint");
                return;
            }
        };
        match self.inner.http.get(url).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(status = %response.status(), "Logout endpoint returned an error");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Logout request failed"),
        }
    }

    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        self.inner.expired.load(Ordering::SeqCst)
    }

    pub(crate) fn reset_session_expiry(&self) {
        self.inner.expired.store(false, Ordering::SeqCst);
    }
}
