//! Session cookie store.
//!
//! The backend keeps the session (`sid`) and the anti-forgery token
//! (`csrf_token`) in cookies. [`SessionCookies`] is installed as the reqwest
//! cookie provider so cookies flow automatically, and it is also readable by
//! name the way the dashboard reads `document.cookie`.
//!
//! The client talks to a single backend, so cookies are not scoped by domain
//! or path.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use cookie::Cookie;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::json;

use crate::{DeskClient, DeskError, RequestBody};

pub const SID_COOKIE: &str = "sid";
pub const CSRF_COOKIE: &str = "csrf_token";
pub const USER_COOKIE: &str = "user_id";

/// Value the backend assigns to `sid` (and the logged user) for anonymous sessions.
const GUEST_SID: &str = "Guest";

const LOGIN_METHOD: &str = "login";
const LOGGED_USER_METHOD: &str = "frappe.auth.get_logged_user";

/// Called once when the session is declared expired (the page-redirect hook).
pub trait SessionExpiryObserver: Send + Sync {
    fn session_expired(&self);
}

impl<F> SessionExpiryObserver for F
where
    F: Fn() + Send + Sync,
{
    fn session_expired(&self) {
        self();
    }
}

#[derive(Default)]
pub struct SessionCookies {
    jar: RwLock<BTreeMap<String, String>>,
}

// Cookie values are credentials; only names are shown.
impl std::fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("SessionCookies")
            .field("names", &jar.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SessionCookies {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        jar.get(name).filter(|v| !v.is_empty()).cloned()
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut jar = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        jar.insert(name.into(), value.into());
    }

    pub fn remove(&self, name: &str) {
        let mut jar = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        jar.remove(name);
    }

    pub fn clear(&self) {
        let mut jar = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        jar.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jar
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Whether a non-guest session cookie is present.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.get(SID_COOKIE).is_some_and(|sid| sid != GUEST_SID)
    }

    fn apply_set_cookie(&self, raw: &str, now: DateTime<Utc>) {
        let cookie = match Cookie::parse(raw) {
            Ok(cookie) => cookie,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed Set-Cookie header");
                return;
            }
        };
        let value = cookie.value().trim_matches('"');
        if value.is_empty() || is_expired(&cookie, now) {
            self.remove(cookie.name());
        } else {
            self.set(cookie.name(), value);
        }
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &Url) {
        let now = Utc::now();
        for header in cookie_headers {
            if let Ok(raw) = header.to_str() {
                self.apply_set_cookie(raw, now);
            }
        }
    }

    fn cookies(&self, _url: &Url) -> Option<HeaderValue> {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        if jar.is_empty() {
            return None;
        }
        let header = jar
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }
}

/// Body of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub home_page: Option<String>,
}

impl DeskClient {
    /// Password login. On success the backend sets `sid` and the session is live again.
    pub async fn login(&self, usr: &str, pwd: &str) -> Result<LoginResponse, DeskError> {
        if usr.trim().is_empty() {
            return Err(DeskError::InvalidArgument("user must not be empty".to_string()));
        }
        let url = self.method_url(LOGIN_METHOD, &[])?;
        let body = RequestBody::Json(json!({ "usr": usr.trim(), "pwd": pwd }));
        let response = self
            .send(Method::POST, url, &body)
            .await?
            .error_for_status("Invalid login credentials")?
            .json::<LoginResponse>(LOGIN_METHOD)?;

        self.reset_session_expiry();
        tracing::info!("Logged in");
        Ok(response)
    }

    /// End the backend session and forget all local session state.
    pub async fn logout(&self) -> Result<(), DeskError> {
        let url = self.endpoint_url(&self.settings().logout_endpoint)?;
        let result = self
            .send(Method::GET, url, &RequestBody::Empty)
            .await
            .and_then(|response| response.error_for_status("Failed to log out"));
        self.cookies().clear();
        result.map(|_| ())
    }

    /// The logged-in user id, or `None` for a guest session.
    pub async fn current_user(&self) -> Result<Option<String>, DeskError> {
        let user: String = self.call_get(LOGGED_USER_METHOD, &[]).await?;
        Ok((!user.is_empty() && user != GUEST_SID).then_some(user))
    }
}

/// `Max-Age` wins over `Expires` when both are present.
fn is_expired(cookie: &Cookie<'_>, now: DateTime<Utc>) -> bool {
    if let Some(max_age) = cookie.max_age() {
        return max_age.whole_seconds() <= 0;
    }
    cookie
        .expires_datetime()
        .is_some_and(|expires| expires.unix_timestamp() <= now.timestamp())
}
