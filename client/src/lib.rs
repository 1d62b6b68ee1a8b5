//! Session-aware client for a Frappe-style document API.
//!
//! # Architecture
//!
//! - [`DeskClient`] - cheap-to-clone handle owning the HTTP client and session cookies
//! - [`csrf`] - token lookup/refresh and the single-retry request wrapper every call goes through
//! - [`resource`] - the generic document API (list, count, get, insert, set_value, delete, RPC)
//! - [`list`] - paginated list + count fetches and a latest-result guard
//! - [`api`] - typed domain modules (leads, invoices, payroll, ...) over the generic API
//!
//! # Request lifecycle
//!
//! Every request carries the current anti-forgery token. When the backend
//! rejects a request because the token is stale, the wrapper fetches a fresh
//! token and replays the request once. A second stale-token rejection expires
//! the session: the backend logout endpoint is called, all local session state
//! is cleared, the registered [`SessionExpiryObserver`] is notified, and the
//! call fails with [`DeskError::SessionExpired`].
//!
//! # Error Handling
//!
//! All operations return [`DeskError`]. Non-OK responses become
//! [`DeskError::Api`] carrying the most specific message the backend supplied.

pub mod api;
pub mod csrf;
mod error;
pub mod list;
pub mod resource;
mod response;
pub mod session;

pub use desk_config::Settings;
pub use desk_types;
pub use error::DeskError;
pub use list::{LatestOnly, ListSpec, Ticket};
pub use response::{ApiResponse, FilePart, MultipartBody, RequestBody};
pub use session::{SessionCookies, SessionExpiryObserver};

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 16;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Handle to one backend session. Clones share cookies and connection pool.
#[derive(Clone)]
pub struct DeskClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    cookies: Arc<SessionCookies>,
    settings: Settings,
    /// Set once the session has been expired; cleared by a successful login.
    expired: AtomicBool,
    observer: Option<Arc<dyn SessionExpiryObserver>>,
}

impl std::fmt::Debug for DeskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeskClient")
            .field("settings", &self.inner.settings)
            .field("cookies", &self.inner.cookies)
            .finish_non_exhaustive()
    }
}

fn base_client_builder(
    settings: &Settings,
    cookies: Arc<SessionCookies>,
) -> reqwest::ClientBuilder {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    default_headers.insert(
        "X-Requested-With",
        HeaderValue::from_static("XMLHttpRequest"),
    );

    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(settings.timeout))
        .timeout(settings.timeout)
        .redirect(Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .user_agent(concat!("desk/", env!("CARGO_PKG_VERSION")))
        .cookie_provider(cookies)
        .default_headers(default_headers)
}

impl DeskClient {
    pub fn new(settings: Settings) -> Result<Self, DeskError> {
        Self::build(settings, None)
    }

    /// Client that notifies `observer` when the session expires.
    pub fn with_observer(
        settings: Settings,
        observer: impl SessionExpiryObserver + 'static,
    ) -> Result<Self, DeskError> {
        Self::build(settings, Some(Arc::new(observer)))
    }

    fn build(
        settings: Settings,
        observer: Option<Arc<dyn SessionExpiryObserver>>,
    ) -> Result<Self, DeskError> {
        let cookies = Arc::new(SessionCookies::new());
        if let Some(sid) = &settings.sid {
            cookies.set(session::SID_COOKIE, sid.clone());
        }
        let http = base_client_builder(&settings, Arc::clone(&cookies)).build()?;

        tracing::debug!(base_url = %settings.base_url, "Desk client initialized");
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                cookies,
                settings,
                expired: AtomicBool::new(false),
                observer,
            }),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    #[must_use]
    pub fn cookies(&self) -> &SessionCookies {
        &self.inner.cookies
    }

    /// Append a configured endpoint path (`/api/method/logout`) to the base URL.
    ///
    /// The endpoint is relative to the base even with a leading `/`, so a
    /// backend mounted under a sub-path keeps its prefix.
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url, DeskError> {
        let (path, query) = endpoint.split_once('?').unwrap_or((endpoint, ""));
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(DeskError::InvalidArgument(format!(
                "endpoint `{endpoint}` has no path"
            )));
        }
        let query: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let query: Vec<(&str, String)> =
            query.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        self.build_url(&segments, &query)
    }

    /// `<base>/api/method/<method>?<query>`
    pub(crate) fn method_url(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<Url, DeskError> {
        if method.trim().is_empty() {
            return Err(DeskError::InvalidArgument(
                "method name must not be empty".to_string(),
            ));
        }
        self.build_url(&["api", "method", method.trim()], query)
    }

    /// `<base>/api/resource/<doctype>[/<name>]`
    pub(crate) fn resource_url(
        &self,
        doctype: &str,
        name: Option<&str>,
    ) -> Result<Url, DeskError> {
        match name {
            Some(name) if name.trim().is_empty() => Err(DeskError::InvalidArgument(
                "document name must not be empty".to_string(),
            )),
            Some(name) => self.build_url(&["api", "resource", doctype, name], &[]),
            None => self.build_url(&["api", "resource", doctype], &[]),
        }
    }

    fn build_url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, DeskError> {
        let mut url = self.inner.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| DeskError::InvalidArgument("base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Fully-qualified custom RPC method under the configured namespace.
    #[must_use]
    pub fn rpc_method(&self, function: &str) -> String {
        format!(
            "{}.{}",
            self.inner.settings.rpc_namespace,
            function.trim_matches('.')
        )
    }
}
