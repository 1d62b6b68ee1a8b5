//! Config resolution: file values, then environment overrides, then defaults.
//!
//! [`Settings`] has no `Option` left except the session cookie, so the client
//! never has to re-derive defaults.

use std::time::Duration;

use desk_types::CsrfDetection;
use url::Url;

use crate::{BASE_URL_ENV_VAR, ConfigError, DeskConfig, SID_ENV_VAR, expand_with};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RPC_NAMESPACE: &str = "frontend_api";
pub const DEFAULT_CSRF_ENDPOINT: &str = "/api/method/frontend_api.auth.get_csrf_token";
pub const DEFAULT_LOGOUT_ENDPOINT: &str = "/api/method/logout";

#[derive(Clone)]
pub struct Settings {
    pub base_url: Url,
    pub timeout: Duration,
    pub rpc_namespace: String,
    pub csrf_endpoint: String,
    pub logout_endpoint: String,
    pub csrf_detection: CsrfDetection,
    pub sid: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("rpc_namespace", &self.rpc_namespace)
            .field("csrf_endpoint", &self.csrf_endpoint)
            .field("logout_endpoint", &self.logout_endpoint)
            .field("csrf_detection", &self.csrf_detection)
            .field("sid", &self.sid.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Settings {
    /// Defaults for `base_url`, for library callers that build settings in code.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            rpc_namespace: DEFAULT_RPC_NAMESPACE.to_string(),
            csrf_endpoint: DEFAULT_CSRF_ENDPOINT.to_string(),
            logout_endpoint: DEFAULT_LOGOUT_ENDPOINT.to_string(),
            csrf_detection: CsrfDetection::default(),
            sid: None,
        })
    }

    /// Resolve against the process environment.
    pub fn resolve(config: Option<&DeskConfig>) -> Result<Self, ConfigError> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    pub fn resolve_with(
        config: Option<&DeskConfig>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let server = config.and_then(|c| c.server.as_ref());
        let session = config.and_then(|c| c.session.as_ref());
        let expand = |raw: &str| expand_with(raw, &env);

        let base_url = env(BASE_URL_ENV_VAR)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| server.and_then(|s| s.base_url.as_deref()).map(expand))
            .ok_or_else(|| ConfigError::Invalid {
                field: "server.base_url",
                reason: format!("not set (config file or {BASE_URL_ENV_VAR})"),
            })?;

        let mut settings = Self::new(&base_url)?;

        if let Some(server) = server {
            if let Some(secs) = server.timeout_secs {
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        field: "server.timeout_secs",
                        reason: "must be greater than zero".to_string(),
                    });
                }
                settings.timeout = Duration::from_secs(secs);
            }
            if let Some(ns) = non_blank(server.rpc_namespace.as_deref()) {
                settings.rpc_namespace = ns.trim_matches('.').to_string();
            }
            if let Some(endpoint) = non_blank(server.csrf_endpoint.as_deref()) {
                settings.csrf_endpoint = endpoint.to_string();
            }
            if let Some(endpoint) = non_blank(server.logout_endpoint.as_deref()) {
                settings.logout_endpoint = endpoint.to_string();
            }
            if let Some(detection) = server.csrf_detection {
                settings.csrf_detection = detection;
            }
        }

        settings.sid = env(SID_ENV_VAR)
            .or_else(|| session.and_then(|s| s.sid.as_deref()).map(expand))
            .map(|sid| sid.trim().to_string())
            .filter(|sid| !sid.is_empty());

        Ok(settings)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        field: "server.base_url",
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            field: "server.base_url",
            reason: format!("unsupported scheme `{}`", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(ConfigError::Invalid {
            field: "server.base_url",
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}
