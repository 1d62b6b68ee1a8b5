//! Configuration loading for Desk.
//!
//! The file lives at `~/.desk/config.toml` unless `DESK_CONFIG` points elsewhere.
//! Every field is optional; [`Settings`] resolves the file plus environment
//! overrides into concrete values the client can use directly.

mod resolved;

pub use resolved::{
    DEFAULT_CSRF_ENDPOINT, DEFAULT_LOGOUT_ENDPOINT, DEFAULT_RPC_NAMESPACE, DEFAULT_TIMEOUT_SECS,
    Settings,
};

use std::path::{Path, PathBuf};
use std::{env, fs};

use desk_types::CsrfDetection;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "DESK_CONFIG";
pub const BASE_URL_ENV_VAR: &str = "DESK_BASE_URL";
pub const SID_ENV_VAR: &str = "DESK_SID";

#[derive(Debug, Default, Deserialize)]
pub struct DeskConfig {
    pub server: Option<ServerConfig>,
    pub session: Option<SessionConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Module prefix for custom RPC methods (`frontend_api`).
    pub rpc_namespace: Option<String>,
    pub csrf_endpoint: Option<String>,
    pub logout_endpoint: Option<String>,
    pub csrf_detection: Option<CsrfDetection>,
}

#[derive(Default, Deserialize)]
pub struct SessionConfig {
    /// Session cookie value; `${VAR}` references are expanded.
    pub sid: Option<String>,
}

// Manual Debug impl to keep the session cookie out of logs.
impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("sid", &self.sid.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => Some(path),
            Self::Invalid { .. } => None,
        }
    }
}

/// Replace `${VAR}` with `lookup("VAR")` (empty when unset).
///
/// An unterminated `${` is copied through unchanged.
fn expand_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 2..start + 2 + len];
        if !name.is_empty() {
            out.push_str(&lookup(name).unwrap_or_default());
        }
        rest = &rest[start + 2 + len + 1..];
    }

    out.push_str(rest);
    out
}

impl DeskConfig {
    /// A missing file is `Ok(None)`; an unreadable or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        Self::parse(&content, path).map(Some)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

/// Default config location: `$DESK_CONFIG`, else `~/.desk/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".desk").join("config.toml"))
}
