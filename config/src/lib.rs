//! Configuration loading for Pacer.
//!
//! Settings live in `~/.pacer/config.toml` (or the file named by
//! `PACER_CONFIG`). Every key is optional; a missing file yields the
//! defaults. String values may reference environment variables as
//! `${NAME}`.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use pacer_types::AuthEndpoints;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://app.aipacemaker.app";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const CONFIG_PATH_ENV: &str = "PACER_CONFIG";
const BASE_URL_ENV: &str = "PACER_BASE_URL";

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
    #[error("invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PacerConfig {
    pub api: ApiConfig,
    pub auth: AuthEndpoints,
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Total request timeout enforced by the transport.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Permit plain `http://` base URLs (local development, test servers).
    pub allow_insecure_http: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            allow_insecure_http: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Where the device id is stored. Defaults to `~/.pacer/device-id`.
    pub id_path: Option<PathBuf>,
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// `~/rest` resolved against the home directory; other paths unchanged.
fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

impl PacerConfig {
    /// Load the user's configuration, applying environment overrides.
    ///
    /// A missing config file is not an error; defaults are used instead.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            Some(path) => {
                tracing::debug!(path = %path.display(), "No config file; using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a specific config file. No environment overrides are applied.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        config.expand_env_refs();
        Ok(config)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    fn expand_env_refs(&mut self) {
        self.api.base_url = expand_env_vars(&self.api.base_url);
        for endpoint in [
            &mut self.auth.login,
            &mut self.auth.logout,
            &mut self.auth.refresh,
            &mut self.auth.me,
            &mut self.auth.login_page,
        ] {
            *endpoint = expand_env_vars(endpoint);
        }
        if let Some(path) = self.device.id_path.as_mut()
            && let Some(raw) = path.to_str()
        {
            *path = expand_home(&expand_env_vars(raw));
        }
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(base_url = %base_url, "Base URL overridden from environment");
            self.api.base_url = base_url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url()?;
        if url.scheme() == "http" && !self.api.allow_insecure_http {
            return Err(ConfigError::Invalid {
                field: "api.base_url",
                message: "plain http requires api.allow_insecure_http = true".into(),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "api.timeout_secs",
                message: "must be greater than zero".into(),
            });
        }
        if self.api.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "api.connect_timeout_secs",
                message: "must be greater than zero".into(),
            });
        }
        for (field, value) in [
            ("auth.login", &self.auth.login),
            ("auth.logout", &self.auth.logout),
            ("auth.refresh", &self.auth.refresh),
            ("auth.me", &self.auth.me),
            ("auth.login_page", &self.auth.login_page),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    message: "must not be empty".into(),
                });
            }
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.api.base_url.trim()).map_err(|e| ConfigError::Invalid {
            field: "api.base_url",
            message: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid {
                field: "api.base_url",
                message: format!("unsupported scheme {other:?}"),
            }),
        }
    }

    #[must_use]
    pub fn device_id_path(&self) -> Option<PathBuf> {
        self.device
            .id_path
            .clone()
            .or_else(|| pacer_home().map(|home| home.join("device-id")))
    }
}

/// `~/.pacer`, the directory holding config, logs and the device id.
#[must_use]
pub fn pacer_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pacer"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    pacer_home().map(|home| home.join("config.toml"))
}
