//! Authenticated HTTP client with transparent session refresh.
//!
//! # Architecture
//!
//! ```text
//! caller ─▶ typed helpers (get/post/put/delete)
//!              │
//!              ▼
//!           AuthClient::send ──401──▶ RefreshCoordinator ──▶ POST /api/auth/refresh
//!              │   ▲                        │
//!              │   └──── retry once ◀───────┘ true
//!              │
//!              └── refresh false ──▶ Navigator::redirect_to_login + ApiError::SessionExpired
//! ```
//!
//! - [`AuthClient::send`]: raw executor. Returns whatever the server said,
//!   except that a first 401 triggers one refresh and one retry.
//! - [`AuthClient::get`] and friends: JSON helpers that turn non-2xx into
//!   [`ApiError::RequestFailed`].
//! - [`RefreshCoordinator`]: single-flight refresh shared by every request of
//!   one client.
//!
//! # Credentials
//!
//! The session credential lives in HttpOnly cookies managed by the server.
//! Every client owns a cookie jar that is attached to every request, the
//! refresh call included; this crate never reads or writes the cookie values.

mod error;
mod executor;
mod navigator;
mod refresh;
mod request;
mod typed;

pub use error::ApiError;
pub use navigator::{LoggingNavigator, Navigator, login_redirect_location};
pub use refresh::RefreshCoordinator;
pub use request::RequestDescriptor;

pub use pacer_types;
pub use reqwest::{Method, Response, StatusCode};

use std::sync::Arc;
use std::time::Duration;

use pacer_config::PacerConfig;
use pacer_types::AuthEndpoints;
use reqwest::cookie::Jar;
use url::Url;

const USER_AGENT: &str = concat!("pacer/", env!("CARGO_PKG_VERSION"));

const TCP_KEEPALIVE_SECS: u64 = 60;

const POOL_MAX_IDLE_PER_HOST: usize = 16;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Upper bound on error-body text kept in [`ApiError::RequestFailed`].
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Transport settings for the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Permit plain-HTTP targets. Off by default.
    pub allow_insecure_http: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            allow_insecure_http: false,
        }
    }
}

impl TransportOptions {
    #[must_use]
    pub fn from_config(config: &PacerConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.api.timeout_secs),
            connect_timeout: Duration::from_secs(config.api.connect_timeout_secs),
            allow_insecure_http: config.api.allow_insecure_http,
        }
    }
}

fn build_http_client(
    options: &TransportOptions,
    jar: Arc<Jar>,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .cookie_provider(jar)
        .connect_timeout(options.connect_timeout)
        .timeout(options.timeout)
        // 3xx are returned to the caller untouched.
        .redirect(reqwest::redirect::Policy::none())
        .https_only(!options.allow_insecure_http)
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .user_agent(USER_AGENT)
        .build()
}

/// HTTP client for the Pacer API with cookie-based session handling.
///
/// Cheap to share behind an `Arc`; all state is internally synchronized.
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
    endpoints: AuthEndpoints,
    refresh: RefreshCoordinator,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("base_url", &self.base_url.as_str())
            .field("endpoints", &self.endpoints)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    pub fn new(
        base_url: Url,
        endpoints: AuthEndpoints,
        options: &TransportOptions,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = build_http_client(options, Arc::new(Jar::default())).map_err(ApiError::Build)?;
        let refresh_url = resolve(&base_url, &endpoints.refresh)?;

        Ok(Self {
            refresh: RefreshCoordinator::new(http.clone(), refresh_url),
            http,
            base_url,
            endpoints,
            navigator,
        })
    }

    /// Build a client from validated configuration.
    pub fn from_config(
        config: &PacerConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        Self::new(
            config.base_url()?,
            config.auth.clone(),
            &TransportOptions::from_config(config),
            navigator,
        )
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    #[must_use]
    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub(crate) fn resolve(&self, target: &str) -> Result<Url, ApiError> {
        resolve(&self.base_url, target)
    }
}

fn resolve(base: &Url, target: &str) -> Result<Url, ApiError> {
    base.join(target).map_err(|source| ApiError::InvalidUrl {
        target: target.to_string(),
        source,
    })
}
