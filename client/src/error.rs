use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by the authenticated request layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Network-level failure (connect, DNS, timeout, body read). Never retried.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The credential could not be refreshed. The redirect collaborator has
    /// already been told to send the user to the login page.
    #[error("session expired; sign in again (return to {return_to})")]
    SessionExpired { return_to: String },

    /// Final response was not a success status.
    #[error("request failed with status {status}{}", format_detail(detail.as_deref()))]
    RequestFailed {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid request target {target:?}: {source}")]
    InvalidUrl {
        target: String,
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error(transparent)]
    Config(#[from] pacer_config::ConfigError),
}

fn format_detail(detail: Option<&str>) -> String {
    detail.map(|d| format!(": {d}")).unwrap_or_default()
}

impl ApiError {
    /// HTTP status of a `RequestFailed`, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }
}
