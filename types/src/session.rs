//! Session identity and UI-facing authentication state.

use serde::{Deserialize, Serialize};

use crate::{DeviceId, LoginCredentials};

/// Display name used when the profile carries no usable name or email.
const FALLBACK_NAME: &str = "User";

/// The signed-in user as shown by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

/// Profile fields returned by the login and "who am I" endpoints.
///
/// Every field is optional; the backend returns different subsets from each
/// endpoint and [`Identity`] fills the gaps. Anything else in the body
/// (such as `userId`) is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
}

impl Identity {
    /// Minimal identity after a successful login.
    ///
    /// The submitted email backs up a response that omits it, and its local
    /// part stands in for a missing display name.
    #[must_use]
    pub fn from_login(payload: ProfilePayload, submitted_email: &str) -> Self {
        let email = non_blank(payload.email).unwrap_or_else(|| submitted_email.to_string());
        let name = non_blank(payload.name)
            .or_else(|| non_blank(payload.username))
            .or_else(|| local_part(submitted_email).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_NAME.to_string());

        Self {
            name,
            email,
            avatar: non_blank(payload.avatar),
            email_verified: payload.email_verified,
        }
    }

    /// Identity for a session discovered through the "who am I" endpoint.
    #[must_use]
    pub fn from_profile(payload: ProfilePayload) -> Self {
        let email = non_blank(payload.email).unwrap_or_default();
        let name = non_blank(payload.name)
            .or_else(|| non_blank(payload.username))
            .or_else(|| local_part(&email).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_NAME.to_string());

        Self {
            name,
            email,
            avatar: non_blank(payload.avatar),
            email_verified: payload.email_verified,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn local_part(email: &str) -> Option<&str> {
    email.split('@').next().filter(|part| !part.is_empty())
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    device_id: &'a DeviceId,
}

impl<'a> LoginRequest<'a> {
    #[must_use]
    pub fn new(credentials: &'a LoginCredentials, device_id: &'a DeviceId) -> Self {
        Self {
            email: credentials.email(),
            password: credentials.password(),
            device_id,
        }
    }
}

/// Authentication state observed by the UI.
///
/// `is_authenticated` is derived from the identity, so the two can never
/// disagree. Setting the identity (to a value or to absent) always ends the
/// loading phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    identity: Option<Identity>,
    is_loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

impl SessionState {
    /// State before the first session bootstrap resolves.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            identity: None,
            is_loading: true,
        }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn set_identity(&mut self, identity: Option<Identity>) {
        self.identity = identity;
        self.is_loading = false;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }
}
