//! Core domain types for Pacer.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the client.

mod endpoints;
mod ids;
mod navigation;
mod session;

pub use endpoints::AuthEndpoints;
pub use ids::{DeviceId, EmptyDeviceIdError};
pub use navigation::{NAV_ITEMS, NavItem, NavPriority, mobile_nav_items};
pub use session::{Identity, LoginRequest, ProfilePayload, SessionState};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// NonEmpty String Types
// ============================================================================

/// A string guaranteed to be non-empty (after trimming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

#[derive(Debug, Error)]
#[error("value must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::ops::Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// ============================================================================
// Login Credentials
// ============================================================================

/// Email and password submitted to the login endpoint.
///
/// Both fields are validated non-empty at construction so a blank form never
/// reaches the network.
#[derive(Clone)]
pub struct LoginCredentials {
    email: NonEmptyString,
    password: NonEmptyString,
}

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("email is required")]
    MissingEmail,
    #[error("password is required")]
    MissingPassword,
}

impl LoginCredentials {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let email = NonEmptyString::new(email.into().trim().to_string())
            .map_err(|_| CredentialsError::MissingEmail)?;
        let password =
            NonEmptyString::new(password).map_err(|_| CredentialsError::MissingPassword)?;
        Ok(Self { email, password })
    }

    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

// Manual Debug impl to prevent leaking passwords in logs.
impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email.as_str())
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
