//! Redirect-to-login collaborator.

use std::sync::{Mutex, PoisonError};

use url::form_urlencoded;

/// Bridge to whatever owns navigation (a router, a UI shell, a CLI).
///
/// The request layer calls [`Navigator::redirect_to_login`] exactly once per
/// request whose session could not be recovered.
pub trait Navigator: Send + Sync {
    /// Path the user is currently on; used as the post-login return target.
    fn current_path(&self) -> String;

    /// Send the user to the login page, returning to `return_to` afterwards.
    fn redirect_to_login(&self, return_to: &str);
}

/// `<login_page>?redirectTo=<return_to>` with the return path percent-encoded.
#[must_use]
pub fn login_redirect_location(login_page: &str, return_to: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(return_to.as_bytes()).collect();
    let separator = if login_page.contains('?') { '&' } else { '?' };
    format!("{login_page}{separator}redirectTo={encoded}")
}

/// Navigator for headless use: tracks the current path set by the caller and
/// logs the login location instead of navigating.
#[derive(Debug)]
pub struct LoggingNavigator {
    login_page: String,
    current: Mutex<String>,
}

impl LoggingNavigator {
    #[must_use]
    pub fn new(login_page: impl Into<String>) -> Self {
        Self {
            login_page: login_page.into(),
            current: Mutex::new("/".to_string()),
        }
    }

    pub fn set_current_path(&self, path: impl Into<String>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = path.into();
    }
}

impl Navigator for LoggingNavigator {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn redirect_to_login(&self, return_to: &str) {
        let location = login_redirect_location(&self.login_page, return_to);
        tracing::warn!(location = %location, "Sign-in required");
    }
}
