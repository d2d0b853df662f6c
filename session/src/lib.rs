//! Observable sign-in state.
//!
//! [`Session`] is the only writer of [`SessionState`]. Readers either poll the
//! accessors or hold a [`watch::Receiver`] from [`Session::subscribe`], which
//! sees every change.
//!
//! Session bootstrap ([`Session::fetch_session`]) and logout talk to the
//! backend without the refresh-and-retry cycle: a 401 there simply means
//! "not signed in" and must not bounce the user to the login page.

use std::sync::Arc;

use pacer_client::{ApiError, AuthClient, RequestDescriptor, StatusCode, login_redirect_location};
use pacer_types::{DeviceId, Identity, LoginCredentials, LoginRequest, ProfilePayload, SessionState};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("sign-in failed: {0}")]
    Login(#[source] ApiError),
}

impl SessionError {
    /// HTTP status the backend answered with, if the request got that far.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Login(err) => err.status(),
        }
    }
}

/// Where to send a visitor who needs to sign in first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    /// Path the visitor asked for; restored after login.
    pub return_to: String,
    /// `<login page>?redirectTo=<return_to>`.
    pub location: String,
}

pub struct Session {
    client: Arc<AuthClient>,
    device_id: DeviceId,
    state: watch::Sender<SessionState>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("device_id", &self.device_id)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A session in the initial state: no identity, loading.
    #[must_use]
    pub fn new(client: Arc<AuthClient>, device_id: DeviceId) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self {
            client,
            device_id,
            state,
        }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<AuthClient> {
        &self.client
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Receiver that is notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Sign in and record the resulting identity.
    ///
    /// On failure the loading flag is cleared and the previous identity is
    /// kept.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Identity, SessionError> {
        self.set_loading(true);

        let request = LoginRequest::new(credentials, &self.device_id);
        let result = self
            .client
            .post::<_, Option<ProfilePayload>>(&self.client.endpoints().login, &request)
            .await;

        match result {
            Ok(payload) => {
                let identity =
                    Identity::from_login(payload.unwrap_or_default(), credentials.email());
                tracing::info!(email = %identity.email, "Signed in");
                self.set_identity(Some(identity.clone()));
                Ok(identity)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Sign-in failed");
                self.set_loading(false);
                Err(SessionError::Login(err))
            }
        }
    }

    /// Ask the backend who is signed in and record the answer.
    ///
    /// Any failure (non-2xx, unreadable body, network error) means no session.
    pub async fn fetch_session(&self) -> Option<Identity> {
        self.set_loading(true);

        let request = RequestDescriptor::get(self.client.endpoints().me.as_str());
        let identity = match self.client.send_without_refresh(&request).await {
            Ok(response) if response.status().is_success() => {
                match response.json::<ProfilePayload>().await {
                    Ok(payload) => Some(Identity::from_profile(payload)),
                    Err(err) => {
                        tracing::warn!(error = %err, "Unreadable session payload");
                        None
                    }
                }
            }
            Ok(response) => {
                tracing::debug!(status = %response.status(), "No active session");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "Session check failed");
                None
            }
        };

        self.set_identity(identity.clone());
        identity
    }

    /// Sign out. The local identity is cleared whatever the backend says.
    pub async fn logout(&self) {
        let request = RequestDescriptor::post(self.client.endpoints().logout.as_str());
        match self.client.send_without_refresh(&request).await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Signed out");
            }
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Logout rejected; clearing local session");
            }
            Err(err) => {
                tracing::warn!(error = %err, "Logout failed; clearing local session");
            }
        }
        self.set_identity(None);
    }

    /// Guard for pages that need a signed-in user.
    ///
    /// Checks the session with the backend; without one, returns where to
    /// send the visitor so they come back to `path` after signing in.
    pub async fn require_session(&self, path: &str) -> Result<Identity, LoginRedirect> {
        if let Some(identity) = self.fetch_session().await {
            return Ok(identity);
        }
        Err(LoginRedirect {
            return_to: path.to_string(),
            location: login_redirect_location(&self.client.endpoints().login_page, path),
        })
    }

    fn set_identity(&self, identity: Option<Identity>) {
        self.state.send_modify(|state| state.set_identity(identity));
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_modify(|state| state.set_loading(loading));
    }
}
