//! Single-flight credential refresh.
//!
//! At most one refresh call is in flight per coordinator. Callers that hit an
//! authorization failure while it runs join the same operation and observe
//! the same outcome.
//!
//! # Handle lifecycle
//!
//! ```text
//! none ──first failure──▶ in flight ──refresh settles──▶ none
//!                          ▲      │
//!                          └──────┘ later failures join
//! ```
//!
//! The slot is emptied by the refresh task itself, after the HTTP call
//! settles and before the outcome reaches any waiter. A failure observed
//! after the outcome is delivered therefore always starts a fresh refresh.

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use url::Url;

type RefreshHandle = Shared<BoxFuture<'static, bool>>;
type RefreshSlot = Arc<Mutex<Option<RefreshHandle>>>;

/// Owns the in-flight refresh handle for one client.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    refresh_url: Url,
    in_flight: RefreshSlot,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.refresh_url.as_str())
            .field("in_flight", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// `http` must be the same client (and therefore cookie jar) used for
    /// regular requests, so the refreshed credential is picked up by retries.
    #[must_use]
    pub fn new(http: reqwest::Client, refresh_url: Url) -> Self {
        Self {
            http,
            refresh_url,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Refresh the ambient credential, or join the refresh already running.
    ///
    /// Returns `true` if the refresh endpoint answered with a success status.
    /// Rejections and transport failures both yield `false`; neither is
    /// propagated.
    pub async fn ensure_fresh_credential(&self) -> bool {
        let handle = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(handle) = slot.as_ref() {
                tracing::debug!("Joining in-flight credential refresh");
                handle.clone()
            } else {
                let handle = self.start_refresh();
                *slot = Some(handle.clone());
                handle
            }
        };
        handle.await
    }

    /// Whether a refresh is currently in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    // Called with the slot locked; the spawned task cannot clear the slot
    // before the new handle is stored.
    fn start_refresh(&self) -> RefreshHandle {
        let http = self.http.clone();
        let url = self.refresh_url.clone();
        let slot = Arc::clone(&self.in_flight);

        tracing::debug!(url = %url, "Starting credential refresh");
        let task = tokio::spawn(async move {
            let release = ReleaseOnSettle(slot);
            let refreshed = request_refresh(&http, url).await;
            drop(release);
            refreshed
        });

        async move {
            task.await.unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Credential refresh task failed");
                false
            })
        }
        .boxed()
        .shared()
    }
}

/// Empties the refresh slot when dropped, including on panic unwind.
struct ReleaseOnSettle(RefreshSlot);

impl Drop for ReleaseOnSettle {
    fn drop(&mut self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

async fn request_refresh(http: &reqwest::Client, url: Url) -> bool {
    match http.post(url).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::debug!(status = %response.status(), "Credential refreshed");
            true
        }
        Ok(response) => {
            tracing::warn!(status = %response.status(), "Credential refresh rejected");
            false
        }
        Err(err) => {
            tracing::warn!(error = %err, "Credential refresh failed");
            false
        }
    }
}
