//! Request execution with one refresh-and-retry on authorization failure.

use reqwest::{Response, StatusCode};

use crate::{ApiError, AuthClient, RequestDescriptor};

impl AuthClient {
    /// Send `request` with the session cookies attached.
    ///
    /// The response is returned as-is whatever its status, with one
    /// exception: a 401 on the first attempt triggers a credential refresh.
    /// If the refresh succeeds the request is re-issued once and that second
    /// response is returned (even if it is another 401). If the refresh fails
    /// the navigator is told to redirect to login and
    /// [`ApiError::SessionExpired`] is returned.
    ///
    /// Transport errors are returned immediately and never trigger a refresh.
    pub async fn send(&self, request: RequestDescriptor) -> Result<Response, ApiError> {
        let mut request = request;
        loop {
            let response = self.issue(&request).await?;
            if response.status() != StatusCode::UNAUTHORIZED || request.is_retry() {
                return Ok(response);
            }
            drop(response);

            tracing::debug!(
                method = %request.method(),
                target = request.target(),
                "Unauthorized; refreshing credential"
            );
            if !self.refresh.ensure_fresh_credential().await {
                return Err(self.expire_session());
            }
            request = request.into_retry();
        }
    }

    /// Send `request` once with the session cookies attached, never refreshing.
    ///
    /// Used by session bootstrap and logout, where a 401 simply means
    /// "no session".
    pub async fn send_without_refresh(
        &self,
        request: &RequestDescriptor,
    ) -> Result<Response, ApiError> {
        self.issue(request).await
    }

    async fn issue(&self, request: &RequestDescriptor) -> Result<Response, ApiError> {
        let url = self.resolve(request.target())?;
        let mut builder = self
            .http
            .request(request.method().clone(), url)
            .headers(request.headers().clone());
        if let Some(body) = request.body_bytes() {
            builder = builder.body(body.to_vec());
        }
        Ok(builder.send().await?)
    }

    fn expire_session(&self) -> ApiError {
        let return_to = self.navigator.current_path();
        tracing::warn!(return_to = %return_to, "Session expired; redirecting to login");
        self.navigator.redirect_to_login(&return_to);
        ApiError::SessionExpired { return_to }
    }
}
