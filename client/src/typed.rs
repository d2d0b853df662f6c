//! JSON request helpers on top of [`AuthClient::send`].

use reqwest::Response;
use reqwest::header::{ACCEPT, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{ApiError, AuthClient, MAX_ERROR_BODY_BYTES, RequestDescriptor};

impl AuthClient {
    pub async fn get<T: DeserializeOwned>(&self, target: &str) -> Result<T, ApiError> {
        self.fetch_json(RequestDescriptor::get(target)).await
    }

    pub async fn post<B, T>(&self, target: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::post(target)
            .json(body)
            .map_err(ApiError::Encode)?;
        self.fetch_json(request).await
    }

    pub async fn put<B, T>(&self, target: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::put(target)
            .json(body)
            .map_err(ApiError::Encode)?;
        self.fetch_json(request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, target: &str) -> Result<T, ApiError> {
        self.fetch_json(RequestDescriptor::delete(target)).await
    }

    /// Send `request` through the executor and decode a JSON success body.
    ///
    /// Non-2xx final responses become [`ApiError::RequestFailed`]. An empty
    /// success body decodes as JSON `null`, so `()` and `Option<T>` work for
    /// endpoints that return nothing.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let request = request.header(ACCEPT, HeaderValue::from_static("application/json"));
        let response = ensure_success(self.send(request).await?).await?;
        let bytes = response.bytes().await?;
        decode_json(&bytes)
    }
}

/// Pass 2xx responses through; turn anything else into `RequestFailed`.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = read_capped_error_body(response).await;
    tracing::debug!(status = %status, "Request failed");
    Err(ApiError::RequestFailed {
        status,
        detail: error_detail(&body),
    })
}

async fn read_capped_error_body(mut response: Response) -> String {
    let mut body = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Human-readable detail from an error body.
///
/// Prefers the RFC 7807 `detail`, then `title`, then a `message` field; falls
/// back to the raw text. Blank bodies yield `None`.
fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed)
    {
        for key in ["detail", "title", "message"] {
            if let Some(text) = map.get(key).and_then(serde_json::Value::as_str)
                && !text.trim().is_empty()
            {
                return Some(text.trim().to_string());
            }
        }
    }
    Some(trimmed.to_string())
}

fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_slice(b"null").map_err(ApiError::Decode);
    }
    serde_json::from_slice(bytes).map_err(ApiError::Decode)
}
