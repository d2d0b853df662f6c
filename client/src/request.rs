use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

/// One outgoing request, immutable per attempt.
///
/// `target` is either a path resolved against the client's base URL or an
/// absolute URL. The retry counter is 0 for the original attempt and 1 for
/// the single retry after a credential refresh.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    retry_count: u8,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HeaderMap::new(),
            body: None,
            retry_count: 0,
        }
    }

    #[must_use]
    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    #[must_use]
    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    #[must_use]
    pub fn put(target: impl Into<String>) -> Self {
        Self::new(Method::PUT, target)
    }

    #[must_use]
    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body))
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    #[must_use]
    pub const fn retry_count(&self) -> u8 {
        self.retry_count
    }

    #[must_use]
    pub const fn is_retry(&self) -> bool {
        self.retry_count > 0
    }

    /// The same request, marked as the post-refresh retry.
    pub(crate) fn into_retry(self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sets_body_and_content_type() {
        let request = RequestDescriptor::post("/api/sprints")
            .json(&serde_json::json!({ "goal": "5k" }))
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(request.body_bytes(), Some(br#"{"goal":"5k"}"#.as_slice()));
    }

    #[test]
    fn retry_keeps_everything_but_the_counter() {
        let original = RequestDescriptor::put("/api/tasks/3")
            .header(
                HeaderName::from_static("x-trace"),
                HeaderValue::from_static("abc"),
            )
            .body("payload");
        assert_eq!(original.retry_count(), 0);
        assert!(!original.is_retry());

        let retry = original.clone().into_retry();
        assert_eq!(retry.retry_count(), 1);
        assert!(retry.is_retry());
        assert_eq!(retry.method(), original.method());
        assert_eq!(retry.target(), original.target());
        assert_eq!(retry.headers(), original.headers());
        assert_eq!(retry.body_bytes(), original.body_bytes());
    }
}
