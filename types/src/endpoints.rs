use serde::Deserialize;

/// Paths of the auth service endpoints, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
    pub login: String,
    pub logout: String,
    pub refresh: String,
    pub me: String,
    /// Page the user is sent to when the session cannot be recovered.
    pub login_page: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/api/auth/login".into(),
            logout: "/api/auth/logout".into(),
            refresh: "/api/auth/refresh".into(),
            me: "/api/auth/me".into(),
            login_page: "/login".into(),
        }
    }
}
