use anyhow::{Context, Result, bail};
use futures_util::future::join_all;
use pacer_client::LoggingNavigator;
use pacer_session::Session;
use pacer_types::{Identity, LoginCredentials, NAV_ITEMS, NavPriority};
use pacer_utils::DeviceIdStore;

pub const EMAIL_ENV: &str = "PACER_EMAIL";
pub const PASSWORD_ENV: &str = "PACER_PASSWORD";

/// Credentials from `PACER_EMAIL` / `PACER_PASSWORD`, when both are set.
pub fn credentials_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<LoginCredentials> {
    let email = lookup(EMAIL_ENV)?;
    let password = lookup(PASSWORD_ENV)?;
    match LoginCredentials::new(email, password) {
        Ok(credentials) => Some(credentials),
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring incomplete credentials from environment");
            None
        }
    }
}

/// Credentials from the process environment.
pub fn env_credentials() -> Option<LoginCredentials> {
    credentials_from_env(|key| std::env::var(key).ok())
}

/// Bootstrap the session, signing in with `credentials` if there is none.
///
/// Every run starts with an empty cookie jar, so without credentials the
/// backend usually reports no session.
async fn ensure_signed_in(
    session: &Session,
    credentials: Option<LoginCredentials>,
) -> Result<Option<Identity>> {
    if let Some(identity) = session.fetch_session().await {
        return Ok(Some(identity));
    }
    let Some(credentials) = credentials else {
        return Ok(None);
    };
    let identity = session
        .login(&credentials)
        .await
        .with_context(|| format!("signing in as {}", credentials.email()))?;
    Ok(Some(identity))
}

pub fn describe(identity: &Identity) -> String {
    let mut line = format!("{} <{}>", identity.name, identity.email);
    if identity.email_verified == Some(false) {
        line.push_str(" (email not verified)");
    }
    line
}

pub async fn whoami(session: &Session, credentials: Option<LoginCredentials>) -> Result<()> {
    println!("{}", whoami_line(session, credentials).await?);
    Ok(())
}

async fn whoami_line(session: &Session, credentials: Option<LoginCredentials>) -> Result<String> {
    Ok(match ensure_signed_in(session, credentials).await? {
        Some(identity) => describe(&identity),
        None => "not signed in".to_string(),
    })
}

pub async fn get(
    session: &Session,
    navigator: &LoggingNavigator,
    credentials: Option<LoginCredentials>,
    paths: &[String],
) -> Result<()> {
    if let Some(first) = paths.first() {
        navigator.set_current_path(first.as_str());
    }
    if ensure_signed_in(session, credentials).await?.is_none() {
        tracing::info!("No session; requests will be sent anonymously");
    }

    let client = session.client();
    let results = join_all(
        paths
            .iter()
            .map(|path| client.get::<serde_json::Value>(path)),
    )
    .await;

    let mut failures = 0usize;
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(body) => {
                let pretty = serde_json::to_string_pretty(&body)
                    .with_context(|| format!("formatting response from {path}"))?;
                println!("# {path}\n{pretty}");
            }
            Err(err) => {
                failures += 1;
                eprintln!("# {path}\nerror: {err}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} request(s) failed", paths.len());
    }
    Ok(())
}

pub async fn logout(session: &Session, credentials: Option<LoginCredentials>) -> Result<()> {
    if ensure_signed_in(session, credentials).await?.is_none() {
        println!("not signed in");
        return Ok(());
    }
    session.logout().await;
    println!("signed out");
    Ok(())
}

pub fn nav() {
    for item in &NAV_ITEMS {
        let placement = match item.priority {
            NavPriority::P0 => "sidebar, mobile",
            NavPriority::P1 => "sidebar",
        };
        println!("{} {:<20} {:<10} {placement}", item.icon, item.label, item.href);
    }
}

pub fn device_id(store: &DeviceIdStore, reset: bool) -> Result<()> {
    if reset {
        store.clear().context("removing device id")?;
    }
    let id = store.get_or_create().context("loading device id")?;
    println!("{id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use pacer_client::{AuthClient, TransportOptions};
    use pacer_types::{AuthEndpoints, DeviceId};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn session_for(server: &MockServer) -> Session {
        let client = AuthClient::new(
            server.uri().parse().unwrap(),
            AuthEndpoints::default(),
            &TransportOptions {
                allow_insecure_http: true,
                ..TransportOptions::default()
            },
            Arc::new(LoggingNavigator::new("/login")),
        )
        .unwrap();
        Session::new(Arc::new(client), DeviceId::new("cli-device").unwrap())
    }

    async fn mount_no_session(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(server)
            .await;
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn env_credentials_need_both_values() {
        assert!(credentials_from_env(lookup(&[(EMAIL_ENV, "a@b.c")])).is_none());
        assert!(credentials_from_env(lookup(&[(PASSWORD_ENV, "pw")])).is_none());
        assert!(credentials_from_env(lookup(&[(EMAIL_ENV, " "), (PASSWORD_ENV, "pw")])).is_none());

        let credentials =
            credentials_from_env(lookup(&[(EMAIL_ENV, "a@b.c"), (PASSWORD_ENV, "pw")])).unwrap();
        assert_eq!(credentials.email(), "a@b.c");
    }

    #[test]
    fn describe_flags_unverified_email() {
        let mut identity = Identity {
            name: "Runner".into(),
            email: "runner@example.com".into(),
            avatar: None,
            email_verified: Some(false),
        };
        assert_eq!(
            describe(&identity),
            "Runner <runner@example.com> (email not verified)"
        );
        identity.email_verified = None;
        assert_eq!(describe(&identity), "Runner <runner@example.com>");
    }

    #[test]
    fn device_id_reset_generates_a_new_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeviceIdStore::new(dir.path().join("device-id"));

        device_id(&store, false).unwrap();
        let first = store.get_or_create().unwrap();
        device_id(&store, true).unwrap();
        let second = store.get_or_create().unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn whoami_signs_in_with_credentials_when_no_session() {
        let server = MockServer::start().await;
        mount_no_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "userId": 1,
                "email": "runner@example.com",
                "emailVerified": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server);
        let credentials = LoginCredentials::new("runner@example.com", "hunter22").unwrap();

        let line = whoami_line(&session, Some(credentials)).await.unwrap();

        assert_eq!(line, "runner <runner@example.com>");
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn whoami_without_session_or_credentials_reports_signed_out() {
        let server = MockServer::start().await;
        mount_no_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = session_for(&server);

        let line = whoami_line(&session, None).await.unwrap();

        assert_eq!(line, "not signed in");
    }

    #[tokio::test]
    async fn whoami_uses_existing_session_without_logging_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Runner",
                "email": "runner@example.com",
                "emailVerified": false
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = session_for(&server);
        let credentials = LoginCredentials::new("runner@example.com", "hunter22").unwrap();

        let line = whoami_line(&session, Some(credentials)).await.unwrap();

        assert_eq!(line, "Runner <runner@example.com> (email not verified)");
    }

    #[tokio::test]
    async fn whoami_reports_rejected_sign_in() {
        let server = MockServer::start().await;
        mount_no_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "title": "Bad Request",
                "detail": "Password is too short"
            })))
            .mount(&server)
            .await;

        let session = session_for(&server);
        let credentials = LoginCredentials::new("runner@example.com", "x").unwrap();

        let err = whoami_line(&session, Some(credentials)).await.unwrap_err();

        assert!(format!("{err:#}").contains("signing in as runner@example.com"));
        assert!(!session.is_authenticated());
    }
}
