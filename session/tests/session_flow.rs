//! Session facade against a mock Pacer backend.

use std::sync::{Arc, Mutex};

use pacer_client::pacer_types::{AuthEndpoints, DeviceId, LoginCredentials};
use pacer_client::{
    ApiError, AuthClient, LoggingNavigator, Navigator, StatusCode, TransportOptions,
};
use pacer_session::{LoginRedirect, Session, SessionError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

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
    Session::new(Arc::new(client), DeviceId::new("device-abc").unwrap())
}

struct RecordingNavigator {
    current: String,
    redirects: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current.clone()
    }

    fn redirect_to_login(&self, return_to: &str) {
        self.redirects.lock().unwrap().push(return_to.to_string());
    }
}

fn credentials() -> LoginCredentials {
    LoginCredentials::new("runner@example.com", "hunter22").unwrap()
}

async fn mount_me(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_sends_device_id_and_records_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "runner@example.com",
            "password": "hunter22",
            "deviceId": "device-abc"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": 7,
            "email": "runner@example.com",
            "emailVerified": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);

    let identity = session.login(&credentials()).await.unwrap();

    assert_eq!(identity.name, "runner");
    assert_eq!(identity.email, "runner@example.com");
    assert_eq!(identity.email_verified, Some(true));
    assert!(session.is_authenticated());
    assert!(!session.is_loading());
    assert_eq!(session.identity(), Some(identity));
}

#[tokio::test]
async fn rejected_login_keeps_identity_and_clears_loading() {
    let server = MockServer::start().await;
    mount_me(&server, 200, json!({ "name": "Existing", "email": "old@example.com" })).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "title": "Bad Request",
            "status": 400,
            "detail": "Password is too short"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    let before = session.fetch_session().await;
    assert!(before.is_some());

    let err = session.login(&credentials()).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert!(err.to_string().contains("Password is too short"));
    assert_eq!(session.identity(), before);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn login_cookie_authorizes_session_check() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "accessToken=abc; Path=/; HttpOnly")
                .set_body_json(json!({ "email": "runner@example.com", "emailVerified": false })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("cookie", "accessToken=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "pacer",
            "email": "runner@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    session.login(&credentials()).await.unwrap();

    let identity = session.fetch_session().await.unwrap();

    assert_eq!(identity.name, "pacer");
}

#[tokio::test]
async fn fetch_session_without_session_does_not_refresh() {
    let server = MockServer::start().await;
    mount_me(&server, 401, json!({ "title": "Unauthorized" })).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_for(&server);

    assert_eq!(session.fetch_session().await, None);
    assert!(!session.is_authenticated());
    assert!(!session.is_loading());
}

#[tokio::test]
async fn fetch_session_falls_back_to_email_local_part() {
    let server = MockServer::start().await;
    mount_me(&server, 200, json!({ "email": "jo@example.com", "avatar": "https://cdn/jo.png" })).await;

    let session = session_for(&server);
    let mut rx = session.subscribe();

    let identity = session.fetch_session().await.unwrap();

    assert_eq!(identity.name, "jo");
    assert_eq!(identity.avatar.as_deref(), Some("https://cdn/jo.png"));
    let observed = rx.borrow_and_update().clone();
    assert!(observed.is_authenticated());
    assert!(!observed.is_loading());
}

#[tokio::test]
async fn logout_clears_identity_even_when_backend_fails() {
    let server = MockServer::start().await;
    mount_me(&server, 200, json!({ "name": "Runner" })).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    session.fetch_session().await.unwrap();
    assert!(session.is_authenticated());

    session.logout().await;

    assert_eq!(session.identity(), None);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn logout_clears_identity_when_backend_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = AuthClient::new(
        format!("http://127.0.0.1:{port}").parse().unwrap(),
        AuthEndpoints::default(),
        &TransportOptions {
            allow_insecure_http: true,
            ..TransportOptions::default()
        },
        Arc::new(LoggingNavigator::new("/login")),
    )
    .unwrap();
    let session = Session::new(Arc::new(client), DeviceId::new("device-abc").unwrap());

    assert_eq!(session.fetch_session().await, None);
    session.logout().await;

    assert!(!session.is_authenticated());
    assert!(!session.is_loading());
}

#[tokio::test]
async fn require_session_redirects_to_login_with_return_path() {
    let server = MockServer::start().await;
    mount_me(&server, 401, json!({})).await;

    let session = session_for(&server);

    let redirect = session.require_session("/history").await.unwrap_err();

    assert_eq!(
        redirect,
        LoginRedirect {
            return_to: "/history".into(),
            location: "/login?redirectTo=%2Fhistory".into(),
        }
    );
}

#[tokio::test]
async fn require_session_returns_identity_when_signed_in() {
    let server = MockServer::start().await;
    mount_me(&server, 200, json!({ "name": "Runner", "email": "runner@example.com" })).await;

    let session = session_for(&server);

    let identity = session.require_session("/backlog").await.unwrap();

    assert_eq!(identity.name, "Runner");
}

#[tokio::test]
async fn unauthorized_login_goes_through_failed_refresh_to_session_expired() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "title": "Unauthorized",
            "status": 401,
            "detail": "Invalid email or password"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let navigator = Arc::new(RecordingNavigator {
        current: "/login".to_string(),
        redirects: Mutex::new(Vec::new()),
    });
    let client = AuthClient::new(
        server.uri().parse().unwrap(),
        AuthEndpoints::default(),
        &TransportOptions {
            allow_insecure_http: true,
            ..TransportOptions::default()
        },
        navigator.clone(),
    )
    .unwrap();
    let session = Session::new(Arc::new(client), DeviceId::new("device-abc").unwrap());
    let before = session.identity();

    let err = session.login(&credentials()).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Login(ApiError::SessionExpired { ref return_to }) if return_to == "/login"
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert!(!session.is_loading());
    assert_eq!(session.identity(), before);
    assert_eq!(*navigator.redirects.lock().unwrap(), vec!["/login".to_string()]);
}
