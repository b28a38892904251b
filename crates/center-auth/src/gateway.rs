//! Auth gateway: login, logout, boot verification, auth headers
//!
//! The gateway is the only component that calls the backend's auth
//! endpoints and the only writer of session state. It holds no copy of the
//! credential; every read goes through the injected `SessionStore`.
//!
//! Boot verification is the one suspension point: until it resolves the
//! session stays `Pending` and the route guard renders nothing.

use std::sync::Arc;

use common::Secret;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::constants::{GENERIC_LOGIN_FAILURE, LOGIN_PATH, VERIFY_PATH};
use crate::credentials::{Credential, SessionStore};
use crate::error::{Error, Result};
use crate::metrics;
use crate::session::{Session, SessionWatch, VerificationState};

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    valid: bool,
}

/// Why a session ended; used for logs and the session-loss counter.
#[derive(Debug, Clone, Copy)]
enum SessionEnd {
    Logout,
    VerifyRejected,
    VerifyFailed,
    Unauthorized,
}

impl SessionEnd {
    fn label(self) -> &'static str {
        match self {
            SessionEnd::Logout => "logout",
            SessionEnd::VerifyRejected => "verify_rejected",
            SessionEnd::VerifyFailed => "verify_failed",
            SessionEnd::Unauthorized => "unauthorized",
        }
    }
}

/// Sole mediator of the admin session.
pub struct AuthGateway {
    client: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    session: watch::Sender<Session>,
}

impl AuthGateway {
    /// Create a gateway over `store`, talking to the backend at `base_url`.
    ///
    /// The initial session is `Pending` when the store already holds a
    /// credential (it still needs `verify_on_boot`), otherwise `Absent`.
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let initial = match store.load() {
            Some(credential) => Session::pending(Some(credential.username)),
            None => Session::absent(),
        };
        let (session, _) = watch::channel(initial);
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            store,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Subscribe to session transitions.
    pub fn watch(&self) -> SessionWatch {
        SessionWatch::new(self.session.subscribe())
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Authenticate against the backend and persist the returned credential.
    ///
    /// The session is `Pending` while the request is in flight. On any
    /// failure the session reverts to what it was before the attempt and the
    /// store is left untouched.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(&self, username: &str, password: &Secret<String>) -> Result<Credential> {
        let previous = self.session.send_replace(Session::pending(None));

        match self.request_login(username, password).await {
            Ok(credential) => {
                if let Err(e) = self.store.save(&credential) {
                    warn!(error = %e, "login succeeded but session could not be persisted");
                    self.session.send_replace(previous);
                    metrics::record_login("error");
                    return Err(e);
                }
                self.session
                    .send_replace(Session::verified(credential.username.clone()));
                metrics::record_login("success");
                info!(username = %credential.username, "admin signed in");
                Ok(credential)
            }
            Err(e) => {
                self.session.send_replace(previous);
                metrics::record_login(match &e {
                    Error::InvalidCredentials(_) => "rejected",
                    Error::NetworkFailure(_) => "network",
                    _ => "error",
                });
                warn!(error = %e, "admin login failed");
                Err(e)
            }
        }
    }

    async fn request_login(&self, username: &str, password: &Secret<String>) -> Result<Credential> {
        let response = self
            .client
            .post(format!("{}{LOGIN_PATH}", self.base_url))
            .json(&LoginRequest {
                username,
                password: password.expose(),
            })
            .send()
            .await
            .map_err(|e| Error::NetworkFailure(format!("login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = error_detail(&body).unwrap_or_else(|| GENERIC_LOGIN_FAILURE.to_owned());
            debug!(%status, "login rejected by backend");
            return Err(Error::InvalidCredentials(reason));
        }

        let body = response
            .json::<LoginResponse>()
            .await
            .map_err(|e| Error::UnexpectedResponse(format!("invalid login response: {e}")))?;
        if body.access_token.is_empty() || body.username.is_empty() {
            return Err(Error::UnexpectedResponse(
                "login response missing token or username".into(),
            ));
        }
        Ok(Credential::new(body.username, body.access_token))
    }

    /// End the session locally. Never touches the network.
    pub fn logout(&self) {
        self.end_session(SessionEnd::Logout);
    }

    /// Resolve the persisted credential at application start.
    ///
    /// No credential: `Absent` immediately, without a network call.
    /// Otherwise `Pending` until the backend answers; a `valid: true` answer
    /// gives `Verified`, anything else (rejection, error status, unreachable
    /// backend) clears the stale credential and gives `Absent`.
    #[instrument(skip_all)]
    pub async fn verify_on_boot(&self) -> VerificationState {
        let Some(credential) = self.store.load() else {
            self.session.send_replace(Session::absent());
            debug!("no persisted session, skipping verification");
            return VerificationState::Absent;
        };

        self.session
            .send_replace(Session::pending(Some(credential.username.clone())));

        match self.check_token(&credential).await {
            Ok(true) => {
                info!(username = %credential.username, "persisted session verified");
                self.session
                    .send_replace(Session::verified(credential.username));
                VerificationState::Verified
            }
            Ok(false) => {
                info!(username = %credential.username, "persisted session rejected by backend");
                self.end_session(SessionEnd::VerifyRejected);
                VerificationState::Absent
            }
            Err(e) => {
                warn!(error = %e, "session verification failed, signing out");
                self.end_session(SessionEnd::VerifyFailed);
                VerificationState::Absent
            }
        }
    }

    /// Ask the backend whether `credential` is still good.
    ///
    /// Non-success statuses and unreadable bodies count as invalid; only a
    /// transport failure is an error.
    async fn check_token(&self, credential: &Credential) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}{VERIFY_PATH}", self.base_url))
            .headers(bearer_header(credential))
            .send()
            .await
            .map_err(|e| Error::NetworkFailure(format!("verify request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "verify endpoint refused token");
            return Ok(false);
        }

        match response.json::<VerifyResponse>().await {
            Ok(body) => Ok(body.valid),
            Err(e) => {
                debug!(error = %e, "unreadable verify response");
                Ok(false)
            }
        }
    }

    /// Handle an authorization error from any API call.
    ///
    /// Equivalent to `logout`; subscribers see `Absent` and the guard
    /// redirects. A no-op when already signed out.
    pub fn expire_session(&self) {
        if self.session.borrow().state == VerificationState::Absent && self.store.load().is_none()
        {
            return;
        }
        warn!("backend rejected session credentials, signing out");
        self.end_session(SessionEnd::Unauthorized);
    }

    /// Headers for an authenticated API call; empty when signed out.
    pub fn auth_header(&self) -> HeaderMap {
        match self.store.load() {
            Some(credential) => bearer_header(&credential),
            None => HeaderMap::new(),
        }
    }

    fn end_session(&self, reason: SessionEnd) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to remove persisted session");
        }
        self.session.send_replace(Session::absent());
        metrics::record_session_end(reason.label());
        debug!(reason = reason.label(), "session ended");
    }
}

/// Whether an HTTP status means the session is no longer accepted.
pub fn is_authorization_error(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

fn bearer_header(credential: &Credential) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(&format!("Bearer {}", credential.token.expose())) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Err(_) => warn!("stored token is not a valid header value, sending no credentials"),
    }
    headers
}

/// Pull a human-readable `detail` string out of a backend error body.
///
/// Validation errors carry `detail` as an array; those yield `None` so the
/// caller falls back to its generic message.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{FileSessionStore, MemorySessionStore};
    use axum::Json;
    use axum::extract::State;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    #[derive(Clone)]
    struct Backend {
        /// Token the verify endpoint accepts
        valid_token: Option<&'static str>,
        /// Answer 401 instead of `{valid:false}` for unknown tokens
        reject_with_status: bool,
        verify_calls: Arc<AtomicUsize>,
        login_calls: Arc<AtomicUsize>,
    }

    async fn login_handler(
        State(backend): State<Backend>,
        Json(body): Json<serde_json::Value>,
    ) -> (AxumStatus, Json<serde_json::Value>) {
        backend.login_calls.fetch_add(1, Ordering::SeqCst);
        if body["username"] == "admin" && body["password"] == "secret" {
            (
                AxumStatus::OK,
                Json(serde_json::json!({"access_token": "T-fresh", "username": "admin"})),
            )
        } else if body["username"] == "validation" {
            (
                AxumStatus::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({"detail": [{"loc": ["body", "password"], "msg": "field required"}]})),
            )
        } else {
            (
                AxumStatus::UNAUTHORIZED,
                Json(serde_json::json!({"detail": "Invalid credentials"})),
            )
        }
    }

    async fn verify_handler(
        State(backend): State<Backend>,
        headers: axum::http::HeaderMap,
    ) -> (AxumStatus, Json<serde_json::Value>) {
        backend.verify_calls.fetch_add(1, Ordering::SeqCst);
        let presented = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let valid = backend
            .valid_token
            .is_some_and(|t| presented == format!("Bearer {t}"));
        if !valid && backend.reject_with_status {
            return (
                AxumStatus::UNAUTHORIZED,
                Json(serde_json::json!({"detail": "Could not validate credentials"})),
            );
        }
        (AxumStatus::OK, Json(serde_json::json!({"valid": valid})))
    }

    async fn start_backend(valid_token: Option<&'static str>, reject_with_status: bool) -> (String, Backend) {
        let backend = Backend {
            valid_token,
            reject_with_status,
            verify_calls: Arc::new(AtomicUsize::new(0)),
            login_calls: Arc::new(AtomicUsize::new(0)),
        };
        let app = axum::Router::new()
            .route("/api/admin/login", post(login_handler))
            .route("/api/admin/verify", get(verify_handler))
            .with_state(backend.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), backend)
    }

    /// Base URL of a port nothing listens on.
    async fn dead_backend() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    fn persisted(token: &str) -> Arc<MemorySessionStore> {
        Arc::new(MemorySessionStore::with_credential(Credential::new("admin", token)))
    }

    fn gateway(url: &str, store: Arc<dyn SessionStore>) -> AuthGateway {
        AuthGateway::new(reqwest::Client::new(), url, store)
    }

    #[tokio::test]
    async fn boot_without_credential_is_absent_and_skips_verify() {
        let (url, backend) = start_backend(Some("T1"), false).await;
        let gw = gateway(&url, Arc::new(MemorySessionStore::new()));
        assert_eq!(gw.session().state, VerificationState::Absent);

        let state = gw.verify_on_boot().await;

        assert_eq!(state, VerificationState::Absent);
        assert_eq!(backend.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn boot_with_valid_credential_goes_pending_then_verified() {
        let (url, backend) = start_backend(Some("T1"), false).await;
        let store = persisted("T1");
        let gw = gateway(&url, store.clone());
        let mut watch = gw.watch();
        assert_eq!(watch.observe().state, VerificationState::Pending);

        let state = gw.verify_on_boot().await;

        assert_eq!(state, VerificationState::Verified);
        assert_eq!(backend.verify_calls.load(Ordering::SeqCst), 1);
        let session = gw.session();
        assert!(session.is_verified());
        assert_eq!(session.username.as_deref(), Some("admin"));
        assert_eq!(store.load().unwrap().token.expose(), "T1");
    }

    #[tokio::test]
    async fn boot_with_rejected_credential_clears_store() {
        let (url, _backend) = start_backend(Some("other"), false).await;
        let store = persisted("T1");
        let gw = gateway(&url, store.clone());

        let state = gw.verify_on_boot().await;

        assert_eq!(state, VerificationState::Absent);
        assert!(store.load().is_none(), "stale token T1 must be removed");
        assert_eq!(gw.session(), Session::absent());
    }

    #[tokio::test]
    async fn boot_with_401_from_verify_clears_store() {
        let (url, _backend) = start_backend(None, true).await;
        let store = persisted("T1");
        let gw = gateway(&url, store.clone());

        assert_eq!(gw.verify_on_boot().await, VerificationState::Absent);
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn boot_with_unreachable_backend_signs_out() {
        let url = dead_backend().await;
        let store = persisted("T1");
        let gw = gateway(&url, store.clone());

        assert_eq!(gw.verify_on_boot().await, VerificationState::Absent);
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn boot_rejection_removes_token_from_disk() {
        let (url, _backend) = start_backend(Some("other"), false).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileSessionStore::open(&path)
            .save(&Credential::new("admin", "T1"))
            .unwrap();

        let gw = gateway(&url, Arc::new(FileSessionStore::open(&path)));
        gw.verify_on_boot().await;

        assert!(!path.exists());
        assert!(FileSessionStore::open(&path).load().is_none());
    }

    #[tokio::test]
    async fn login_success_persists_and_verifies() {
        let (url, _backend) = start_backend(None, false).await;
        let store = Arc::new(MemorySessionStore::new());
        let gw = gateway(&url, store.clone());

        let credential = gw.login("admin", &Secret::from("secret")).await.unwrap();

        assert_eq!(credential.username, "admin");
        assert_eq!(credential.token.expose(), "T-fresh");
        assert_eq!(store.load(), Some(credential));
        assert!(gw.session().is_verified());
    }

    #[tokio::test]
    async fn login_rejection_reports_backend_detail_and_persists_nothing() {
        let (url, _backend) = start_backend(None, false).await;
        let store = Arc::new(MemorySessionStore::new());
        let gw = gateway(&url, store.clone());

        let err = gw.login("admin", &Secret::from("wrong")).await.unwrap_err();

        assert!(matches!(err, Error::InvalidCredentials(_)));
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(store.load().is_none());
        assert_eq!(gw.session(), Session::absent());
    }

    #[tokio::test]
    async fn login_rejection_without_string_detail_uses_generic_reason() {
        let (url, _backend) = start_backend(None, false).await;
        let gw = gateway(&url, Arc::new(MemorySessionStore::new()));

        let err = gw
            .login("validation", &Secret::from("x"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), GENERIC_LOGIN_FAILURE);
    }

    #[tokio::test]
    async fn failed_login_leaves_existing_session_untouched() {
        let (url, _backend) = start_backend(Some("T1"), false).await;
        let store = persisted("T1");
        let gw = gateway(&url, store.clone());
        gw.verify_on_boot().await;

        let result = gw.login("admin", &Secret::from("wrong")).await;

        assert!(result.is_err());
        assert_eq!(store.load().unwrap().token.expose(), "T1");
        assert!(gw.session().is_verified());
    }

    #[tokio::test]
    async fn login_against_unreachable_backend_is_network_failure() {
        let url = dead_backend().await;
        let store = Arc::new(MemorySessionStore::new());
        let gw = gateway(&url, store.clone());

        let err = gw.login("admin", &Secret::from("secret")).await.unwrap_err();

        assert!(matches!(err, Error::NetworkFailure(_)), "got {err:?}");
        assert!(store.load().is_none());
        assert_eq!(gw.session().state, VerificationState::Absent);
    }

    #[tokio::test]
    async fn logout_always_ends_absent_without_network() {
        let url = dead_backend().await;
        let store = persisted("T1");
        let gw = gateway(&url, store.clone());
        assert_eq!(gw.session().state, VerificationState::Pending);

        gw.logout();
        assert_eq!(gw.session(), Session::absent());
        assert!(store.load().is_none());

        gw.logout();
        assert_eq!(gw.session(), Session::absent());
    }

    #[tokio::test]
    async fn auth_header_tracks_the_stored_credential() {
        let url = dead_backend().await;
        let store = Arc::new(MemorySessionStore::new());
        let gw = gateway(&url, store.clone());
        assert!(gw.auth_header().is_empty());

        store.save(&Credential::new("admin", "T1")).unwrap();
        let headers = gw.auth_header();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer T1");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());

        gw.logout();
        assert!(gw.auth_header().is_empty());
    }

    #[tokio::test]
    async fn expire_session_notifies_subscribers() {
        let (url, _backend) = start_backend(Some("T1"), false).await;
        let store = persisted("T1");
        let gw = gateway(&url, store.clone());
        gw.verify_on_boot().await;
        let mut watch = gw.watch();
        watch.observe();

        gw.expire_session();

        assert_eq!(watch.changed().await.unwrap(), Session::absent());
        assert!(store.load().is_none());
    }

    #[test]
    fn error_detail_extraction() {
        assert_eq!(
            error_detail(r#"{"detail":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(error_detail(r#"{"detail":[{"msg":"field required"}]}"#), None);
        assert_eq!(error_detail(r#"{"detail":"  "}"#), None);
        assert_eq!(error_detail("<html>502</html>"), None);
    }

    #[test]
    fn authorization_errors_are_401_and_403() {
        assert!(is_authorization_error(StatusCode::UNAUTHORIZED));
        assert!(is_authorization_error(StatusCode::FORBIDDEN));
        assert!(!is_authorization_error(StatusCode::NOT_FOUND));
        assert!(!is_authorization_error(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
