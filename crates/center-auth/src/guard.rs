//! Route guard for protected admin views
//!
//! Pure presentation logic over session state: it never calls the backend.
//! `Pending` renders nothing and does not redirect yet, `Absent` redirects
//! to the login route, `Verified` renders the guarded content unchanged.
//! The guard subscribes to session transitions, so a session that ends
//! mid-visit turns into a redirect without restarting anything.

use crate::constants::LOGIN_ROUTE;
use crate::session::{SessionWatch, VerificationState};

/// What the guarded subtree should do for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Verification in flight: render a neutral placeholder, no redirect
    Wait,
    /// Navigate to the login entry point
    Redirect(String),
    Render,
}

/// Result of rendering through the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome<T> {
    Waiting,
    Redirected(String),
    Rendered(T),
}

impl<T> GuardOutcome<T> {
    pub fn rendered(self) -> Option<T> {
        match self {
            GuardOutcome::Rendered(value) => Some(value),
            _ => None,
        }
    }
}

/// Decision for a verification state. No side effects.
pub fn decide(state: VerificationState, login_route: &str) -> GuardDecision {
    match state {
        VerificationState::Pending => GuardDecision::Wait,
        VerificationState::Absent => GuardDecision::Redirect(login_route.to_owned()),
        VerificationState::Verified => GuardDecision::Render,
    }
}

pub struct RouteGuard {
    session: SessionWatch,
    login_route: String,
}

impl RouteGuard {
    pub fn new(session: SessionWatch) -> Self {
        Self::with_login_route(session, LOGIN_ROUTE)
    }

    pub fn with_login_route(session: SessionWatch, login_route: impl Into<String>) -> Self {
        Self {
            session,
            login_route: login_route.into(),
        }
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Decision for the session as it is right now.
    pub fn decision(&self) -> GuardDecision {
        decide(self.session.state(), &self.login_route)
    }

    /// Wait out any in-flight verification and return the first settled
    /// decision (`Render` or `Redirect`).
    ///
    /// If the gateway goes away while still pending, redirects.
    pub async fn settled(&mut self) -> GuardDecision {
        loop {
            let decision = decide(self.session.observe().state, &self.login_route);
            if decision != GuardDecision::Wait {
                return decision;
            }
            if self.session.changed().await.is_none() {
                return GuardDecision::Redirect(self.login_route.clone());
            }
        }
    }

    /// Wait for the next session transition and re-evaluate.
    ///
    /// Returns `None` once the gateway has been dropped.
    pub async fn next_decision(&mut self) -> Option<GuardDecision> {
        let session = self.session.changed().await?;
        Some(decide(session.state, &self.login_route))
    }

    /// Run `render` only when the session is verified.
    pub fn render<T>(&self, render: impl FnOnce() -> T) -> GuardOutcome<T> {
        match self.decision() {
            GuardDecision::Wait => GuardOutcome::Waiting,
            GuardDecision::Redirect(route) => GuardOutcome::Redirected(route),
            GuardDecision::Render => GuardOutcome::Rendered(render()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credential, MemorySessionStore};
    use crate::gateway::AuthGateway;
    use crate::session::Session;
    use std::sync::Arc;
    use std::time::Duration;

    /// Gateway pointed at a port nothing listens on; these tests never
    /// trigger a network call except where noted.
    fn offline_gateway(store: MemorySessionStore) -> AuthGateway {
        AuthGateway::new(reqwest::Client::new(), "http://127.0.0.1:9", Arc::new(store))
    }

    fn signed_in_store() -> MemorySessionStore {
        MemorySessionStore::with_credential(Credential::new("admin", "T1"))
    }

    #[test]
    fn decisions_per_state() {
        assert_eq!(decide(VerificationState::Pending, "/admin/login"), GuardDecision::Wait);
        assert_eq!(
            decide(VerificationState::Absent, "/admin/login"),
            GuardDecision::Redirect("/admin/login".into())
        );
        assert_eq!(decide(VerificationState::Verified, "/admin/login"), GuardDecision::Render);
    }

    #[test]
    fn pending_session_renders_nothing_and_does_not_redirect() {
        let gw = offline_gateway(signed_in_store());
        let guard = RouteGuard::new(gw.watch());
        let mut called = false;

        let outcome = guard.render(|| called = true);

        assert_eq!(outcome, GuardOutcome::Waiting);
        assert!(!called, "protected content must not render while pending");
    }

    #[test]
    fn absent_session_redirects_to_login() {
        let gw = offline_gateway(MemorySessionStore::new());
        let guard = RouteGuard::new(gw.watch());

        let outcome = guard.render(|| "dashboard");

        assert_eq!(outcome, GuardOutcome::Redirected(LOGIN_ROUTE.into()));
        assert_eq!(outcome.rendered(), None);
    }

    #[tokio::test]
    async fn settled_waits_for_pending_to_resolve() {
        let gw = Arc::new(offline_gateway(signed_in_store()));
        let mut guard = RouteGuard::new(gw.watch());
        assert_eq!(guard.decision(), GuardDecision::Wait);

        let waiter = tokio::spawn(async move { guard.settled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished(), "guard must not settle while pending");

        // Unreachable backend: verification fails and signs out
        gw.verify_on_boot().await;

        assert_eq!(
            waiter.await.unwrap(),
            GuardDecision::Redirect(LOGIN_ROUTE.into())
        );
    }

    #[tokio::test]
    async fn session_loss_redirects_without_restart() {
        let gw = offline_gateway(signed_in_store());
        let mut guard = RouteGuard::new(gw.watch());

        gw.expire_session();

        assert_eq!(
            guard.next_decision().await,
            Some(GuardDecision::Redirect(LOGIN_ROUTE.into()))
        );
        assert_eq!(
            guard.render(|| "appointments"),
            GuardOutcome::Redirected(LOGIN_ROUTE.into())
        );
    }

    #[tokio::test]
    async fn guard_tracks_every_transition() {
        let (tx, rx) = tokio::sync::watch::channel(Session::pending(Some("admin".into())));
        let mut guard = RouteGuard::new(crate::session::SessionWatch::new(rx));
        let mut rendered = Vec::new();

        for next in [
            Session::verified("admin".into()),
            Session::absent(),
            Session::pending(None),
            Session::verified("admin".into()),
        ] {
            let verified = next.is_verified();
            tx.send_replace(next);
            let decision = guard.next_decision().await.unwrap();
            assert_eq!(decision == GuardDecision::Render, verified);
            if let GuardOutcome::Rendered(v) = guard.render(|| "admin view") {
                rendered.push(v);
            }
        }

        assert_eq!(rendered, vec!["admin view", "admin view"]);
    }

    #[tokio::test]
    async fn settled_redirects_if_gateway_is_dropped_while_pending() {
        let gw = offline_gateway(signed_in_store());
        let mut guard = RouteGuard::new(gw.watch());
        drop(gw);

        assert_eq!(
            guard.settled().await,
            GuardDecision::Redirect(LOGIN_ROUTE.into())
        );
    }

    #[test]
    fn custom_login_route() {
        let gw = offline_gateway(MemorySessionStore::new());
        let guard = RouteGuard::with_login_route(gw.watch(), "/login");
        assert_eq!(guard.login_route(), "/login");
        assert_eq!(guard.decision(), GuardDecision::Redirect("/login".into()));
    }
}
