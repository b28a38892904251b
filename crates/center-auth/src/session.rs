//! Observable session state
//!
//! The gateway is the only writer; everything else holds a `SessionWatch`,
//! a read-only subscription backed by a `tokio::sync::watch` channel. Every
//! transition is delivered to subscribers, nothing polls.

use tokio::sync::watch;

/// Whether the current credential has been confirmed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// A check (boot verification or login) is in flight
    Pending,
    Verified,
    Absent,
}

impl VerificationState {
    pub fn label(self) -> &'static str {
        match self {
            VerificationState::Pending => "pending",
            VerificationState::Verified => "verified",
            VerificationState::Absent => "absent",
        }
    }
}

/// Ephemeral view of who is signed in and how sure we are.
///
/// Holds only the username; the token stays in the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: Option<String>,
    pub state: VerificationState,
}

impl Session {
    pub fn absent() -> Self {
        Self {
            username: None,
            state: VerificationState::Absent,
        }
    }

    pub fn pending(username: Option<String>) -> Self {
        Self {
            username,
            state: VerificationState::Pending,
        }
    }

    pub fn verified(username: String) -> Self {
        Self {
            username: Some(username),
            state: VerificationState::Verified,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.state == VerificationState::Verified
    }
}

/// Read-only subscription to session transitions.
#[derive(Debug, Clone)]
pub struct SessionWatch {
    rx: watch::Receiver<Session>,
}

impl SessionWatch {
    pub(crate) fn new(rx: watch::Receiver<Session>) -> Self {
        Self { rx }
    }

    pub fn state(&self) -> VerificationState {
        self.rx.borrow().state
    }

    /// Snapshot that also marks the current value as seen, so the next
    /// `changed` waits for a newer transition.
    pub fn observe(&mut self) -> Session {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next transition and return the new session.
    ///
    /// Returns `None` once the gateway has been dropped.
    pub async fn changed(&mut self) -> Option<Session> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
