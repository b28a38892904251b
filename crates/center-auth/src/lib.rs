//! Admin session authentication for the center back office
//!
//! Owns the one credential the admin client ever holds and decides whether
//! protected views may render. This crate has no knowledge of the content
//! resources; it only talks to the backend's login and verify endpoints.
//!
//! Session flow:
//! 1. `credentials::FileSessionStore::open()` restores a persisted credential
//! 2. `gateway::AuthGateway::verify_on_boot()` confirms it with the backend
//! 3. `guard::RouteGuard` watches the session and renders or redirects
//! 4. API calls attach `AuthGateway::auth_header()`; an authorization error
//!    from any of them ends the session via `AuthGateway::expire_session()`
//! 5. `AuthGateway::login()` / `AuthGateway::logout()` drive the rest

pub mod constants;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod guard;
mod metrics;
pub mod session;

pub use constants::*;
pub use credentials::{Credential, FileSessionStore, MemorySessionStore, SessionStore};
pub use error::{Error, Result};
pub use gateway::AuthGateway;
pub use guard::{GuardDecision, GuardOutcome, RouteGuard};
pub use session::{Session, SessionWatch, VerificationState};
