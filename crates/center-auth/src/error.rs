//! Error types for admin authentication

/// Errors from login, verification, and session storage.
///
/// `InvalidCredentials` carries the text meant for the login form verbatim,
/// so its Display is the bare message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("backend unreachable: {0}")]
    NetworkFailure(String),

    #[error("session expired")]
    SessionExpired,

    #[error("unexpected auth response: {0}")]
    UnexpectedResponse(String),

    #[error("session storage failed: {0}")]
    Storage(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
