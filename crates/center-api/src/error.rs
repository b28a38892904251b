//! Resource access errors

/// Errors from reading or writing backend resources.
///
/// Read failures render an empty/error view; write failures become a
/// transient notice. `SessionExpired` means the gateway has already signed
/// the admin out.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("failed to load {resource}: {reason}")]
    ResourceReadFailed {
        resource: &'static str,
        reason: String,
    },

    #[error("failed to save {resource}: {reason}")]
    ResourceWriteFailed {
        resource: &'static str,
        reason: String,
    },

    #[error("session expired")]
    SessionExpired,
}

impl ApiError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}

/// Result alias for resource operations.
pub type Result<T> = std::result::Result<T, ApiError>;
