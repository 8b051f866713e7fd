use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

use super::SessionError;

/// Shown to users when the failure is ours or the network's rather than a
/// decision by the backend.
pub const GENERIC_FAILURE_MESSAGE: &str = "Oops! Something Went Wrong";

/// Coarse failure category for callers that branch on the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The backend answered with a non-success status
    Rejected,
    /// Login succeeded at the HTTP level but no token was issued
    MissingToken,
    /// The backend's reply could not be understood
    InvalidResponse,
    /// The request never got a response
    Network,
    /// The operation needs a session and there is none
    NotAuthenticated,
    /// Reading or writing the session failed
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Rejected => "rejected",
            ErrorKind::MissingToken => "missing token",
            ErrorKind::InvalidResponse => "invalid response",
            ErrorKind::Network => "network",
            ErrorKind::NotAuthenticated => "not authenticated",
            ErrorKind::Storage => "storage",
        })
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Login response did not include an auth token (backend said: {message})")]
    MissingToken { message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Rejected { .. } => ErrorKind::Rejected,
            AuthError::MissingToken { .. } => ErrorKind::MissingToken,
            AuthError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            AuthError::Network(_) => ErrorKind::Network,
            AuthError::NotAuthenticated => ErrorKind::NotAuthenticated,
            AuthError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Message suitable for showing to the user. Only backend rejections
    /// pass the backend's own message through; everything else is generic.
    pub fn message(&self) -> &str {
        match self {
            AuthError::Rejected { message, .. } => message.as_str(),
            AuthError::NotAuthenticated => "You are not logged in",
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AuthError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected { status, message } => AuthError::Rejected { status, message },
            ApiError::NetworkError(e) if e.is_decode() => AuthError::InvalidResponse(e.to_string()),
            ApiError::NetworkError(e) => AuthError::Network(e),
            ApiError::InvalidResponse(detail) => AuthError::InvalidResponse(detail),
            ApiError::InvalidHeader(e) => AuthError::InvalidResponse(format!("stored token is not a valid header value: {}", e)),
        }
    }
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Storage(e) => AuthError::Storage(e),
            SessionError::NoProfile => AuthError::NotAuthenticated,
            SessionError::Encode(e) => AuthError::InvalidResponse(format!("profile could not be encoded: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_passes_backend_message() {
        let err: AuthError = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"message": "Invalid password"}"#).into();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(err.message(), "Invalid password");
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_internal_failures_use_generic_message() {
        let err: AuthError = ApiError::InvalidResponse("truncated body".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert_eq!(err.message(), GENERIC_FAILURE_MESSAGE);
        assert!(err.to_string().contains("truncated body"));

        // A 2xx body without a token never reads as a success to the user
        let err = AuthError::MissingToken { message: "Login successful".to_string() };
        assert_eq!(err.message(), GENERIC_FAILURE_MESSAGE);
        assert!(err.to_string().contains("Login successful"));
    }

    #[test]
    fn test_session_errors_map_to_kinds() {
        let err: AuthError = SessionError::NoProfile.into();
        assert_eq!(err.kind(), ErrorKind::NotAuthenticated);

        let err: AuthError = SessionError::Storage(StorageError::NoDataDir).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.message(), GENERIC_FAILURE_MESSAGE);
    }
}
