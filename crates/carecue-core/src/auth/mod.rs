//! Authentication module for managing the user's session.
//!
//! This module provides:
//! - `SessionStore`: token and profile mirrored to durable storage
//! - `AuthClient`: login, register and logout against the backend,
//!   keeping the `SessionStore` in step with the results
//!
//! There is no token refresh or expiry handling; a session lasts until
//! logout or until the stored token is removed.

pub mod client;
pub mod error;
pub mod session;

pub use client::{AuthClient, AuthOutcome};
pub use error::{AuthError, ErrorKind, GENERIC_FAILURE_MESSAGE};
pub use session::{SessionError, SessionState, SessionStore, TOKEN_KEY, USER_DETAILS_KEY};
