//! Login, registration and logout, with the session kept in step.

use tracing::{error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::models::{Credentials, RegistrationPayload, UserProfile};
use crate::storage::KeyValueStore;

use super::{AuthError, SessionError, SessionStore};

/// Successful outcome of an auth operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    /// The backend's message, e.g. "Login successful"
    pub message: String,
}

/// Auth operations against the backend, owning the session they affect.
pub struct AuthClient<S> {
    api: ApiClient,
    session: SessionStore<S>,
}

impl<S: KeyValueStore> AuthClient<S> {
    pub fn new(api: ApiClient, session: SessionStore<S>) -> Self {
        Self { api, session }
    }

    /// Build the HTTP client from `config` and restore the session held in
    /// `storage`.
    pub fn from_config(config: &Config, storage: S) -> Result<Self, AuthError> {
        let api = ApiClient::new(config)?;
        let session = SessionStore::restore(storage)?;
        Ok(Self::new(api, session))
    }

    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    pub fn into_session(self) -> SessionStore<S> {
        self.session
    }

    /// Log in and persist the issued token and profile.
    ///
    /// Nothing is persisted unless the backend returns both a token and at
    /// least one role.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<AuthOutcome, AuthError> {
        let identity = credentials.identity();
        let response = self
            .api
            .login(credentials)
            .await
            .map_err(|e| log_failure("login", e))?;

        let Some(user) = response.user.as_ref() else {
            warn!(identity, "Login succeeded without a user record");
            return Err(AuthError::MissingToken { message: response.message });
        };
        let Some(token) = user.token() else {
            warn!(identity, "Login succeeded without an auth token");
            return Err(AuthError::MissingToken { message: response.message });
        };
        let Some(role) = user.primary_role() else {
            warn!(identity, "Login response listed no roles");
            return Err(AuthError::InvalidResponse("login response listed no roles".to_string()));
        };

        let profile = UserProfile::new(user.username.clone(), role, user.email.clone());

        // Drop any previous token before the new profile lands, so a failed
        // write can never pair one user's token with another's profile.
        if let Err(e) = self.persist_login(token, &profile) {
            error!(error = %e, "Failed to save session, clearing it");
            if let Err(clear_err) = self.session.clear() {
                warn!(error = %clear_err, "Failed to clear partially saved session");
            }
            return Err(e.into());
        }

        info!(username = %profile.username, role = %profile.role, "Login successful");
        Ok(AuthOutcome { message: response.message })
    }

    fn persist_login(&mut self, token: &str, profile: &UserProfile) -> Result<(), SessionError> {
        self.session.remove_token()?;
        self.session.set_user_details(profile)?;
        self.session.set_token(token)?;
        self.session.update_token()?;
        self.session.update_user()
    }

    /// Register a new account. The session is never touched.
    pub async fn register(&self, payload: &RegistrationPayload) -> Result<AuthOutcome, AuthError> {
        let response = self
            .api
            .register(payload)
            .await
            .map_err(|e| log_failure("register", e))?;

        info!("Registration accepted");
        Ok(AuthOutcome { message: response.message })
    }

    /// Log out on the backend, then clear the local session.
    ///
    /// If the backend refuses or cannot be reached, the local session is
    /// kept; use `forget` to drop it regardless.
    pub async fn logout(&mut self) -> Result<AuthOutcome, AuthError> {
        let Some(token) = self.session.token() else {
            return Err(AuthError::NotAuthenticated);
        };

        let response = self.api.logout(token).await.map_err(|e| {
            let err = log_failure("logout", e);
            warn!("Logout failed, local session kept");
            err
        })?;

        self.session.clear()?;
        info!("Logged out");
        Ok(AuthOutcome { message: response.message })
    }

    /// Drop the local session without contacting the backend.
    pub fn forget(&mut self) -> Result<(), AuthError> {
        self.session.clear()?;
        info!("Local session cleared");
        Ok(())
    }
}

fn log_failure(operation: &str, err: ApiError) -> AuthError {
    let err = AuthError::from(err);
    match &err {
        AuthError::Rejected { status, message } => {
            warn!(operation, %status, message = %message, "Request rejected by backend");
        }
        other => {
            error!(operation, kind = %other.kind(), error = %other, "Request failed");
        }
    }
    err
}
