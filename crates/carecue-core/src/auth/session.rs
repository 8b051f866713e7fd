use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Role, UserProfile};
use crate::storage::{KeyValueStore, StorageError};

/// Storage key holding the raw auth token
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the JSON-encoded `UserProfile`
pub const USER_DETAILS_KEY: &str = "user_details";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No user profile in session")]
    NoProfile,

    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode user profile: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What the session currently is, as seen through the in-memory view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState<'a> {
    Anonymous,
    /// A token without a readable profile, e.g. after an interrupted write
    /// or a hand-edited storage file. Counts as authenticated.
    TokenOnly { token: &'a str },
    Authenticated { token: &'a str, user: &'a UserProfile },
}

/// The token and profile of the current user, mirrored between memory and
/// a durable `KeyValueStore`.
///
/// Writes (`set_token`, `set_user_details`) only touch storage; the
/// in-memory view follows on `update_token` / `update_user`. Removals
/// clear both.
pub struct SessionStore<S> {
    storage: S,
    token: Option<String>,
    user: Option<UserProfile>,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// An empty in-memory view over `storage`. Nothing is read yet.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            token: None,
            user: None,
        }
    }

    /// Open `storage` and load whatever session it holds.
    pub fn restore(storage: S) -> Result<Self, SessionError> {
        let mut session = Self::new(storage);
        session.update_token()?;
        session.update_user()?;
        debug!(authenticated = session.is_authenticated(), "Session restored");
        Ok(session)
    }

    pub fn state(&self) -> SessionState<'_> {
        match (self.token.as_deref(), self.user.as_ref()) {
            (None, _) => SessionState::Anonymous,
            (Some(token), None) => SessionState::TokenOnly { token },
            (Some(token), Some(user)) => SessionState::Authenticated { token, user },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The profile, only while a token is also held
    pub fn profile(&self) -> Option<&UserProfile> {
        match self.state() {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn username(&self) -> Result<&str, SessionError> {
        Ok(&self.require_profile()?.username)
    }

    pub fn email(&self) -> Result<&str, SessionError> {
        Ok(&self.require_profile()?.email)
    }

    pub fn role(&self) -> Result<&str, SessionError> {
        Ok(&self.require_profile()?.role)
    }

    pub fn role_kind(&self) -> Result<Role, SessionError> {
        Ok(self.require_profile()?.role_kind())
    }

    fn require_profile(&self) -> Result<&UserProfile, SessionError> {
        self.profile().ok_or(SessionError::NoProfile)
    }

    // ===== Durable writes =====

    pub fn set_token(&mut self, token: &str) -> Result<(), SessionError> {
        self.storage.set(TOKEN_KEY, token)?;
        Ok(())
    }

    pub fn remove_token(&mut self) -> Result<(), SessionError> {
        self.storage.remove(TOKEN_KEY)?;
        self.token = None;
        Ok(())
    }

    pub fn set_user_details(&mut self, profile: &UserProfile) -> Result<(), SessionError> {
        let encoded = serde_json::to_string(profile)?;
        self.storage.set(USER_DETAILS_KEY, &encoded)?;
        Ok(())
    }

    pub fn remove_user_details(&mut self) -> Result<(), SessionError> {
        self.storage.remove(USER_DETAILS_KEY)?;
        self.user = None;
        Ok(())
    }

    /// Read the persisted profile without touching the in-memory view.
    /// Unparseable profiles read as `None`.
    pub fn stored_user_details(&self) -> Result<Option<UserProfile>, SessionError> {
        let Some(raw) = self.storage.get(USER_DETAILS_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable stored user details");
                Ok(None)
            }
        }
    }

    // ===== Resync from storage =====

    pub fn update_token(&mut self) -> Result<(), SessionError> {
        self.token = self.storage.get(TOKEN_KEY)?;
        Ok(())
    }

    pub fn update_user(&mut self) -> Result<(), SessionError> {
        self.user = self.stored_user_details()?;
        Ok(())
    }

    /// Remove token and profile from storage and memory.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.remove_token()?;
        self.remove_user_details()?;
        self.update_token()?;
        self.update_user()?;
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};

    fn profile() -> UserProfile {
        UserProfile::new("a", "user", "a@x.com")
    }

    #[test]
    fn test_new_session_is_anonymous() {
        let session = SessionStore::new(MemoryStore::new());
        assert!(!session.is_authenticated());
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(matches!(session.username(), Err(SessionError::NoProfile)));
        assert!(matches!(session.email(), Err(SessionError::NoProfile)));
        assert!(matches!(session.role(), Err(SessionError::NoProfile)));
    }

    #[test]
    fn test_writes_are_visible_after_update() {
        let mut session = SessionStore::new(MemoryStore::new());
        session.set_user_details(&profile()).unwrap();
        session.set_token("T1").unwrap();

        // Not yet synced
        assert!(!session.is_authenticated());

        session.update_token().unwrap();
        session.update_user().unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("T1"));
        assert_eq!(session.username().unwrap(), "a");
        assert_eq!(session.email().unwrap(), "a@x.com");
        assert_eq!(session.role().unwrap(), "user");
        assert_eq!(session.role_kind().unwrap(), Role::User);
    }

    #[test]
    fn test_user_details_round_trip() {
        let mut session = SessionStore::new(MemoryStore::new());
        let p = UserProfile::new("Ana María", "tertiary_user", "ana@example.org");
        session.set_user_details(&p).unwrap();

        assert_eq!(session.stored_user_details().unwrap(), Some(p.clone()));

        let raw = session.storage().get(USER_DETAILS_KEY).unwrap().unwrap();
        let parsed: UserProfile = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, p);
    }

    #[test]
    fn test_token_without_profile_is_token_only() {
        let mut storage = MemoryStore::new();
        storage.set(TOKEN_KEY, "T1").unwrap();

        let session = SessionStore::restore(storage).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.state(), SessionState::TokenOnly { token: "T1" });
        assert!(matches!(session.username(), Err(SessionError::NoProfile)));
    }

    #[test]
    fn test_profile_without_token_is_anonymous() {
        let mut storage = MemoryStore::new();
        storage.set(USER_DETAILS_KEY, r#"{"username":"a","role":"user","email":"a@x.com"}"#).unwrap();

        let session = SessionStore::restore(storage).unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.profile(), None);
    }

    #[test]
    fn test_corrupt_profile_reads_as_absent() {
        let mut storage = MemoryStore::new();
        storage.set(TOKEN_KEY, "T1").unwrap();
        storage.set(USER_DETAILS_KEY, "{not json").unwrap();

        let session = SessionStore::restore(storage).unwrap();
        assert_eq!(session.state(), SessionState::TokenOnly { token: "T1" });
        assert_eq!(session.stored_user_details().unwrap(), None);
    }

    #[test]
    fn test_removals_clear_memory_immediately() {
        let mut storage = MemoryStore::new();
        storage.set(TOKEN_KEY, "T1").unwrap();
        storage.set(USER_DETAILS_KEY, &serde_json::to_string(&profile()).unwrap()).unwrap();
        let mut session = SessionStore::restore(storage).unwrap();
        assert!(session.profile().is_some());

        session.remove_token().unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.storage().get(TOKEN_KEY).unwrap(), None);

        session.remove_user_details().unwrap();
        assert_eq!(session.stored_user_details().unwrap(), None);
    }

    #[test]
    fn test_clear() {
        let mut session = SessionStore::new(MemoryStore::new());
        session.set_user_details(&profile()).unwrap();
        session.set_token("T1").unwrap();
        session.update_token().unwrap();
        session.update_user().unwrap();

        session.clear().unwrap();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.into_storage().is_empty());
    }

    #[test]
    fn test_restore_from_file_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = SessionStore::new(FileStore::new(&path));
        session.set_user_details(&UserProfile::new("c", "caretaker", "c@x.com")).unwrap();
        session.set_token("T9").unwrap();
        drop(session);

        let restored = SessionStore::restore(FileStore::new(&path)).unwrap();
        assert_eq!(restored.token(), Some("T9"));
        assert_eq!(restored.role_kind().unwrap(), Role::Caretaker);
        assert_eq!(restored.role_kind().unwrap().dashboard_path(), "/caretaker");
    }
}
