//! Core library for the CareCue session client.
//!
//! Provides the pieces a front end needs to sign users in against the
//! CareCue backend and remember who they are between runs:
//!
//! - `storage`: durable key-value backends (memory, JSON file, OS keychain)
//! - `auth`: the `SessionStore` and the `AuthClient` built on top of it
//! - `api`: the raw HTTP client for the `/api/v2` auth endpoints
//! - `models`: user profile, role, credential and registration types
//! - `config`: configuration file and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

pub use auth::{AuthClient, AuthError, AuthOutcome, ErrorKind, SessionError, SessionState, SessionStore};
pub use config::{Config, StoreKind};
pub use models::{Credentials, RegistrationPayload, Role, UserProfile};
pub use storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StorageError};
