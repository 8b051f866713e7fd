//! Data models for CareCue users.
//!
//! - `UserProfile`: the profile persisted alongside the auth token
//! - `Role`: the three dashboard roles plus anything else the backend sends
//! - `Credentials`, `RegistrationPayload`: request bodies passed through
//!   to the backend as-is

pub mod profile;
pub mod request;

pub use profile::{Role, UserProfile};
pub use request::{Credentials, RegistrationPayload};
