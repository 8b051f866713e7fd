//! REST API client module for the CareCue backend.
//!
//! This module provides the `ApiClient` for the three `/api/v2` auth
//! endpoints (login, register, logout) and the wire types they exchange.
//!
//! Authenticated requests carry the token in an `Authentication-Token`
//! header rather than a bearer `Authorization` header.

pub mod client;
pub mod error;

pub use client::{ApiClient, LoginResponse, LoginUser, MessageResponse, AUTH_TOKEN_HEADER};
pub use error::ApiError;
