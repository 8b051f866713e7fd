//! API client for the CareCue backend auth endpoints.
//!
//! One request per call: no retries, no backoff. A request either gets a
//! response (success or a `Rejected` error carrying the backend's message)
//! or fails with a network/parse error.

use std::time::Duration;

use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::config::Config;
use crate::models::{Credentials, RegistrationPayload};

use super::ApiError;

/// `Authentication-Token`, the header carrying the auth token on
/// authenticated requests
pub const AUTH_TOKEN_HEADER: header::HeaderName = header::HeaderName::from_static("authentication-token");

const LOGIN_PATH: &str = "/api/v2/login";
const REGISTER_PATH: &str = "/api/v2/register";
const LOGOUT_PATH: &str = "/api/v2/logout";

/// Body of every success response that carries nothing but a message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub user: Option<LoginUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub auth_token: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    roles: Vec<RoleEntry>,
}

/// Roles arrive either as bare names or as role objects with a `name`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RoleEntry {
    Name(String),
    Object { name: String },
}

impl LoginUser {
    /// The token, if the backend issued a non-empty one
    pub fn token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.is_empty())
    }

    /// The first role listed; this is the role the client acts under.
    pub fn primary_role(&self) -> Option<&str> {
        self.roles.first().map(|r| match r {
            RoleEntry::Name(name) | RoleEntry::Object { name } => name.as_str(),
        })
    }
}

/// HTTP client for the auth endpoints.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    /// POST credentials to the login endpoint
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let request = self.client.post(self.url(LOGIN_PATH)).json(credentials);
        self.send(LOGIN_PATH, request).await
    }

    /// POST registration fields to the register endpoint
    pub async fn register(&self, payload: &RegistrationPayload) -> Result<MessageResponse, ApiError> {
        let request = self.client.post(self.url(REGISTER_PATH)).json(payload);
        self.send(REGISTER_PATH, request).await
    }

    /// POST to the logout endpoint with the token in the auth header
    pub async fn logout(&self, token: &str) -> Result<MessageResponse, ApiError> {
        let request = self
            .client
            .post(self.url(LOGOUT_PATH))
            .headers(Self::auth_headers(token)?);
        self.send(LOGOUT_PATH, request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(token: &str) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let mut value = header::HeaderValue::from_str(token)?;
        value.set_sensitive(true);
        headers.insert(AUTH_TOKEN_HEADER, value);
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        debug!(path, status = %response.status(), "Auth endpoint responded");

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} returned malformed JSON: {}", path, e)))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}
