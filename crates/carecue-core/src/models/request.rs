use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login input. The backend accepts either a username or an email next to
/// the password; nothing is validated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    Username { username: String, password: String },
    Email { email: String, password: String },
}

impl Credentials {
    pub fn with_username(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Username {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn with_email(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Email {
            email: email.into(),
            password: password.into(),
        }
    }

    /// The username or email, for logging and for remembering the last login.
    pub fn identity(&self) -> &str {
        match self {
            Credentials::Username { username, .. } => username,
            Credentials::Email { email, .. } => email,
        }
    }
}

/// Arbitrary registration fields, sent to the backend as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationPayload {
    fields: Map<String, Value>,
}

impl RegistrationPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }
}
