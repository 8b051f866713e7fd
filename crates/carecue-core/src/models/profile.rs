use std::fmt;

use serde::{Deserialize, Serialize};

/// The subset of the backend's user record kept on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub role: String,
    pub email: String,
}

impl UserProfile {
    pub fn new(username: impl Into<String>, role: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: role.into(),
            email: email.into(),
        }
    }

    pub fn role_kind(&self) -> Role {
        Role::parse(&self.role)
    }
}

/// Role names as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Caretaker,
    TertiaryUser,
    Other(String),
}

impl Role {
    /// Parse a backend role name. Matching ignores case and treats
    /// `tertiary_user`, `tertiary-user` and `tertiary user` alike.
    pub fn parse(s: &str) -> Self {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "user" => Role::User,
            "caretaker" => Role::Caretaker,
            "tertiaryuser" => Role::TertiaryUser,
            _ => Role::Other(s.to_string()),
        }
    }

    /// Landing page for the role's dashboard. Unknown roles land on home.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::User => "/userdashboard",
            Role::Caretaker => "/caretaker",
            Role::TertiaryUser => "/tertiaryuser",
            Role::Other(_) => "/",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Caretaker => "caretaker",
            Role::TertiaryUser => "tertiary_user",
            Role::Other(s) => s,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("Caretaker"), Role::Caretaker);
        assert_eq!(Role::parse("tertiary_user"), Role::TertiaryUser);
        assert_eq!(Role::parse("Tertiary User"), Role::TertiaryUser);
        assert_eq!(Role::parse("admin"), Role::Other("admin".to_string()));
    }

    #[test]
    fn test_dashboard_paths() {
        assert_eq!(Role::User.dashboard_path(), "/userdashboard");
        assert_eq!(Role::Caretaker.dashboard_path(), "/caretaker");
        assert_eq!(Role::TertiaryUser.dashboard_path(), "/tertiaryuser");
        assert_eq!(Role::parse("admin").dashboard_path(), "/");
    }

    #[test]
    fn test_profile_json_round_trip() {
        let profile = UserProfile::new("a", "caretaker", "a@x.com");
        let json = serde_json::to_string(&profile).unwrap();
        let parsed: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, profile);
        assert_eq!(parsed.role_kind(), Role::Caretaker);
    }
}
