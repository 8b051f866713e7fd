//! Command handlers. Each opens the configured store, restores the
//! session and runs one auth operation against it.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use carecue_core::{
    AuthClient, AuthError, Config, Credentials, FileStore, KeyValueStore, KeyringStore,
    MemoryStore, RegistrationPayload, SessionState, SessionStore, StoreKind,
};

type DynStore = Box<dyn KeyValueStore>;

enum Identity {
    Username(String),
    Email(String),
}

fn open_store(kind: StoreKind) -> Result<DynStore> {
    let store: DynStore = match kind {
        StoreKind::File => {
            let store = FileStore::default_location()?;
            debug!(path = %store.path().display(), "Using file session store");
            Box::new(store)
        }
        StoreKind::Keyring => Box::new(KeyringStore::new()),
        StoreKind::Memory => {
            warn!("Memory session store selected; the session ends with this process");
            Box::new(MemoryStore::new())
        }
    };
    Ok(store)
}

fn auth_client(config: &Config) -> Result<AuthClient<DynStore>> {
    let store = open_store(config.store)?;
    AuthClient::from_config(config, store).map_err(fail)
}

/// Turn an auth failure into the error shown to the user: the
/// user-facing message first, the technical detail as its cause.
fn fail(err: AuthError) -> anyhow::Error {
    let message = err.message().to_string();
    anyhow::Error::new(err).context(message)
}

pub async fn login(config: &mut Config, username: Option<String>, email: Option<String>) -> Result<()> {
    let mut client = auth_client(config)?;

    let identity = match (username, email) {
        (_, Some(email)) => Identity::Email(email),
        (Some(username), None) => Identity::Username(username),
        (None, None) => {
            let remembered = std::env::var("CARECUE_USERNAME")
                .ok()
                .filter(|u| !u.is_empty())
                .or_else(|| config.last_username.clone());
            match remembered {
                Some(u) if u.contains('@') => Identity::Email(u),
                Some(u) => Identity::Username(u),
                None => Identity::Username(prompt_username()?),
            }
        }
    };

    let password = match std::env::var("CARECUE_PASSWORD") {
        Ok(p) if !p.is_empty() => p,
        _ => prompt_password()?,
    };

    let credentials = match identity {
        Identity::Username(username) => Credentials::with_username(username, password),
        Identity::Email(email) => Credentials::with_email(email, password),
    };

    println!("Authenticating...");
    let outcome = client.login(&credentials).await.map_err(fail)?;

    if let Err(e) = config.remember_username(credentials.identity()) {
        warn!(error = %e, "Failed to save config");
    }

    println!("{}", outcome.message);
    print_session(client.session());
    Ok(())
}

pub async fn register(config: &Config, fields: Vec<(String, String)>) -> Result<()> {
    let client = auth_client(config)?;

    let mut payload = RegistrationPayload::new();
    for (key, value) in fields {
        payload.insert(key, value);
    }
    if !payload.contains("password") {
        payload.insert("password", prompt_password()?);
    }

    let outcome = client.register(&payload).await.map_err(fail)?;
    println!("{}", outcome.message);
    Ok(())
}

pub async fn logout(config: &Config, local: bool) -> Result<()> {
    if local {
        // No restore: an unreadable session must still be clearable
        let mut session = SessionStore::new(open_store(config.store)?);
        session.clear().context("Failed to clear local session")?;
        println!("Local session cleared");
        return Ok(());
    }

    let mut client = auth_client(config)?;
    let outcome = client.logout().await.map_err(fail)?;
    println!("{}", outcome.message);
    Ok(())
}

pub fn status(config: &Config) -> Result<()> {
    let store = open_store(config.store)?;
    let session = SessionStore::restore(store).context("Failed to read session")?;
    print_session(&session);
    Ok(())
}

fn print_session<S: KeyValueStore>(session: &SessionStore<S>) {
    match session.state() {
        SessionState::Anonymous => println!("Not logged in"),
        SessionState::TokenOnly { .. } => {
            println!("Logged in (profile missing - log in again to refresh it)");
        }
        SessionState::Authenticated { user, .. } => {
            let role = user.role_kind();
            println!("Logged in as {}", user.username);
            println!("  Email:     {}", user.email);
            println!("  Role:      {}", user.role);
            println!("  Dashboard: {}", role.dashboard_path());
        }
    }
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}
