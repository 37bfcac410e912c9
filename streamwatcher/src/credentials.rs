//! Twitch credentials and where they come from.

use std::fmt;

use twitch_client::{clean_client_id, clean_token};
use watch_db::credentials::StoredCredentials;
use watch_db::{Database, DbError};

use crate::config::ConfigFile;

pub const ENV_CLIENT_ID: &str = "TWITCH_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "TWITCH_CLIENT_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "TWITCH_ACCESS_TOKEN";

/// Client id plus app access token, with an optional secret that allows
/// minting a new token when the current one expires.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub access_token: String,
    pub client_secret: Option<String>,
}

impl Credentials {
    /// Build cleaned credentials. Empty secrets are dropped.
    pub fn new(client_id: &str, access_token: &str, client_secret: Option<&str>) -> Self {
        Self {
            client_id: clean_client_id(client_id),
            access_token: clean_token(access_token),
            client_secret: client_secret.map(clean_token).filter(|s| !s.is_empty()),
        }
    }

    pub fn has_secret(&self) -> bool {
        self.client_secret.is_some()
    }

    pub fn has_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    pub fn with_token(&self, access_token: String) -> Self {
        Self {
            access_token,
            ..self.clone()
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("has_token", &self.has_token())
            .field("has_secret", &self.has_secret())
            .finish()
    }
}

impl From<StoredCredentials> for Credentials {
    fn from(stored: StoredCredentials) -> Self {
        Self::new(
            &stored.client_id,
            &stored.access_token,
            stored.client_secret.as_deref(),
        )
    }
}

impl From<&Credentials> for StoredCredentials {
    fn from(creds: &Credentials) -> Self {
        Self {
            client_id: creds.client_id.clone(),
            access_token: creds.access_token.clone(),
            client_secret: creds.client_secret.clone(),
        }
    }
}

/// Where the active credentials were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    ConfigFile,
    Environment,
    LocalStore,
    ManualEntry,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ConfigFile => "config file",
            Self::Environment => "environment variables",
            Self::LocalStore => "local store",
            Self::ManualEntry => "manual entry",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    pub credentials: Credentials,
    pub source: CredentialSource,
}

impl ResolvedCredentials {
    pub fn describe(&self) -> String {
        let refresh = if self.credentials.has_secret() {
            "auto-refresh enabled"
        } else {
            "no auto-refresh"
        };
        format!("{} ({refresh})", self.source)
    }
}

/// Persistence for credentials the poller mints or invalidates.
pub trait CredentialStore: Send + Sync {
    fn save(&self, creds: &Credentials) -> Result<(), DbError>;
    fn clear(&self) -> Result<(), DbError>;
}

impl CredentialStore for Database {
    fn save(&self, creds: &Credentials) -> Result<(), DbError> {
        tracing::info!(
            secret_included = creds.has_secret(),
            "Saving Twitch credentials"
        );
        self.save_credentials(&StoredCredentials::from(creds))
    }

    fn clear(&self) -> Result<(), DbError> {
        tracing::info!("Clearing saved Twitch credentials");
        self.clear_credentials()
    }
}

/// Find credentials: config file, then environment, then the local store.
///
/// The first source with a non-empty client id wins. Manual entry is the
/// caller's fallback when this returns `None`.
pub fn resolve_credentials(
    file: Option<&ConfigFile>,
    env: impl Fn(&str) -> Option<String>,
    db: &Database,
) -> Result<Option<ResolvedCredentials>, DbError> {
    if let Some(file) = file {
        if let Some(creds) = usable(
            file.client_id.as_deref(),
            file.access_token.as_deref(),
            file.client_secret.as_deref(),
        ) {
            return Ok(Some(resolved(creds, CredentialSource::ConfigFile)));
        }
    }

    let (id, token, secret) = (
        env(ENV_CLIENT_ID),
        env(ENV_ACCESS_TOKEN),
        env(ENV_CLIENT_SECRET),
    );
    if let Some(creds) = usable(id.as_deref(), token.as_deref(), secret.as_deref()) {
        return Ok(Some(resolved(creds, CredentialSource::Environment)));
    }

    if let Some(stored) = db.get_credentials()? {
        let creds = Credentials::from(stored);
        if !creds.client_id.is_empty() {
            return Ok(Some(resolved(creds, CredentialSource::LocalStore)));
        }
    }

    Ok(None)
}

fn usable(
    client_id: Option<&str>,
    access_token: Option<&str>,
    client_secret: Option<&str>,
) -> Option<Credentials> {
    let creds = Credentials::new(
        client_id.unwrap_or_default(),
        access_token.unwrap_or_default(),
        client_secret,
    );
    (!creds.client_id.is_empty()).then_some(creds)
}

fn resolved(credentials: Credentials, source: CredentialSource) -> ResolvedCredentials {
    tracing::info!(
        source = %source,
        secret_present = credentials.has_secret(),
        "Resolved Twitch credentials"
    );
    ResolvedCredentials {
        credentials,
        source,
    }
}
