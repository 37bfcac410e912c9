//! Twitch integration client library.
//!
//! Provides the client-credentials token exchange, batched Helix stream
//! lookups and a lightweight credential probe.

pub mod api;
pub mod auth;
#[cfg(test)]
mod test_support;

pub use api::TwitchApiClient;
pub use auth::TwitchAuth;

use serde::{Deserialize, Serialize};

/// Normalized live/offline record for one channel.
///
/// Timestamps are unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatus {
    pub name: String,
    pub is_live: bool,
    pub title: Option<String>,
    pub game: Option<String>,
    pub viewers: Option<String>,
    pub thumbnail_url: Option<String>,
    pub last_checked: i64,
    pub last_changed: i64,
}

impl ChannelStatus {
    /// Offline record with no stream metadata.
    pub fn offline(name: impl Into<String>, last_checked: i64, last_changed: i64) -> Self {
        Self {
            name: name.into(),
            is_live: false,
            title: None,
            game: None,
            viewers: None,
            thumbnail_url: None,
            last_checked,
            last_changed,
        }
    }
}

/// Unified error type for the twitch-client crate.
#[derive(Debug, thiserror::Error)]
pub enum TwitchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unauthorized: invalid Client ID or Access Token ({0})")]
    Unauthorized(String),

    #[error("Twitch API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl TwitchError {
    /// Whether the error means the token was rejected and a refresh may help.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether the error came from the transport rather than from Twitch.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Strip a pasted `Bearer ` or `oauth:` prefix and surrounding whitespace.
pub fn clean_token(raw: &str) -> String {
    let mut token = raw.trim();
    for prefix in ["bearer ", "oauth:"] {
        if token.len() >= prefix.len()
            && token.is_char_boundary(prefix.len())
            && token[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            token = token[prefix.len()..].trim_start();
        }
    }
    token.trim().to_string()
}

pub fn clean_client_id(raw: &str) -> String {
    raw.trim().to_string()
}
