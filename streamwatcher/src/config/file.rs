//! Optional `config.json` next to the working directory.
//!
//! Accepts both camelCase keys and the `TWITCH_*` spellings used in
//! `.env` files, so the same values can be pasted into either.

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_PATH_ENV: &str = "STREAMWATCHER_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default, alias = "TWITCH_CLIENT_ID")]
    pub client_id: Option<String>,
    #[serde(default, alias = "TWITCH_CLIENT_SECRET")]
    pub client_secret: Option<String>,
    #[serde(default, alias = "TWITCH_ACCESS_TOKEN")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub channels: Option<Vec<String>>,
    #[serde(default)]
    pub poll_interval_minutes: Option<u64>,
    #[serde(default)]
    pub command_template: Option<String>,
    #[serde(default)]
    pub launch_mode: Option<String>,
}

impl ConfigFile {
    /// `$STREAMWATCHER_CONFIG`, else `./config.json`.
    pub fn default_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.json"))
    }

    /// Read the file. A missing or unreadable file is not an error; the
    /// config file is only the first of several sources.
    pub fn load(path: &Path) -> Option<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                return None;
            }
        };
        match Self::parse(&data) {
            Ok(file) => {
                tracing::info!("Loaded config file {}", path.display());
                Some(file)
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed config file {}: {e}", path.display());
                None
            }
        }
    }

    pub fn parse(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}
