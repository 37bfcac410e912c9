//! Tracked channel list editing.
//!
//! Channel names keep the user's casing for display; lowercase is only the
//! join key against API results. Deduplication here is by exact string.

use std::collections::HashSet;
use std::path::Path;

use crate::config::SettingsManager;

/// Parse newline-separated text: trim lines, drop blanks, keep the first
/// occurrence of each exact name.
pub fn parse_channel_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

pub fn format_channel_list(channels: &[String]) -> String {
    channels.join("\n")
}

/// Load a channel list from a `.txt` file, one name per line.
pub async fn load_channel_file(path: &Path) -> std::io::Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(parse_channel_list(&text))
}

/// Persist the list as the `CHANNELS` setting.
pub fn save_channels(sm: &SettingsManager, channels: &[String]) -> Result<(), anyhow::Error> {
    sm.set_setting("CHANNELS", &format_channel_list(channels))
}

/// Append a channel unless the exact name is already tracked.
pub fn add_channel(channels: &[String], name: &str) -> Vec<String> {
    let mut next = channels.to_vec();
    let name = name.trim();
    if !name.is_empty() && !next.iter().any(|c| c == name) {
        next.push(name.to_string());
    }
    next
}

/// Remove a channel, matching case-insensitively.
pub fn remove_channel(channels: &[String], name: &str) -> Vec<String> {
    let key = name.trim().to_lowercase();
    channels
        .iter()
        .filter(|c| c.to_lowercase() != key)
        .cloned()
        .collect()
}
