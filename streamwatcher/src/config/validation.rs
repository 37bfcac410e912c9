//! Setting value validation.

use regex::Regex;
use std::sync::LazyLock;

use super::defaults::POLL_INTERVAL_CHOICES;

static RE_CHANNEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,25}$").unwrap());
static RE_CLIENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{1,64}$").unwrap());

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "POLL_INTERVAL_MINUTES" => {
            let v: u64 = value.parse().map_err(|_| "must be an integer")?;
            if !POLL_INTERVAL_CHOICES.contains(&v) {
                return Err(format!("must be one of {POLL_INTERVAL_CHOICES:?}"));
            }
        }
        "COMMAND_TEMPLATE" => {
            if value.trim().is_empty() {
                return Err("must not be empty".into());
            }
        }
        "LAUNCH_MODE" => {
            if value != "process" && value != "clipboard" {
                return Err("must be 'process' or 'clipboard'".into());
            }
        }
        "CHANNELS" => {
            for line in value.lines().map(str::trim).filter(|l| !l.is_empty()) {
                validate_channel_name(line)?;
            }
        }
        "AUTO_START" => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn validate_channel_name(name: &str) -> Result<(), String> {
    if !RE_CHANNEL.is_match(name) {
        return Err(format!(
            "invalid channel name '{name}' (letters, digits and underscores, at most 25)"
        ));
    }
    Ok(())
}

pub fn validate_client_id(client_id: &str) -> Result<(), String> {
    if !RE_CLIENT_ID.is_match(client_id) {
        return Err("client id must be alphanumeric".into());
    }
    Ok(())
}
