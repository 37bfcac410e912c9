//! Runtime application configuration loaded from DB, environment and the
//! config file.

use super::defaults::{DEFAULT_COMMAND_TEMPLATE, DEFAULT_POLL_INTERVAL_MINUTES};
use super::file::ConfigFile;
use super::manager::{ENV_PREFIX, SettingsManager};
use super::validation::validate_setting;
use crate::channels::parse_channel_list;
use crate::launcher::LaunchMode;

/// Runtime configuration populated from the settings DB.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub channels: Vec<String>,
    pub poll_interval_minutes: u64,
    pub command_template: String,
    pub launch_mode: LaunchMode,
    pub notification_sound: String,
    pub auto_start: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            poll_interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
            command_template: DEFAULT_COMMAND_TEMPLATE.into(),
            launch_mode: LaunchMode::Process,
            notification_sound: String::new(),
            auto_start: true,
        }
    }
}

impl AppConfig {
    /// Load configuration: config file beats environment beats DB.
    pub fn load(sm: &SettingsManager, file: Option<&ConfigFile>) -> Result<Self, anyhow::Error> {
        let g = |key: &str| -> String { sm.get_setting(key).unwrap_or_default() };

        let mut poll_interval_minutes =
            parse_interval(&g("POLL_INTERVAL_MINUTES")).unwrap_or(DEFAULT_POLL_INTERVAL_MINUTES);

        // Environment variable override
        if let Ok(v) = std::env::var(format!("{ENV_PREFIX}POLL_INTERVAL_MINUTES")) {
            if let Some(m) = parse_interval(&v) {
                poll_interval_minutes = m;
            }
        }

        let mut config = Self {
            channels: parse_channel_list(&g("CHANNELS")),
            poll_interval_minutes,
            command_template: {
                let t = g("COMMAND_TEMPLATE");
                if t.trim().is_empty() { DEFAULT_COMMAND_TEMPLATE.into() } else { t }
            },
            launch_mode: LaunchMode::from_str_setting(&g("LAUNCH_MODE")),
            notification_sound: g("NOTIFICATION_SOUND"),
            auto_start: g("AUTO_START") != "false",
        };

        if let Some(file) = file {
            config.apply_file(file);
        }

        Ok(config)
    }

    fn apply_file(&mut self, file: &ConfigFile) {
        if let Some(channels) = &file.channels {
            self.channels = parse_channel_list(&channels.join("\n"));
        }
        if let Some(minutes) = file.poll_interval_minutes {
            match validate_setting("POLL_INTERVAL_MINUTES", &minutes.to_string()) {
                Ok(()) => self.poll_interval_minutes = minutes,
                Err(e) => tracing::warn!("Ignoring pollIntervalMinutes from config file: {e}"),
            }
        }
        if let Some(template) = file.command_template.as_ref().filter(|t| !t.trim().is_empty()) {
            self.command_template = template.clone();
        }
        if let Some(mode) = &file.launch_mode {
            self.launch_mode = LaunchMode::from_str_setting(mode);
        }
    }

    /// Reload config from the settings manager.
    pub fn reload(&mut self, sm: &SettingsManager, file: Option<&ConfigFile>) -> Result<(), anyhow::Error> {
        *self = Self::load(sm, file)?;
        Ok(())
    }
}

fn parse_interval(s: &str) -> Option<u64> {
    validate_setting("POLL_INTERVAL_MINUTES", s).ok()?;
    s.parse().ok()
}
