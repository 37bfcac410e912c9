//! Configuration management: defaults, validation, loading from DB,
//! environment and the optional `config.json` file.

pub mod app_config;
pub mod defaults;
pub mod file;
pub mod manager;
pub mod validation;

pub use app_config::AppConfig;
pub use file::ConfigFile;
pub use manager::SettingsManager;

use serde::{Deserialize, Serialize};

/// A setting as shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingInfo {
    pub key: String,
    pub value: String,
    pub required: bool,
    pub description: String,
    pub has_value: bool,
}
