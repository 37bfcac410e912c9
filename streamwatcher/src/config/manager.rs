//! SettingsManager: DB-backed settings with defaults and env migration.

use std::collections::BTreeMap;

use watch_db::Database;

use super::SettingInfo;
use super::defaults::DEFAULT_SETTINGS;
use super::validation::validate_setting;

/// Environment variables migrate into settings under this prefix,
/// e.g. `STREAMWATCHER_POLL_INTERVAL_MINUTES`.
pub const ENV_PREFIX: &str = "STREAMWATCHER_";

/// Wraps [`Database`] to provide high-level settings operations.
#[derive(Clone)]
pub struct SettingsManager {
    db: Database,
}

impl SettingsManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get a setting value. Falls back to default if not in DB.
    pub fn get_setting(&self, key: &str) -> Result<String, anyhow::Error> {
        if let Some(val) = self.db.get_setting(key)? {
            return Ok(val);
        }
        if let Some(def) = DEFAULT_SETTINGS.get(key) {
            return Ok(def.default.to_string());
        }
        anyhow::bail!("setting not found: {key}");
    }

    /// Set a setting value with validation.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        if !DEFAULT_SETTINGS.contains_key(key) {
            anyhow::bail!("unknown setting key: {key}");
        }

        validate_setting(key, value)
            .map_err(|e| anyhow::anyhow!("validation error for {key}: {e}"))?;

        self.db.set_setting(key, value)?;
        Ok(())
    }

    /// Drop the stored value so the default applies again.
    pub fn reset_setting(&self, key: &str) -> Result<(), anyhow::Error> {
        if !DEFAULT_SETTINGS.contains_key(key) {
            anyhow::bail!("unknown setting key: {key}");
        }
        self.db.delete_setting(key)?;
        Ok(())
    }

    /// Get all settings, filling in defaults for missing keys.
    pub fn get_all_settings(&self) -> Result<BTreeMap<String, SettingInfo>, anyhow::Error> {
        let db_settings = self.db.get_all_settings()?;
        let mut result = BTreeMap::new();

        for (key, def) in DEFAULT_SETTINGS.iter() {
            let value = db_settings
                .get(*key)
                .cloned()
                .unwrap_or_else(|| def.default.to_string());
            result.insert(
                key.to_string(),
                SettingInfo {
                    key: key.to_string(),
                    has_value: !value.is_empty(),
                    value,
                    required: def.required,
                    description: def.description.to_string(),
                },
            );
        }

        Ok(result)
    }

    /// Initialize default settings in DB (skip existing).
    pub fn initialize_defaults(&self) -> Result<(), anyhow::Error> {
        for (key, def) in DEFAULT_SETTINGS.iter() {
            if self.db.seed_setting(key, def.default)? {
                tracing::debug!("Seeded default for {key}");
            }
        }
        Ok(())
    }

    /// Copy `STREAMWATCHER_*` environment values into settings the DB does
    /// not hold yet. Invalid values are skipped with a warning.
    pub fn migrate_from_env(&self) -> Result<u32, anyhow::Error> {
        self.migrate_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn migrate_from(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<u32, anyhow::Error> {
        let mut migrated = 0u32;
        for key in DEFAULT_SETTINGS.keys() {
            if self.db.get_setting(key)?.is_some() {
                continue;
            }
            let Some(env_val) = env(&format!("{ENV_PREFIX}{key}")).filter(|v| !v.is_empty())
            else {
                continue;
            };
            match self.set_setting(key, &env_val) {
                Ok(()) => {
                    tracing::info!("Migrated setting from env: {key}");
                    migrated += 1;
                }
                Err(e) => tracing::warn!("Ignoring env setting {key}: {e}"),
            }
        }
        if migrated > 0 {
            tracing::info!("Migration completed: {migrated} settings migrated");
        }
        Ok(migrated)
    }
}
