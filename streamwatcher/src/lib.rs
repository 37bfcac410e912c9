pub mod app;
pub mod background;
pub mod channels;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod launcher;
pub mod notification;
pub mod poller;
pub mod reconcile;
pub mod shutdown;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;

use watch_db::Database;

use config::{AppConfig, ConfigFile, SettingsManager};

/// Determine the data directory for the application.
/// Priority: STREAMWATCHER_DATA_DIR env var > ~/.streamwatcher
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STREAMWATCHER_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".streamwatcher")
}

/// Load .env from multiple candidate paths.
pub fn load_dotenv() {
    let candidates = [".env", "../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Everything the binary needs before wiring the watcher.
pub struct Foundation {
    pub db: Database,
    pub config: AppConfig,
    pub config_file: Option<ConfigFile>,
    pub data_dir: PathBuf,
}

/// Initialize DB, migrate settings, load config.
pub fn init_foundation() -> Result<Foundation, anyhow::Error> {
    load_dotenv();

    let dir = data_dir();
    let (db, db_path) = Database::open_in(&dir)?;
    tracing::info!("Opened database at {}", db_path.display());

    let sm = SettingsManager::new(db.clone());

    // Migrate settings from environment variables (one-time)
    if let Err(e) = sm.migrate_from_env() {
        tracing::error!("Failed to migrate from env: {e}");
    }

    sm.initialize_defaults()?;

    let config_file = ConfigFile::load(&ConfigFile::default_path());
    let config = AppConfig::load(&sm, config_file.as_ref())?;

    tracing::info!(
        channels = config.channels.len(),
        interval_minutes = config.poll_interval_minutes,
        "Settings loaded"
    );
    Ok(Foundation {
        db,
        config,
        config_file,
        data_dir: dir,
    })
}
