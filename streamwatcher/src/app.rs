use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use watch_db::Database;

use crate::background::{PollingController, minutes};
use crate::channels::save_channels;
use crate::config::{AppConfig, ConfigFile, SettingsManager};
use crate::launcher::{LaunchError, LaunchFeedback, Launcher, launcher_for, render_command};
use crate::notification::{NotificationQueue, NotificationSink};
use crate::poller::{Poller, TwitchBackend};

/// Application state shared by the REPL, the polling loop and shutdown.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    /// Application configuration (reloadable)
    config: RwLock<AppConfig>,
    /// Overrides read from `config.json` at startup, reapplied on reload
    config_file: Option<ConfigFile>,
    db: Database,
    data_dir: PathBuf,
    shutdown: CancellationToken,
    poller: Arc<Poller>,
    polling: PollingController,
    notifications: NotificationQueue,
    launcher: Box<dyn Launcher>,
}

impl SharedState {
    /// Wire the poller, its polling loop and the notification queue.
    ///
    /// Spawns the notification worker, so it must run inside a runtime.
    pub fn new(
        db: Database,
        config: AppConfig,
        config_file: Option<ConfigFile>,
        data_dir: PathBuf,
        backend: Arc<dyn TwitchBackend>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let notifications = NotificationQueue::start(sink);
        let poller = Arc::new(Poller::new(
            backend,
            Arc::new(db.clone()),
            notifications.sender(),
        ));
        poller.set_channels(config.channels.clone());
        let polling = PollingController::new(poller.clone(), shutdown.clone());
        let launcher = launcher_for(config.launch_mode);

        Self {
            inner: Arc::new(SharedStateInner {
                config: RwLock::new(config),
                config_file,
                db,
                data_dir,
                shutdown,
                poller,
                polling,
                notifications,
                launcher,
            }),
        }
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn settings(&self) -> SettingsManager {
        SettingsManager::new(self.inner.db.clone())
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.inner.data_dir
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    pub fn poller(&self) -> &Arc<Poller> {
        &self.inner.poller
    }

    pub fn polling(&self) -> &PollingController {
        &self.inner.polling
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.inner.notifications
    }

    /// Get a read lock on the current config.
    pub async fn config(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.config.read().await
    }

    /// Start (or restart) polling at the configured interval.
    pub async fn start_polling(&self) {
        let period = minutes(self.config().await.poll_interval_minutes);
        self.inner.polling.start(period);
    }

    /// Validate and persist a new poll interval. A running loop restarts.
    pub async fn set_poll_interval(&self, minutes_value: u64) -> Result<(), anyhow::Error> {
        self.settings()
            .set_setting("POLL_INTERVAL_MINUTES", &minutes_value.to_string())?;
        self.inner.config.write().await.poll_interval_minutes = minutes_value;
        if self.inner.polling.is_running() {
            self.inner.polling.start(minutes(minutes_value));
        }
        Ok(())
    }

    /// Persist the tracked list and hand it to the poller.
    pub async fn set_channels(&self, channels: Vec<String>) -> Result<(), anyhow::Error> {
        save_channels(&self.settings(), &channels)?;
        self.inner.poller.set_channels(channels.clone());
        self.inner.config.write().await.channels = channels;
        Ok(())
    }

    /// Run the launch action for a channel.
    pub async fn launch(&self, channel: &str) -> Result<LaunchFeedback, LaunchError> {
        let command = render_command(&self.config().await.command_template, channel);
        tracing::info!(channel, "Launching stream");
        self.inner.launcher.launch(&command).await
    }

    /// Reload config from the database and the startup config file. A
    /// running loop restarts when the interval changed.
    pub async fn reload_config(&self) -> Result<(), anyhow::Error> {
        let sm = self.settings();
        let mut config = self.inner.config.write().await;
        let previous_interval = config.poll_interval_minutes;
        config.reload(&sm, self.inner.config_file.as_ref())?;
        self.inner.poller.set_channels(config.channels.clone());

        let interval = config.poll_interval_minutes;
        if interval != previous_interval && self.inner.polling.is_running() {
            tracing::info!(
                from = previous_interval,
                to = interval,
                "Poll interval changed, restarting loop"
            );
            self.inner.polling.start(minutes(interval));
        }
        Ok(())
    }
}
