//! Background polling loop and its start/stop controller.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::poller::{PollOutcome, Poller};

pub fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

struct PollingHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    period: Duration,
}

/// Owns the polling loop task. Starting while running restarts the loop
/// with the new period.
pub struct PollingController {
    poller: Arc<Poller>,
    shutdown: CancellationToken,
    running: Mutex<Option<PollingHandle>>,
}

impl PollingController {
    pub fn new(poller: Arc<Poller>, shutdown: CancellationToken) -> Self {
        Self {
            poller,
            shutdown,
            running: Mutex::new(None),
        }
    }

    /// Start (or restart) polling. The first check fires immediately.
    pub fn start(&self, period: Duration) {
        let Ok(mut running) = self.running.lock() else {
            tracing::error!("Polling controller lock poisoned");
            return;
        };
        if let Some(previous) = running.take() {
            previous.cancel.cancel();
        }

        let cancel = self.shutdown.child_token();
        let task = tokio::spawn(polling_loop(self.poller.clone(), period, cancel.clone()));
        tracing::info!(period_secs = period.as_secs(), "Polling started");
        *running = Some(PollingHandle {
            cancel,
            task,
            period,
        });
    }

    /// Cancel the timer. A check already in flight runs to completion.
    pub fn stop(&self) -> bool {
        let handle = self.running.lock().ok().and_then(|mut running| running.take());
        match handle {
            Some(handle) => {
                handle.cancel.cancel();
                tracing::info!("Polling stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .map(|running| running.as_ref().is_some_and(|h| !h.task.is_finished()))
            .unwrap_or(false)
    }

    pub fn period(&self) -> Option<Duration> {
        self.running
            .lock()
            .ok()
            .and_then(|running| running.as_ref().map(|h| h.period))
    }
}

/// Fire a check on every tick, and once more whenever credentials appear
/// after being absent. Checks run in their own tasks so a slow check never
/// delays the timer; overlapping ticks are dropped by the poller.
pub async fn polling_loop(poller: Arc<Poller>, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut credentials = poller.subscribe_credentials();
    let mut had_credentials = credentials.borrow_and_update().is_some();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => spawn_check(&poller),
            changed = credentials.changed() => {
                if changed.is_err() {
                    break;
                }
                let has_credentials = credentials.borrow_and_update().is_some();
                if has_credentials && !had_credentials {
                    tracing::info!("Credentials available, checking now");
                    spawn_check(&poller);
                }
                had_credentials = has_credentials;
            }
        }
    }

    tracing::info!("Polling loop stopped");
}

fn spawn_check(poller: &Arc<Poller>) {
    let poller = poller.clone();
    tokio::spawn(async move {
        match poller.poll_once().await {
            Ok(PollOutcome::Skipped) => tracing::debug!("Tick dropped, check in progress"),
            Ok(PollOutcome::NoCredentials) => tracing::debug!("Tick skipped, no credentials"),
            Ok(PollOutcome::Completed(_)) => {}
            Err(e) => tracing::debug!("Check ended with error: {e}"),
        }
    });
}
