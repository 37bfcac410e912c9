//! Where notifications end up.

use async_trait::async_trait;

use super::types::{ToastKind, WatchEvent};
use crate::launcher::run_shell;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, event: &WatchEvent);
}

/// Prints toasts to the terminal and plays a sound cue for went-live
/// events by running a shell command.
pub struct ConsoleSink {
    sound_command: Option<String>,
}

impl ConsoleSink {
    pub fn new(sound_command: Option<String>) -> Self {
        Self {
            sound_command: sound_command.filter(|c| !c.trim().is_empty()),
        }
    }
}

#[async_trait]
impl NotificationSink for ConsoleSink {
    async fn deliver(&self, event: &WatchEvent) {
        let toast = event.to_toast();
        println!("[{}] {}", toast.title, toast.message);
        match toast.kind {
            ToastKind::Error => tracing::warn!(title = %toast.title, "{}", toast.message),
            _ => tracing::debug!(title = %toast.title, "{}", toast.message),
        }

        if !event.is_went_live() {
            return;
        }
        if let Some(command) = &self.sound_command {
            if let Err(e) = run_shell(command).await {
                tracing::warn!("Notification sound failed: {e}");
            }
        }
    }
}
