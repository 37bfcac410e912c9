//! Fakes shared by the application tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use twitch_client::{ChannelStatus, TwitchError};

use crate::notification::{NotificationSink, WatchEvent};
use crate::poller::TwitchBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Mint,
    Fetch { token: String },
}

#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    live: Mutex<Vec<ChannelStatus>>,
    fetch_script: Mutex<VecDeque<Result<Vec<ChannelStatus>, TwitchError>>>,
    mint_script: Mutex<VecDeque<Result<String, TwitchError>>>,
    gate: Option<Arc<Notify>>,
}

impl FakeBackend {
    /// Each fetch waits for a permit on `gate` before answering.
    pub fn with_gate(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Fetch { .. }))
            .count()
    }

    pub fn set_live(&self, names: &[&str]) {
        *self.live.lock().unwrap() = names.iter().map(|n| live(n)).collect();
    }

    pub fn script_fetch(&self, result: Result<Vec<ChannelStatus>, TwitchError>) {
        self.fetch_script.lock().unwrap().push_back(result);
    }

    pub fn script_mint(&self, result: Result<String, TwitchError>) {
        self.mint_script.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl TwitchBackend for FakeBackend {
    async fn mint_token(&self, _client_id: &str, _secret: &str) -> Result<String, TwitchError> {
        self.calls.lock().unwrap().push(Call::Mint);
        let scripted = self.mint_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok("minted".to_string()))
    }

    async fn fetch_live(
        &self,
        _channels: &[String],
        _client_id: &str,
        token: &str,
    ) -> Result<Vec<ChannelStatus>, TwitchError> {
        self.calls.lock().unwrap().push(Call::Fetch {
            token: token.to_string(),
        });
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let scripted = self.fetch_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(self.live.lock().unwrap().clone()))
    }

    async fn validate(&self, _client_id: &str, token: &str) -> bool {
        token == "good"
    }
}

pub fn live(name: &str) -> ChannelStatus {
    ChannelStatus {
        name: name.to_lowercase(),
        is_live: true,
        title: Some("title".into()),
        game: Some("Chess".into()),
        viewers: Some("5".into()),
        thumbnail_url: None,
        last_checked: 0,
        last_changed: 0,
    }
}

/// Sink that records every delivered event.
#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<WatchEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<WatchEvent> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, event: &WatchEvent) {
        self.seen.lock().unwrap().push(event.clone());
    }
}
