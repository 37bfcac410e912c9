//! The poll cycle: query Twitch, refresh the token when needed, reconcile.
//!
//! [`Poller`] owns every piece of mutable watcher state. Each piece lives in
//! a `watch` channel holding an `Arc` snapshot, so readers always see a
//! complete value and writers replace it wholesale.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use twitch_client::{ChannelStatus, TwitchApiClient, TwitchAuth, TwitchError};
use watch_db::DbError;

use crate::credentials::{CredentialStore, Credentials};
use crate::notification::WatchEvent;
use crate::reconcile::{WatchState, WentLive, reconcile};

/// The Twitch operations a poll needs.
#[async_trait]
pub trait TwitchBackend: Send + Sync {
    async fn mint_token(&self, client_id: &str, client_secret: &str)
    -> Result<String, TwitchError>;

    async fn fetch_live(
        &self,
        channels: &[String],
        client_id: &str,
        token: &str,
    ) -> Result<Vec<ChannelStatus>, TwitchError>;

    async fn validate(&self, client_id: &str, token: &str) -> bool;
}

/// [`TwitchBackend`] backed by the real Helix and OAuth endpoints.
#[derive(Default)]
pub struct HelixBackend {
    auth: TwitchAuth,
    api: TwitchApiClient,
}

impl HelixBackend {
    pub fn new(auth: TwitchAuth, api: TwitchApiClient) -> Self {
        Self { auth, api }
    }
}

#[async_trait]
impl TwitchBackend for HelixBackend {
    async fn mint_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, TwitchError> {
        self.auth.mint_app_token(client_id, client_secret).await
    }

    async fn fetch_live(
        &self,
        channels: &[String],
        client_id: &str,
        token: &str,
    ) -> Result<Vec<ChannelStatus>, TwitchError> {
        self.api.fetch_live(channels, client_id, token).await
    }

    async fn validate(&self, client_id: &str, token: &str) -> bool {
        self.api.validate(client_id, token).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Checking,
    Refreshing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub tracked: usize,
    pub live: usize,
    pub went_live: Vec<WentLive>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed(PollReport),
    /// Another check was already running.
    Skipped,
    NoCredentials,
}

pub struct Poller {
    backend: Arc<dyn TwitchBackend>,
    store: Arc<dyn CredentialStore>,
    events: mpsc::Sender<WatchEvent>,
    credentials: watch::Sender<Option<Arc<Credentials>>>,
    channels: watch::Sender<Arc<Vec<String>>>,
    state: watch::Sender<Arc<WatchState>>,
    phase: watch::Sender<PollPhase>,
}

/// Puts the poller back to `Idle` however the check ends.
struct PhaseGuard<'a> {
    phase: &'a watch::Sender<PollPhase>,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.phase.send_replace(PollPhase::Idle);
    }
}

impl Poller {
    pub fn new(
        backend: Arc<dyn TwitchBackend>,
        store: Arc<dyn CredentialStore>,
        events: mpsc::Sender<WatchEvent>,
    ) -> Self {
        Self {
            backend,
            store,
            events,
            credentials: watch::Sender::new(None),
            channels: watch::Sender::new(Arc::new(Vec::new())),
            state: watch::Sender::new(Arc::new(WatchState::default())),
            phase: watch::Sender::new(PollPhase::Idle),
        }
    }

    // ---- credentials ----

    pub fn credentials(&self) -> Option<Arc<Credentials>> {
        self.credentials.borrow().clone()
    }

    pub fn subscribe_credentials(&self) -> watch::Receiver<Option<Arc<Credentials>>> {
        self.credentials.subscribe()
    }

    /// Replace the in-memory credentials without touching the store.
    pub fn set_credentials(&self, creds: Option<Credentials>) {
        self.credentials.send_replace(creds.map(Arc::new));
    }

    /// Persist credentials, then make them active.
    pub fn commit_credentials(&self, creds: Credentials) -> Result<(), DbError> {
        self.store.save(&creds)?;
        self.set_credentials(Some(creds));
        Ok(())
    }

    /// Forget credentials in memory and in the store.
    pub fn clear_credentials(&self) -> Result<(), DbError> {
        self.credentials.send_replace(None);
        self.store.clear()
    }

    /// Probe a client id and token pair before accepting it.
    pub async fn validate(&self, client_id: &str, token: &str) -> bool {
        self.backend.validate(client_id, token).await
    }

    // ---- channels and state ----

    pub fn channels(&self) -> Arc<Vec<String>> {
        self.channels.borrow().clone()
    }

    pub fn set_channels(&self, channels: Vec<String>) {
        self.channels.send_replace(Arc::new(channels));
    }

    pub fn snapshot(&self) -> Arc<WatchState> {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> PollPhase {
        *self.phase.borrow()
    }

    // ---- poll cycle ----

    fn try_begin(&self) -> Option<PhaseGuard<'_>> {
        let began = self.phase.send_if_modified(|phase| {
            if *phase == PollPhase::Idle {
                *phase = PollPhase::Checking;
                true
            } else {
                false
            }
        });
        began.then_some(PhaseGuard { phase: &self.phase })
    }

    /// Run one check. A call made while another is in flight returns
    /// [`PollOutcome::Skipped`] immediately.
    ///
    /// Errors are also reported to the notification queue before being
    /// returned.
    pub async fn poll_once(&self) -> Result<PollOutcome, TwitchError> {
        let Some(_guard) = self.try_begin() else {
            tracing::debug!("Check already in progress, skipping");
            return Ok(PollOutcome::Skipped);
        };
        let Some(creds) = self.credentials() else {
            tracing::debug!("No credentials, skipping check");
            return Ok(PollOutcome::NoCredentials);
        };
        let channels = self.channels();

        let token = self.ensure_token(&creds).await?;
        let live = match self.fetch_with_refresh(&creds, &channels, token).await {
            Ok(live) => live,
            Err(e) => {
                if e.is_network() {
                    tracing::warn!("Stream check failed, Twitch unreachable: {e}");
                } else {
                    tracing::error!("Stream check failed: {e}");
                }
                self.notify(WatchEvent::CheckFailed {
                    message: e.to_string(),
                });
                if matches!(e, TwitchError::Auth(_)) && !creds.has_secret() {
                    self.clear_if_current(&creds);
                }
                return Err(e);
            }
        };

        let now = chrono::Utc::now().timestamp_millis();
        let prev = self.snapshot();
        let result = reconcile(&prev, &channels, live, now);
        let report = PollReport {
            tracked: result.state.statuses.len(),
            live: result.state.live_count(),
            went_live: result.went_live,
        };
        self.state.send_replace(Arc::new(result.state));

        for went_live in &report.went_live {
            self.notify(WatchEvent::ChannelWentLive {
                name: went_live.name.clone(),
                title: went_live.title.clone(),
                game: went_live.game.clone(),
            });
        }
        tracing::info!(
            tracked = report.tracked,
            live = report.live,
            "Stream check complete"
        );
        Ok(PollOutcome::Completed(report))
    }

    /// The held access token, or a freshly minted one when only the
    /// secret is available. Failures here are reported as auth errors.
    async fn ensure_token(&self, creds: &Credentials) -> Result<String, TwitchError> {
        if creds.has_token() {
            return Ok(creds.access_token.clone());
        }

        let Some(secret) = creds.client_secret.as_deref() else {
            let message = "Missing Access Token and Client Secret".to_string();
            tracing::warn!("{message}");
            self.notify(WatchEvent::AuthFailed {
                message: message.clone(),
            });
            self.clear_if_current(creds);
            return Err(TwitchError::Auth(message));
        };

        tracing::info!("Access token missing, generating a new one");
        self.refresh_token(creds, secret).await.inspect_err(|e| {
            tracing::error!("Token generation failed: {e}");
            self.notify(WatchEvent::AuthFailed {
                message: format!("Could not generate token: {e}"),
            });
        })
    }

    /// Query live streams, refreshing the token and retrying once on a 401
    /// when a secret allows it.
    async fn fetch_with_refresh(
        &self,
        creds: &Credentials,
        channels: &[String],
        token: String,
    ) -> Result<Vec<ChannelStatus>, TwitchError> {
        match self
            .backend
            .fetch_live(channels, &creds.client_id, &token)
            .await
        {
            Err(e) if e.is_unauthorized() => {
                let Some(secret) = creds.client_secret.as_deref() else {
                    tracing::warn!("Access token rejected and no client secret to refresh it");
                    return Err(TwitchError::Auth(e.to_string()));
                };
                tracing::info!("Access token rejected, refreshing with client secret");
                let token = self
                    .refresh_token(creds, secret)
                    .await
                    .map_err(|e| TwitchError::Auth(format!("Failed to refresh token: {e}")))?;
                let live = self
                    .backend
                    .fetch_live(channels, &creds.client_id, &token)
                    .await?;
                tracing::info!("Token refresh successful");
                Ok(live)
            }
            other => other,
        }
    }

    /// Mint a token and persist it before it is used.
    async fn refresh_token(&self, creds: &Credentials, secret: &str) -> Result<String, TwitchError> {
        self.phase.send_replace(PollPhase::Refreshing);
        let token = self.backend.mint_token(&creds.client_id, secret).await?;
        self.phase.send_replace(PollPhase::Checking);

        let updated = creds.with_token(token.clone());
        if let Err(e) = self.store.save(&updated) {
            tracing::warn!("Failed to persist refreshed token: {e}");
        }
        self.credentials.send_if_modified(|current| {
            let same_client = current
                .as_ref()
                .is_some_and(|active| active.client_id == creds.client_id);
            if same_client {
                *current = Some(Arc::new(updated));
            }
            same_client
        });
        Ok(token)
    }

    /// Drop credentials after an auth failure, unless they were replaced
    /// while the check was running.
    fn clear_if_current(&self, used: &Credentials) {
        let cleared = self.credentials.send_if_modified(|current| {
            let unchanged = current.as_deref() == Some(used);
            if unchanged {
                *current = None;
            }
            unchanged
        });
        if !cleared {
            return;
        }
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear stored credentials: {e}");
        }
        self.notify(WatchEvent::CredentialsCleared);
    }

    fn notify(&self, event: WatchEvent) {
        if let Err(e) = self.events.try_send(event) {
            tracing::warn!("Dropping notification: {e}");
        }
    }
}

#[cfg(test)]
mod tests;
