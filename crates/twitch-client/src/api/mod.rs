//! Twitch Helix REST API client.
//!
//! Covers the endpoints a live-status poller needs: batched stream lookups
//! by login and an authorized probe for credential validation. Bearer
//! token and Client-Id headers are injected per call so credentials can
//! change between polls.

mod request;
mod streams;
mod validate;

pub mod models;

pub use models::{HelixResponse, StreamInfo};
pub use streams::{MAX_LOGINS_PER_REQUEST, build_streams_url, partition_logins};

use crate::TwitchError;

const HELIX_BASE: &str = "https://api.twitch.tv/helix";

/// Twitch Helix API client.
#[derive(Clone)]
pub struct TwitchApiClient {
    pub(super) http: reqwest::Client,
    pub(super) helix_base: String,
}
