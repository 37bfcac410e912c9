use std::collections::HashSet;

use chrono::Utc;
use url::Url;

use super::*;
use crate::ChannelStatus;

/// Helix accepts at most 100 `user_login` parameters per request.
pub const MAX_LOGINS_PER_REQUEST: usize = 100;

const THUMBNAIL_WIDTH: &str = "400";
const THUMBNAIL_HEIGHT: &str = "225";

impl TwitchApiClient {
    /// Look up which of the given channels are live right now.
    ///
    /// Only live channels appear in the result; absence means offline.
    /// Any failing batch aborts the whole call and earlier batches are
    /// discarded, so a caller never sees a half-refreshed picture.
    pub async fn fetch_live(
        &self,
        channel_names: &[String],
        client_id: &str,
        token: &str,
    ) -> Result<Vec<ChannelStatus>, TwitchError> {
        let batches = partition_logins(channel_names);
        if batches.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            channels = batches.iter().map(Vec::len).sum::<usize>(),
            batches = batches.len(),
            "Querying Helix streams"
        );

        let mut streams: Vec<StreamInfo> = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            let url = build_streams_url(&self.helix_base, batch)?;
            let body = match self.authenticated_get(url.as_str(), client_id, token).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(batch = index, "Stream batch failed, discarding partial results: {e}");
                    return Err(e);
                }
            };
            let resp: HelixResponse<StreamInfo> = serde_json::from_str(&body)?;
            streams.extend(resp.data);
        }

        let now = Utc::now().timestamp_millis();
        Ok(streams
            .into_iter()
            .map(|info| live_status(info, now))
            .collect())
    }
}

/// Lowercase, deduplicate (first occurrence wins) and split into batches of
/// at most [`MAX_LOGINS_PER_REQUEST`] logins.
pub fn partition_logins(channel_names: &[String]) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    let unique: Vec<String> = channel_names
        .iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect();

    unique
        .chunks(MAX_LOGINS_PER_REQUEST)
        .map(<[String]>::to_vec)
        .collect()
}

/// Build `{base}/streams?first=N&user_login=a&user_login=b...`.
pub fn build_streams_url(helix_base: &str, logins: &[String]) -> Result<Url, TwitchError> {
    let mut url = Url::parse(&format!("{helix_base}/streams"))?;
    {
        let mut query = url.query_pairs_mut();
        let first = logins.len().clamp(1, MAX_LOGINS_PER_REQUEST);
        query.append_pair("first", &first.to_string());
        for login in logins.iter().take(MAX_LOGINS_PER_REQUEST) {
            query.append_pair("user_login", login);
        }
    }
    Ok(url)
}

fn live_status(info: StreamInfo, now: i64) -> ChannelStatus {
    let non_empty = |s: String| (!s.is_empty()).then_some(s);
    ChannelStatus {
        name: info.user_login.to_lowercase(),
        is_live: true,
        title: non_empty(info.title),
        game: non_empty(info.game_name),
        viewers: Some(info.viewer_count.to_string()),
        thumbnail_url: info.thumbnail_url.map(|url| {
            url.replace("{width}", THUMBNAIL_WIDTH)
                .replace("{height}", THUMBNAIL_HEIGHT)
        }),
        last_checked: now,
        last_changed: now,
    }
}
