use serde::{Deserialize, Serialize};

/// Wrapper for Twitch Helix list responses.
#[derive(Debug, Deserialize)]
pub struct HelixResponse<T> {
    pub data: Vec<T>,
}

/// Stream information from GET /helix/streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub title: String,
    pub viewer_count: u64,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "type", default)]
    pub stream_type: String,
}
