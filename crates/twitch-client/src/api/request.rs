use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use super::*;
use crate::{clean_client_id, clean_token};

impl TwitchApiClient {
    pub fn new() -> Self {
        Self::with_base_url(HELIX_BASE)
    }

    /// Point the client at a different Helix base URL (no trailing slash).
    pub fn with_base_url(helix_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            helix_base: helix_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build auth headers from the given credential pair.
    fn auth_headers(&self, client_id: &str, token: &str) -> Result<HeaderMap, TwitchError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", clean_token(token));
        let bearer = HeaderValue::from_str(&bearer)
            .map_err(|_| TwitchError::Auth("access token contains invalid characters".into()))?;
        let client_id = HeaderValue::from_str(&clean_client_id(client_id))
            .map_err(|_| TwitchError::Auth("client id contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("Client-Id", client_id);
        Ok(headers)
    }

    /// Execute a GET request with auth headers.
    ///
    /// A 401 maps to [`TwitchError::Unauthorized`] so the caller can refresh
    /// the token and retry; other failures map to [`TwitchError::ApiError`].
    pub(super) async fn authenticated_get(
        &self,
        url: &str,
        client_id: &str,
        token: &str,
    ) -> Result<String, TwitchError> {
        let headers = self.auth_headers(client_id, token)?;
        let resp = self.http.get(url).headers(headers).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!("Got 401, caller should refresh token and retry");
            return Err(TwitchError::Unauthorized(body));
        }

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), body, "Helix request failed");
            return Err(TwitchError::ApiError {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        Ok(body)
    }
}

impl Default for TwitchApiClient {
    fn default() -> Self {
        Self::new()
    }
}
