//! App access token minting for Twitch authentication.
//!
//! Exchanges a client id/secret pair for an app access token using the
//! OAuth2 client-credentials grant. Retry policy belongs to the caller.

use serde::Deserialize;

use crate::{TwitchError, clean_client_id, clean_token};

const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Twitch OAuth token response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

/// Mints app access tokens.
///
/// The caller is responsible for persisting the returned token.
#[derive(Clone)]
pub struct TwitchAuth {
    token_url: String,
    http: reqwest::Client,
}

impl Default for TwitchAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl TwitchAuth {
    pub fn new() -> Self {
        Self::with_token_url(TOKEN_URL)
    }

    /// Point the exchange at a different token endpoint.
    pub fn with_token_url(token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Exchange client credentials for an app access token.
    ///
    /// Empty arguments fail with [`TwitchError::Auth`] without touching the
    /// network. A non-success response fails with [`TwitchError::Auth`]
    /// carrying the status code and the raw body.
    pub async fn mint_app_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, TwitchError> {
        let client_id = clean_client_id(client_id);
        let client_secret = clean_token(client_secret);
        if client_id.is_empty() {
            return Err(TwitchError::Auth("client id is empty".into()));
        }
        if client_secret.is_empty() {
            return Err(TwitchError::Auth("client secret is empty".into()));
        }

        tracing::info!("Requesting Twitch app access token");

        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let resp = self.http.post(&self.token_url).form(&params).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(TwitchError::Auth(format!(
                "failed to generate token: {} {}",
                status.as_u16(),
                body
            )));
        }

        let token_resp: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| TwitchError::Auth(format!("failed to parse token response: {e}")))?;

        tracing::debug!(
            expires_in = token_resp.expires_in,
            token_type = token_resp.token_type.as_deref().unwrap_or("bearer"),
            "App access token issued"
        );

        Ok(token_resp.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeConfig, spawn_fake_twitch};

    #[tokio::test]
    async fn empty_secret_fails_before_network() {
        let fake = spawn_fake_twitch(FakeConfig::default()).await;
        let auth = TwitchAuth::with_token_url(fake.token_url.clone());

        let err = auth.mint_app_token("client", "   ").await.unwrap_err();
        assert!(matches!(err, TwitchError::Auth(_)));
        assert_eq!(fake.token_hits(), 0);

        let err = auth.mint_app_token("", "secret").await.unwrap_err();
        assert!(matches!(err, TwitchError::Auth(_)));
        assert_eq!(fake.token_hits(), 0);
    }

    #[tokio::test]
    async fn mints_token_with_client_credentials_grant() {
        let fake = spawn_fake_twitch(FakeConfig::default()).await;
        let auth = TwitchAuth::with_token_url(fake.token_url.clone());

        let token = auth.mint_app_token(" client ", "oauth:secret").await.unwrap();
        assert_eq!(token, "minted-token");
        assert_eq!(fake.token_hits(), 1);
        assert_eq!(
            fake.last_token_form(),
            Some(("client".to_string(), "secret".to_string(), "client_credentials".to_string()))
        );
    }

    #[tokio::test]
    async fn rejected_exchange_carries_status_and_body() {
        let fake = spawn_fake_twitch(FakeConfig {
            token_status: Some(400),
            ..FakeConfig::default()
        })
        .await;
        let auth = TwitchAuth::with_token_url(fake.token_url.clone());

        let err = auth.mint_app_token("client", "secret").await.unwrap_err();
        match err {
            TwitchError::Auth(message) => {
                assert!(message.contains("400"));
                assert!(message.contains("invalid client secret"));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }
}
