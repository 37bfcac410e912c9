use super::*;

impl TwitchApiClient {
    /// Probe whether a client id/token pair is authorized.
    ///
    /// Returns `true` only on a success status; every failure, including a
    /// transport error, yields `false`.
    pub async fn validate(&self, client_id: &str, token: &str) -> bool {
        let url = format!("{}/streams?first=1", self.helix_base);
        match self.authenticated_get(&url, client_id, token).await {
            Ok(_) => true,
            Err(e) => {
                tracing::info!("Credential validation failed: {e}");
                false
            }
        }
    }
}
