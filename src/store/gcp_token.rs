use cached::{Cached, TimedCache};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";
/// Metadata server tokens live for 3599 seconds; reuse them for a bit less.
const TOKEN_LIFESPAN_SECS: u64 = 3000;

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Supplies OAuth access tokens for Google APIs.
///
/// A statically configured token is returned as is. Otherwise tokens are
/// requested from the GCE metadata server and cached for [`TOKEN_LIFESPAN_SECS`].
pub struct TokenSource {
    client: Client,
    static_token: Option<String>,
    metadata_url: String,
    cache: Mutex<TimedCache<String, String>>,
}

impl TokenSource {
    pub fn new(client: Client, static_token: Option<String>, metadata_url: &str) -> Self {
        Self::with_lifespan(client, static_token, metadata_url, TOKEN_LIFESPAN_SECS)
    }

    pub fn with_lifespan(
        client: Client,
        static_token: Option<String>,
        metadata_url: &str,
        lifespan_secs: u64,
    ) -> Self {
        Self {
            client,
            static_token,
            metadata_url: metadata_url.trim_end_matches('/').to_string(),
            cache: Mutex::new(TimedCache::with_lifespan(lifespan_secs)),
        }
    }

    pub async fn token(&self) -> Result<String, String> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.cache_get(&self.metadata_url) {
            return Ok(token.clone());
        }

        let token = self.fetch().await?;
        cache.cache_set(self.metadata_url.clone(), token.clone());
        Ok(token)
    }

    async fn fetch(&self) -> Result<String, String> {
        let url = format!("{}{}", self.metadata_url, TOKEN_PATH);
        debug!("Requesting access token from metadata server");
        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| format!("Error requesting access token: {}", e))?;
        if !response.status().is_success() {
            return Err(format!(
                "Metadata server returned status code: {}",
                response.status()
            ));
        }
        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| format!("Error parsing access token: {}", e))?;
        Ok(token.access_token)
    }
}
