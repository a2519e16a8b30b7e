use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::base::{SecretError, SecretStore};
use super::gcp_token::TokenSource;

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    data: String,
}

/// Reads secret versions through the Secret Manager REST API.
pub struct SecretManagerClient {
    client: Client,
    base_url: String,
    tokens: Arc<TokenSource>,
}

impl SecretManagerClient {
    pub fn new(client: Client, base_url: &str, tokens: Arc<TokenSource>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }
}

#[async_trait]
impl SecretStore for SecretManagerClient {
    async fn access_secret_version(&self, name: &str) -> Result<Vec<u8>, SecretError> {
        let token = self.tokens.token().await.map_err(SecretError::Other)?;
        let url = format!("{}/v1/{}:access", self.base_url, name);

        debug!("Accessing secret version '{}'", name);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SecretError::Other(format!("Error sending request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SecretError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
            });
        }

        let body: AccessSecretVersionResponse = response
            .json()
            .await
            .map_err(|e| SecretError::Other(format!("Error parsing JSON: {}", e)))?;
        general_purpose::STANDARD
            .decode(body.payload.data)
            .map_err(|e| SecretError::Other(format!("Invalid base64 in secret payload: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const SECRET: &str = "projects/p/secrets/portfolio/versions/latest";

    fn client_for(url: &str) -> SecretManagerClient {
        let tokens = Arc::new(TokenSource::new(Client::new(), Some("t0k".to_string()), url));
        SecretManagerClient::new(Client::new(), url, tokens)
    }

    #[tokio::test]
    async fn payload_is_base64_decoded() {
        let mut server = Server::new_async().await;
        let encoded = general_purpose::STANDARD.encode(r#"{"user_auth_api": "x"}"#);
        let m = server
            .mock("GET", format!("/v1/{}:access", SECRET).as_str())
            .match_header("authorization", "Bearer t0k")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"name": "{}", "payload": {{"data": "{}"}}}}"#, SECRET, encoded))
            .create_async()
            .await;

        let payload = client_for(&server.url())
            .access_secret_version(SECRET)
            .await
            .unwrap();
        m.assert_async().await;
        assert_eq!(payload, br#"{"user_auth_api": "x"}"#.to_vec());
    }

    #[tokio::test]
    async fn denied_access_is_an_http_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", format!("/v1/{}:access", SECRET).as_str())
            .with_status(403)
            .create_async()
            .await;

        let err = client_for(&server.url())
            .access_secret_version(SECRET)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SecretError::Http {
                status: 403,
                reason: "Forbidden".to_string()
            }
        );
    }
}
