use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};

use super::base::{Bucket, ObjectStorage, StorageError};
use super::gcp_token::TokenSource;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectEntry>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ObjectEntry {
    name: String,
}

/// Google Cloud Storage accessed through the JSON API.
pub struct GcsStorage {
    client: Client,
    base_url: String,
    tokens: Arc<TokenSource>,
}

impl GcsStorage {
    pub fn new(client: Client, base_url: &str, tokens: Arc<TokenSource>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }
}

/// Sends an authorized GET and maps transport errors and non-success statuses.
async fn get(
    client: &Client,
    tokens: &TokenSource,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Response, StorageError> {
    let token = tokens.token().await.map_err(StorageError::Other)?;
    let response = client
        .get(url)
        .bearer_auth(token)
        .query(query)
        .send()
        .await
        .map_err(|e| StorageError::Other(format!("Error sending request: {}", e)))?;
    if !response.status().is_success() {
        return Err(StorageError::from_status(response.status()));
    }
    Ok(response)
}

#[async_trait]
impl ObjectStorage for GcsStorage {
    async fn bucket(&self, name: &str) -> Result<Arc<dyn Bucket>, StorageError> {
        let bucket_url = format!(
            "{}/storage/v1/b/{}",
            self.base_url,
            urlencoding::encode(name)
        );
        get(&self.client, &self.tokens, &bucket_url, &[]).await?;
        info!("Resolved storage bucket '{}'", name);

        Ok(Arc::new(GcsBucket {
            client: self.client.clone(),
            tokens: self.tokens.clone(),
            name: name.to_string(),
            bucket_url,
        }))
    }
}

/// Handle to one GCS bucket.
pub struct GcsBucket {
    client: Client,
    tokens: Arc<TokenSource>,
    name: String,
    bucket_url: String,
}

#[async_trait]
impl Bucket for GcsBucket {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let url = format!("{}/o", self.bucket_url);
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("prefix", prefix)];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page: ObjectList = get(&self.client, &self.tokens, &url, &query)
                .await?
                .json()
                .await
                .map_err(|e| StorageError::Other(format!("Error parsing JSON: {}", e)))?;

            names.extend(page.items.into_iter().map(|entry| entry.name));
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(
            "Listed {} objects under '{}' in bucket '{}'",
            names.len(),
            prefix,
            self.name
        );
        Ok(names)
    }

    async fn download_text(&self, object: &str) -> Result<String, StorageError> {
        let url = format!("{}/o/{}", self.bucket_url, urlencoding::encode(object));
        get(&self.client, &self.tokens, &url, &[("alt", "media")])
            .await?
            .text()
            .await
            .map_err(|e| StorageError::Other(format!("Error reading response body: {}", e)))
    }
}
