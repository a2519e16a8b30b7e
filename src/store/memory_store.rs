use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::base::{Bucket, ObjectStorage, SecretError, SecretStore, StorageError};

/// Secret store backed by a map, for local runs and tests.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: HashMap<String, Vec<u8>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        self.secrets.insert(name.into(), payload.into());
        self
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn access_secret_version(&self, name: &str) -> Result<Vec<u8>, SecretError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::Http {
                status: 404,
                reason: "Not Found".to_string(),
            })
    }
}

/// Object storage holding in-memory buckets.
#[derive(Default)]
pub struct MemoryStorage {
    buckets: HashMap<String, Arc<MemoryBucket>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, bucket: Arc<MemoryBucket>) -> Self {
        self.buckets.insert(bucket.name.clone(), bucket);
        self
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn bucket(&self, name: &str) -> Result<Arc<dyn Bucket>, StorageError> {
        match self.buckets.get(name) {
            Some(bucket) => Ok(bucket.clone() as Arc<dyn Bucket>),
            None => Err(StorageError::Http {
                status: 404,
                reason: "Not Found".to_string(),
            }),
        }
    }
}

/// A bucket whose objects live in a sorted map. Counts list calls so callers
/// can observe how often a prefix was fetched.
#[derive(Default)]
pub struct MemoryBucket {
    name: String,
    objects: BTreeMap<String, String>,
    list_failure: Option<StorageError>,
    download_failures: HashMap<String, StorageError>,
    list_calls: AtomicUsize,
}

impl MemoryBucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_object(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.objects.insert(name.into(), contents.into());
        self
    }

    /// Makes every `list` call fail with `error`.
    pub fn failing_list(mut self, error: StorageError) -> Self {
        self.list_failure = Some(error);
        self
    }

    /// Makes downloads of `object` fail with `error`.
    pub fn failing_download(mut self, object: impl Into<String>, error: StorageError) -> Self {
        self.download_failures.insert(object.into(), error);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Bucket for MemoryBucket {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.list_failure {
            return Err(error.clone());
        }
        let names: Vec<String> = self
            .objects
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect();
        debug!("Memory bucket '{}' listed {} objects", self.name, names.len());
        Ok(names)
    }

    async fn download_text(&self, object: &str) -> Result<String, StorageError> {
        if let Some(error) = self.download_failures.get(object) {
            return Err(error.clone());
        }
        self.objects.get(object).cloned().ok_or(StorageError::Http {
            status: 404,
            reason: "Not Found".to_string(),
        })
    }
}
