use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to object storage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The storage API answered with a non-success status.
    #[error("{status} - {reason}")]
    Http { status: u16, reason: String },
    #[error("{0}")]
    Other(String),
}

impl StorageError {
    pub fn from_status(status: StatusCode) -> Self {
        StorageError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
        }
    }
}

/// Failure reading a secret.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("secret store returned {status} - {reason}")]
    Http { status: u16, reason: String },
    #[error("{0}")]
    Other(String),
}

/// A managed secret store holding versioned blobs.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the raw payload of the secret version addressed by `name`.
    async fn access_secret_version(&self, name: &str) -> Result<Vec<u8>, SecretError>;
}

/// An object storage service from which bucket handles are resolved.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Resolves a handle to the named bucket, failing if it does not exist.
    async fn bucket(&self, name: &str) -> Result<Arc<dyn Bucket>, StorageError>;
}

/// A handle to one bucket.
#[async_trait]
pub trait Bucket: Send + Sync {
    fn name(&self) -> &str;

    /// Full names of every object whose name starts with `prefix`, in listing order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Downloads the object contents as UTF-8 text.
    async fn download_text(&self, object: &str) -> Result<String, StorageError>;
}
