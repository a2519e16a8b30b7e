pub mod base;
pub mod gcp_secret_manager;
pub mod gcp_token;
pub mod gcs_store;
pub mod memory_store;

// Re-export the primary store items so code outside can do
// "use crate::store::{Bucket, ObjectStorage, SecretStore};"
pub use base::{Bucket, ObjectStorage, SecretError, SecretStore, StorageError};
pub use gcp_secret_manager::SecretManagerClient;
pub use gcp_token::TokenSource;
pub use gcs_store::GcsStorage;
pub use memory_store::{MemoryBucket, MemorySecretStore, MemoryStorage};
