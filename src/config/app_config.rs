use std::collections::HashMap;
use std::fmt;
use std::string::FromUtf8Error;
use std::sync::Arc;

use reqwest::Url;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::store::{Bucket, ObjectStorage, SecretError, SecretStore};

/// Key in `dataset_paths` naming the MIMIC-III patient data prefix.
pub const MIMIC_III_DATASET: &str = "MIMICIII";

/// Application config resolved from the secret store. Immutable once loaded.
pub struct AppConfig {
    pub user_auth_api: Url,
    pub storage_bucket: Arc<dyn Bucket>,
    /// Logical dataset name -> storage prefix.
    pub dataset_paths: HashMap<String, String>,
}

impl AppConfig {
    pub fn dataset_path(&self, dataset: &str) -> Option<&str> {
        self.dataset_paths.get(dataset).map(String::as_str)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("user_auth_api", &self.user_auth_api.as_str())
            .field("storage_bucket", &self.storage_bucket.name())
            .field("dataset_paths", &self.dataset_paths)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access secret version: {0}")]
    Secret(#[from] SecretError),
    #[error("secret payload is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
    #[error("secret payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// One entry per field that could not be resolved.
    #[error("configuration could not be resolved: {}", .0.join("; "))]
    Unresolved(Vec<String>),
}

/// Fetches the secret at `secret_path` and resolves it into an [`AppConfig`].
///
/// The secret must decode to a UTF-8 JSON object with the keys
/// `storage_bucket_name`, `user_auth_api` and `dataset_paths`. All field
/// problems are gathered and returned together in [`ConfigError::Unresolved`].
pub async fn load_config(
    secret_path: &str,
    secrets: &dyn SecretStore,
    storage: &dyn ObjectStorage,
) -> Result<AppConfig, ConfigError> {
    let payload = secrets.access_secret_version(secret_path).await.map_err(|e| {
        error!("Failed to access secret version: {}", e);
        e
    })?;
    let text = String::from_utf8(payload)?;
    let raw: Value = serde_json::from_str(&text)?;
    let raw = match raw {
        Value::Object(map) => map,
        _ => {
            let problem = "secret payload is not a JSON object".to_string();
            error!("{}", problem);
            return Err(ConfigError::Unresolved(vec![problem]));
        }
    };

    let mut problems = Vec::new();

    let storage_bucket = match required_str(&raw, "storage_bucket_name") {
        Ok(name) => match storage.bucket(name).await {
            Ok(bucket) => Some(bucket),
            Err(e) => {
                problems.push(format!("storage bucket '{}' could not be resolved: {}", name, e));
                None
            }
        },
        Err(problem) => {
            problems.push(problem);
            None
        }
    };

    let user_auth_api = match required_str(&raw, "user_auth_api").and_then(parse_endpoint) {
        Ok(url) => Some(url),
        Err(problem) => {
            problems.push(problem);
            None
        }
    };

    let dataset_paths = match dataset_paths(&raw) {
        Ok(paths) => Some(paths),
        Err(problem) => {
            problems.push(problem);
            None
        }
    };

    match (storage_bucket, user_auth_api, dataset_paths) {
        (Some(storage_bucket), Some(user_auth_api), Some(dataset_paths)) if problems.is_empty() => {
            info!(
                "Loaded application config with {} dataset paths",
                dataset_paths.len()
            );
            Ok(AppConfig {
                user_auth_api,
                storage_bucket,
                dataset_paths,
            })
        }
        _ => {
            for problem in &problems {
                error!("{}", problem);
            }
            Err(ConfigError::Unresolved(problems))
        }
    }
}

fn required_str<'a>(raw: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
    match raw.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(_) => Err(format!("`{}` must be a non-empty string", key)),
        None => Err(format!("`{}` is missing", key)),
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("`user_auth_api` is not a valid URL: {}", e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("`user_auth_api` has unsupported scheme '{}'", other)),
    }
}

fn dataset_paths(raw: &Map<String, Value>) -> Result<HashMap<String, String>, String> {
    let entries = match raw.get("dataset_paths") {
        Some(Value::Object(entries)) => entries,
        Some(_) => return Err("`dataset_paths` must be an object".to_string()),
        None => return Err("`dataset_paths` is missing".to_string()),
    };

    let mut paths = HashMap::new();
    for (name, value) in entries {
        match value {
            Value::String(prefix) => {
                paths.insert(name.clone(), prefix.clone());
            }
            _ => return Err(format!("`dataset_paths.{}` must be a string", name)),
        }
    }
    if !paths.contains_key(MIMIC_III_DATASET) {
        return Err(format!("`dataset_paths.{}` is missing", MIMIC_III_DATASET));
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBucket, MemorySecretStore, MemoryStorage};

    const SECRET: &str = "projects/p/secrets/portfolio/versions/latest";

    fn storage() -> MemoryStorage {
        MemoryStorage::new().with_bucket(Arc::new(MemoryBucket::new("portfolio-data")))
    }

    fn secrets(payload: &str) -> MemorySecretStore {
        MemorySecretStore::new().with_secret(SECRET, payload.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn complete_secret_resolves_every_field() {
        let payload = r#"{
            "storage_bucket_name": "portfolio-data",
            "user_auth_api": "https://auth.example.com/login",
            "dataset_paths": {"MIMICIII": "mimic-iii/"}
        }"#;

        let config = load_config(SECRET, &secrets(payload), &storage()).await.unwrap();

        assert_eq!(config.user_auth_api.as_str(), "https://auth.example.com/login");
        assert_eq!(config.storage_bucket.name(), "portfolio-data");
        assert_eq!(config.dataset_path(MIMIC_III_DATASET), Some("mimic-iii/"));
    }

    #[tokio::test]
    async fn missing_secret_fails_the_whole_load() {
        let err = load_config(SECRET, &MemorySecretStore::new(), &storage())
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Secret(SecretError::Http { status: 404, .. })));
    }

    #[tokio::test]
    async fn invalid_json_is_reported() {
        let err = load_config(SECRET, &secrets("not json"), &storage())
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[tokio::test]
    async fn non_utf8_payload_is_reported() {
        let store = MemorySecretStore::new().with_secret(SECRET, vec![0xff, 0xfe]);
        let err = load_config(SECRET, &store, &storage()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Encoding(_)));
    }

    #[tokio::test]
    async fn every_unresolved_field_is_collected() {
        let payload = r#"{
            "storage_bucket_name": "unknown-bucket",
            "user_auth_api": "not a url",
            "dataset_paths": {"OTHER": "x/"}
        }"#;

        let err = load_config(SECRET, &secrets(payload), &storage())
            .await
            .unwrap_err();

        match err {
            ConfigError::Unresolved(problems) => {
                assert_eq!(problems.len(), 3);
                assert!(problems[0].contains("unknown-bucket"));
                assert!(problems[0].contains("404 - Not Found"));
                assert!(problems[1].contains("user_auth_api"));
                assert!(problems[2].contains("MIMICIII"));
            }
            other => panic!("expected unresolved fields, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_keys_are_named() {
        let err = load_config(SECRET, &secrets("{}"), &storage())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration could not be resolved: `storage_bucket_name` is missing; \
             `user_auth_api` is missing; `dataset_paths` is missing"
        );
    }

    #[tokio::test]
    async fn non_http_endpoint_is_rejected() {
        let payload = r#"{
            "storage_bucket_name": "portfolio-data",
            "user_auth_api": "ftp://auth.example.com",
            "dataset_paths": {"MIMICIII": "mimic-iii/"}
        }"#;
        let err = load_config(SECRET, &secrets(payload), &storage())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }
}
