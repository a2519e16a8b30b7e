use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;

/// Deployment environment, selected through the `ENVIRONMENT` variable.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Developer machine: logs are appended to a local file.
    Local,
    /// Running on GCP: only errors are emitted, as JSON lines for the log agent.
    GcpDeployed,
}

/// Process level settings. Everything needed before the secret based
/// application config can be fetched lives here.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct Settings {
    #[serde(default)]
    pub environment: Option<Environment>,
    /// Full resource name of the secret version holding the application config.
    #[serde(default)]
    pub secret_path: Option<String>,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub gcp: GcpSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct AuthSettings {
    /// Timeout for a single login request against the auth API.
    pub timeout_in_ms: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            timeout_in_ms: 10_000,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct DatasetSettings {
    /// Number of rows shown per table on the patient data page.
    pub preview_rows: usize,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self { preview_rows: 20 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct SessionSettings {
    /// Seconds a session may go without a request before it is dropped.
    pub idle_timeout_in_s: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_in_s: 3600,
        }
    }
}

/// Endpoints of the Google APIs. Overridable so emulators and test servers can be used.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct GcpSettings {
    pub secret_manager_url: String,
    pub storage_url: String,
    pub metadata_url: String,
    /// Static OAuth access token. When unset the metadata server is asked for one.
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for GcpSettings {
    fn default() -> Self {
        Self {
            secret_manager_url: "https://secretmanager.googleapis.com".to_string(),
            storage_url: "https://storage.googleapis.com".to_string(),
            metadata_url: "http://metadata.google.internal".to_string(),
            access_token: None,
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8501".to_string()
}

impl Settings {
    /// Extracts settings from an already assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract::<Settings>()
    }
}

/// Load settings from an optional "config.yaml" in the current directory,
/// overridden by the `ENVIRONMENT` and `SECRET_PATH` variables.
pub fn load_settings() -> Result<Settings, figment::Error> {
    let figment = Figment::new()
        .merge(Yaml::file("./config.yaml"))
        .merge(Env::raw().only(&["environment", "secret_path"]));
    Settings::from_figment(figment)
}

/// Print the JSON schema for the settings to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Settings);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
