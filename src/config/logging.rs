use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// LoggingConfig controls where the tracing output goes.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct LoggingConfig {
    pub file: String, // appended to in the local environment
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "website.log".to_string(),
            service_name: "portfolio".to_string(),
        }
    }
}
