use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{BrowserError, Result};

/// Settings for talking to the remote endpoint and seeding the local pane
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Endpoint URL, e.g. http://example.com/path/to/shell.php
    #[serde(default)]
    pub endpoint: String,

    /// Request timeout in seconds; 0 disables the timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Form field selecting the evaluation mode
    #[serde(default = "default_trigger_field")]
    pub trigger_field: String,

    /// Value sent in the trigger field
    #[serde(default = "default_trigger_value")]
    pub trigger_value: String,

    /// Form field carrying the code to evaluate
    #[serde(default = "default_code_field")]
    pub code_field: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Treat a reply without markers as an error instead of empty output
    #[serde(default)]
    pub strict_framing: bool,

    /// Starting directory for the local pane
    #[serde(default)]
    pub local_dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_trigger_field() -> String {
    "_".to_string()
}
fn default_trigger_value() -> String {
    "create_function".to_string()
}
fn default_code_field() -> String {
    "POST".to_string()
}
fn default_user_agent() -> String {
    format!("dualpane/{}", env!("CARGO_PKG_VERSION"))
}

impl BrowserConfig {
    /// Default settings for the given endpoint
    pub fn from_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: default_timeout_secs(),
            trigger_field: default_trigger_field(),
            trigger_value: default_trigger_value(),
            code_field: default_code_field(),
            user_agent: default_user_agent(),
            strict_framing: false,
            local_dir: None,
        }
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Parse and check the endpoint URL
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint).map_err(|e| BrowserError::InvalidConfig {
            message: format!("invalid endpoint {:?}: {}", self.endpoint, e),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(BrowserError::InvalidConfig {
                message: format!("unsupported endpoint scheme {:?}", url.scheme()),
            });
        }

        if url.host_str().is_none() {
            return Err(BrowserError::InvalidConfig {
                message: format!("endpoint {:?} has no host", self.endpoint),
            });
        }

        Ok(url)
    }

    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;

        if self.trigger_field.is_empty() || self.code_field.is_empty() {
            return Err(BrowserError::InvalidConfig {
                message: "form field names must not be empty".to_string(),
            });
        }

        if self.trigger_field == self.code_field {
            return Err(BrowserError::InvalidConfig {
                message: format!(
                    "trigger and code fields are both {:?}",
                    self.code_field
                ),
            });
        }

        Ok(())
    }
}
