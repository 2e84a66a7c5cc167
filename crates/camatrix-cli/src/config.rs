//! Runtime configuration for the camatrix binary.
//!
//! Settings come from `CAMATRIX_`-prefixed environment variables layered
//! over defaults. Credentials have no defaults and are validated before
//! any network call: running without them is a fatal configuration error,
//! not a mid-run surprise.

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

/// All settings the binary needs.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    /// Directory tenant id. Environment variable: `CAMATRIX_TENANT_ID`
    #[serde(default)]
    pub tenant_id: String,

    /// Application (client) id. Environment variable: `CAMATRIX_CLIENT_ID`
    #[serde(default)]
    pub client_id: String,

    /// Client secret. Environment variable: `CAMATRIX_CLIENT_SECRET`
    #[serde(default)]
    pub client_secret: String,

    /// Port the local diff report is served on.
    /// Environment variable: `CAMATRIX_REPORT_PORT`
    #[serde(default = "default_report_port")]
    pub report_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            report_port: default_report_port(),
        }
    }
}

fn default_report_port() -> u16 {
    3000
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl Settings {
    /// Loads settings from the environment and validates them.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(Environment::with_prefix("CAMATRIX"))
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects missing credentials before the run starts.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        for (variable, value) in [
            ("CAMATRIX_TENANT_ID", &self.tenant_id),
            ("CAMATRIX_CLIENT_ID", &self.client_id),
            ("CAMATRIX_CLIENT_SECRET", &self.client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigLoadError::Invalid {
                    message: format!("{variable} must be set"),
                });
            }
        }

        if self.report_port == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "CAMATRIX_REPORT_PORT must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
