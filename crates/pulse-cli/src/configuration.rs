use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment, File};
use pulse::transport::configs::DatabricksTransportConfig;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct DatabricksSettings {
    pub host: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl DatabricksSettings {
    pub fn into_config(self) -> DatabricksTransportConfig {
        DatabricksTransportConfig::new(self.host, self.token)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub serving_endpoint: String,
    pub databricks: DatabricksSettings,
}

/// Values given on the command line, applied over every other source
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub serving_endpoint: Option<String>,
    pub host: Option<String>,
    pub token: Option<String>,
}

impl Settings {
    pub fn new(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::load(default_config_file().as_deref(), overrides)
    }

    pub fn load(config_file: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().set_default("databricks.timeout_secs", default_timeout_secs())?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("PULSE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // The variables every Databricks tool understands
            .set_override_option("serving_endpoint", env::var("SERVING_ENDPOINT").ok())?
            .set_override_option("databricks.host", env::var("DATABRICKS_HOST").ok())?
            .set_override_option("databricks.token", env::var("DATABRICKS_TOKEN").ok())?
            .set_override_option("serving_endpoint", overrides.serving_endpoint)?
            .set_override_option("databricks.host", overrides.host)?
            .set_override_option("databricks.token", overrides.token)?
            .build()?;

        match config.try_deserialize::<Self>() {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pulse").join("config.toml"))
}

fn default_timeout_secs() -> u64 {
    600
}
