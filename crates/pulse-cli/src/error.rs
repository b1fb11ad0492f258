use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: set the {env_var} environment variable")]
    MissingEnvVar { env_var: String },
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Name the environment variable that supplies a settings field
pub fn to_env_var(field: &str) -> String {
    match field {
        "serving_endpoint" => "SERVING_ENDPOINT".to_string(),
        "host" | "databricks.host" => "DATABRICKS_HOST".to_string(),
        "token" | "databricks.token" => "DATABRICKS_TOKEN".to_string(),
        other => format!("PULSE_{}", other.replace('.', "__").to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("serving_endpoint"), "SERVING_ENDPOINT");
        assert_eq!(to_env_var("host"), "DATABRICKS_HOST");
        assert_eq!(
            to_env_var("databricks.timeout_secs"),
            "PULSE_DATABRICKS__TIMEOUT_SECS"
        );
    }
}
