use thiserror::Error;

use super::parser::Config;
use crate::db::Dsn;

const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dsn = self.database.connection_string();
        let parsed = Dsn::parse(&dsn)
            .map_err(|e| ConfigError::InvalidConfig(format!("database.url: {e}")))?;

        if self.database.replica_path.is_some() && !parsed.is_remote() {
            return Err(ConfigError::InvalidConfig(
                "database.replica_path needs a remote database.url to sync from".to_string(),
            ));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "logging.format must be one of {}",
                LOG_FORMATS.join(", ")
            )));
        }

        Ok(())
    }
}
