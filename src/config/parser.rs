use super::ConfigError;
use crate::db::Dsn;
use crate::orm::OrmConfig;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "http://localhost:18080";

/// The remote endpoint from `DATABASE_URL`, falling back to a local server.
pub fn database_url() -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub orm: OrmSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default, alias = "dsn")]
    pub url: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub replica_path: Option<String>,
    #[serde(default)]
    pub sync_on_open: bool,
}

impl DatabaseConfig {
    pub fn connection_string(&self) -> String {
        match self.url {
            Some(ref url) if !url.is_empty() => url.clone(),
            _ => DEFAULT_DATABASE_URL.to_string(),
        }
    }

    pub fn auth_token(&self) -> Option<SecretString> {
        self.auth_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .map(|token| SecretString::from(token.to_string()))
    }

    /// Parses the connection string. A remote target without an `authToken`
    /// in its URL picks up the configured token.
    pub fn target(&self) -> Result<Dsn, ConfigError> {
        let dsn = Dsn::parse(&self.connection_string())
            .map_err(|e| ConfigError::InvalidConfig(format!("database.url: {e}")))?;
        Ok(match dsn {
            Dsn::Remote { url, auth_token } => Dsn::Remote {
                url,
                auth_token: auth_token.or_else(|| self.auth_token()),
            },
            other => other,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrmSettings {
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
    #[serde(default)]
    pub disable_automatic_ping: bool,
}

impl Default for OrmSettings {
    fn default() -> Self {
        Self {
            slow_threshold_ms: default_slow_threshold_ms(),
            disable_automatic_ping: false,
        }
    }
}

impl From<&OrmSettings> for OrmConfig {
    fn from(settings: &OrmSettings) -> Self {
        OrmConfig {
            slow_threshold: Duration::from_millis(settings.slow_threshold_ms),
            disable_automatic_ping: settings.disable_automatic_ping,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        Self::load_from_file(&config_path)
    }

    /// Like [`Config::load`], but a missing file yields defaults plus
    /// environment overrides.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => std::env::var("CONFIG_PATH")
                .unwrap_or_else(|_| "config.yaml".to_string())
                .into(),
        };
        if path.exists() {
            return Self::load_from_file(&path);
        }
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = Some(value);
        }
        if let Some(value) = lookup("LIBSQL_AUTH_TOKEN") {
            self.database.auth_token = Some(value);
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_slow_threshold_ms() -> u64 {
    200
}
