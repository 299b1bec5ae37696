pub use self::parser::{
    Config, DEFAULT_DATABASE_URL, DatabaseConfig, LoggingConfig, OrmSettings, database_url,
};
pub use self::validator::ConfigError;

mod parser;
mod validator;
