//! An ORM dialect adapter for libsql.
//!
//! [`LibsqlDialect`] bridges the [`Orm`] session layer to a libsql database in
//! one of three modes: a local file, a remote server over HTTP, or an embedded
//! replica that mirrors a remote primary and is refreshed with
//! [`Connector::sync`].
//!
//! ```rust,ignore
//! use libsql_dialect::{Connector, DialectConfig, LibsqlDialect, Orm, OrmConfig};
//!
//! let connector = Connector::embedded_replica("replica.db", "http://localhost:18080", None).await?;
//! let config = DialectConfig::with_connection(connector.connect()?).dsn("http://localhost:18080");
//! let orm = Orm::open(LibsqlDialect::new(config)?, OrmConfig::default()).await?;
//! let one: i64 = orm.raw("SELECT 1", vec![]).scan().await?;
//! connector.sync().await?;
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod db;
pub mod logging;
pub mod orm;

pub use db::{
    ColumnType, ConnectionMode, Connector, DatabaseError, Dialect, DialectConfig, Dsn, DsnError,
    LibsqlDialect, SyncReport,
};
pub use orm::{Column, Migrator, Orm, OrmConfig};
