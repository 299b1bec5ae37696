//! A small ORM session layer that talks to any [`Dialect`](crate::db::Dialect).
//!
//! ```rust,ignore
//! use libsql_dialect::{LibsqlDialect, Orm, OrmConfig};
//!
//! let orm = Orm::open(LibsqlDialect::open("file:app.db")?, OrmConfig::default()).await?;
//! let one: i64 = orm.raw("SELECT 1", vec![]).scan().await?;
//! ```

pub use self::migrator::{Column, Migrator};
pub use self::query::{RawQuery, TableQuery};
pub use self::session::{Orm, OrmConfig};

pub mod migrator;
pub mod query;
pub mod session;
