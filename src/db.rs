pub use self::connector::{ConnectionMode, Connector, SyncReport};
pub use self::dialect::{ColumnType, Dialect, DialectConfig, LibsqlDialect, validate_identifier};
pub use self::dsn::{Dsn, DsnError};
pub use self::error::DatabaseError;

pub mod connector;
pub mod dialect;
pub mod dsn;
pub mod error;
pub mod value;
