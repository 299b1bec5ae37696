use thiserror::Error;

use super::connector::ConnectionMode;
use super::dsn::DsnError;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("invalid dsn: {0}")]
    Dsn(#[from] DsnError),
    #[error("dialect config needs a dsn or an open connection")]
    NoConnectionSource,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("libsql error: {0}")]
    Driver(#[from] libsql::Error),
    #[error("sync is only available on embedded replicas, not on {0} connections")]
    SyncUnsupported(ConnectionMode),
    #[error("record not found")]
    RecordNotFound,
    #[error("failed to decode row: {0}")]
    Decode(String),
    #[error("failed to encode value: {0}")]
    Encode(String),
    #[error("refusing to run {0} without a where clause")]
    MissingWhereClause(&'static str),
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}
