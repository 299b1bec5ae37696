use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use super::DatabaseError;
use super::dsn::Dsn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionMode {
    Local,
    Remote,
    EmbeddedReplica,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionMode::Local => f.write_str("local"),
            ConnectionMode::Remote => f.write_str("remote"),
            ConnectionMode::EmbeddedReplica => f.write_str("embedded replica"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub frame_no: Option<u64>,
    pub frames_synced: usize,
}

/// Owns a libsql database handle in one of the three connection modes.
///
/// Dropping the last clone releases the database; connections handed out by
/// [`Connector::connect`] are released when they are dropped.
#[derive(Clone)]
pub struct Connector {
    db: Arc<Database>,
    mode: ConnectionMode,
    target: String,
}

impl Connector {
    pub async fn local(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let db = Builder::new_local(path).build().await?;
        debug!("opened local database at {}", path.display());
        Ok(Self::wrap(db, ConnectionMode::Local, path.display().to_string()))
    }

    pub async fn memory() -> Result<Self, DatabaseError> {
        let db = Builder::new_local(":memory:").build().await?;
        Ok(Self::wrap(db, ConnectionMode::Local, ":memory:".to_string()))
    }

    pub async fn remote(
        url: impl Into<String>,
        auth_token: Option<&SecretString>,
    ) -> Result<Self, DatabaseError> {
        let url = url.into();
        let db = Builder::new_remote(url.clone(), token_string(auth_token))
            .build()
            .await?;
        debug!("opened remote database at {}", url);
        Ok(Self::wrap(db, ConnectionMode::Remote, url))
    }

    /// Binds a local replica file to a remote primary. Nothing is pulled until
    /// [`Connector::sync`] is called.
    pub async fn embedded_replica(
        path: impl Into<PathBuf>,
        url: impl Into<String>,
        auth_token: Option<&SecretString>,
    ) -> Result<Self, DatabaseError> {
        let path = path.into();
        let url = url.into();
        let db = Builder::new_remote_replica(&path, url.clone(), token_string(auth_token))
            .build()
            .await?;
        info!(
            "opened embedded replica at {} syncing from {}",
            path.display(),
            url
        );
        Ok(Self::wrap(db, ConnectionMode::EmbeddedReplica, url))
    }

    pub async fn from_dsn(dsn: &Dsn) -> Result<Self, DatabaseError> {
        match dsn {
            Dsn::Memory => Self::memory().await,
            Dsn::Local { path } => Self::local(path).await,
            Dsn::Remote { url, auth_token } => {
                Self::remote(url.as_str(), auth_token.as_ref()).await
            }
        }
    }

    fn wrap(db: Database, mode: ConnectionMode, target: String) -> Self {
        Self {
            db: Arc::new(db),
            mode,
            target,
        }
    }

    pub fn connect(&self) -> Result<Connection, DatabaseError> {
        Ok(self.db.connect()?)
    }

    pub async fn sync(&self) -> Result<SyncReport, DatabaseError> {
        if self.mode != ConnectionMode::EmbeddedReplica {
            return Err(DatabaseError::SyncUnsupported(self.mode));
        }
        let replicated = self.db.sync().await?;
        let report = SyncReport {
            frame_no: replicated.frame_no(),
            frames_synced: replicated.frames_synced(),
        };
        info!(
            "synced replica from {}: {} frames, now at frame {:?}",
            self.target, report.frames_synced, report.frame_no
        );
        Ok(report)
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("mode", &self.mode)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

fn token_string(auth_token: Option<&SecretString>) -> String {
    auth_token
        .map(|token| token.expose_secret().to_string())
        .unwrap_or_default()
}
