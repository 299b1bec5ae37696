use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use libsql::params::Params;
use libsql::{Connection, Value};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, error, info, warn};

use super::migrator::Migrator;
use super::query::{RawQuery, TableQuery};
use crate::db::value::collect_rows;
use crate::db::{DatabaseError, Dialect};

#[derive(Clone, Debug)]
pub struct OrmConfig {
    /// Statements slower than this are logged at `warn`.
    pub slow_threshold: Duration,
    pub disable_automatic_ping: bool,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            slow_threshold: Duration::from_millis(200),
            disable_automatic_ping: false,
        }
    }
}

/// An open session. Clones share the dialect and the underlying connection.
#[derive(Clone)]
pub struct Orm {
    dialect: Arc<dyn Dialect>,
    conn: Connection,
    config: OrmConfig,
}

impl Orm {
    pub async fn open<D>(dialect: D, config: OrmConfig) -> Result<Self, DatabaseError>
    where
        D: Dialect + 'static,
    {
        let dialect: Arc<dyn Dialect> = Arc::new(dialect);
        let conn = dialect.initialize().await?;
        let orm = Self {
            dialect,
            conn,
            config,
        };

        if !orm.config.disable_automatic_ping {
            orm.ping().await?;
        }
        info!("opened {} session", orm.dialect.name());
        Ok(orm)
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.query_rows("SELECT 1", Vec::new()).await.map(|_| ())
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn raw(&self, sql: impl Into<String>, vars: Vec<Value>) -> RawQuery<'_> {
        RawQuery::new(self, sql.into(), vars)
    }

    /// Runs a statement that returns no rows and reports the affected row count.
    pub async fn exec(&self, sql: &str, vars: Vec<Value>) -> Result<u64, DatabaseError> {
        let started = Instant::now();
        let explained = self.dialect.explain(sql, &vars);
        let result = self
            .conn
            .execute(sql, Params::Positional(vars))
            .await
            .map_err(DatabaseError::from);
        let rows = result.as_ref().map_or(0, |affected| *affected);
        self.trace(&explained, started.elapsed(), rows, result.as_ref().err());
        result
    }

    pub fn table(&self, name: impl Into<String>) -> TableQuery<'_> {
        TableQuery::new(self, name.into())
    }

    pub fn migrator(&self) -> Migrator<'_> {
        Migrator::new(self)
    }

    pub(crate) async fn query_rows(
        &self,
        sql: &str,
        vars: Vec<Value>,
    ) -> Result<Vec<Map<String, JsonValue>>, DatabaseError> {
        let started = Instant::now();
        let explained = self.dialect.explain(sql, &vars);
        let result = match self.conn.query(sql, Params::Positional(vars)).await {
            Ok(rows) => collect_rows(rows).await,
            Err(err) => Err(err.into()),
        };
        let rows = result.as_ref().map_or(0, |rows| rows.len() as u64);
        self.trace(&explained, started.elapsed(), rows, result.as_ref().err());
        result
    }

    fn trace(&self, sql: &str, elapsed: Duration, rows: u64, err: Option<&DatabaseError>) {
        let millis = elapsed.as_secs_f64() * 1000.0;
        if let Some(err) = err {
            error!(rows, elapsed_ms = millis, "{sql}: {err}");
        } else if elapsed > self.config.slow_threshold {
            warn!(
                rows,
                elapsed_ms = millis,
                "slow sql >= {:?}: {sql}",
                self.config.slow_threshold
            );
        } else {
            debug!(rows, elapsed_ms = millis, "{sql}");
        }
    }
}

impl fmt::Debug for Orm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orm")
            .field("dialect", &self.dialect.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
