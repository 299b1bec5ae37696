use std::fmt;

use async_trait::async_trait;
use libsql::{Connection, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::OnceCell;
use tracing::debug;

use super::connector::Connector;
use super::dsn::Dsn;
use super::value::literal;
use super::DatabaseError;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)?$")
        .expect("identifier pattern is valid")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    Integer,
    Real,
    Text,
    Blob,
}

/// The surface an ORM session needs from a SQL backend.
#[async_trait]
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produces the connection every statement of a session runs on.
    async fn initialize(&self) -> Result<Connection, DatabaseError>;

    fn bind_var(&self, position: usize) -> String;

    fn quote(&self, identifier: &str) -> String;

    fn data_type_of(&self, column: ColumnType) -> &'static str;

    /// Inlines bound values into `sql`. Only meant for logs.
    fn explain(&self, sql: &str, vars: &[Value]) -> String;
}

pub fn validate_identifier(identifier: &str) -> Result<(), DatabaseError> {
    if IDENTIFIER.is_match(identifier) {
        Ok(())
    } else {
        Err(DatabaseError::InvalidIdentifier(identifier.to_string()))
    }
}

/// Options for [`LibsqlDialect::new`].
///
/// `conn` wins when both are set: every statement runs on it, and `dsn` is
/// kept as the sync target.
#[derive(Clone, Default)]
pub struct DialectConfig {
    pub dsn: Option<String>,
    pub conn: Option<Connection>,
}

impl DialectConfig {
    pub fn with_dsn(dsn: impl Into<String>) -> Self {
        Self {
            dsn: Some(dsn.into()),
            conn: None,
        }
    }

    pub fn with_connection(conn: Connection) -> Self {
        Self {
            dsn: None,
            conn: Some(conn),
        }
    }

    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    pub fn connection(mut self, conn: Connection) -> Self {
        self.conn = Some(conn);
        self
    }
}

impl fmt::Debug for DialectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectConfig")
            .field("dsn", &self.dsn)
            .field("conn", &self.conn.as_ref().map(|_| "<open connection>"))
            .finish()
    }
}

pub struct LibsqlDialect {
    dsn: Option<Dsn>,
    conn: Option<Connection>,
    connector: OnceCell<Connector>,
}

impl LibsqlDialect {
    pub fn open(dsn: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            dsn: Some(Dsn::parse(dsn)?),
            conn: None,
            connector: OnceCell::new(),
        })
    }

    pub fn new(config: DialectConfig) -> Result<Self, DatabaseError> {
        let dsn = match config.dsn.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(Dsn::parse(raw)?),
            _ => None,
        };
        if dsn.is_none() && config.conn.is_none() {
            return Err(DatabaseError::NoConnectionSource);
        }
        Ok(Self {
            dsn,
            conn: config.conn,
            connector: OnceCell::new(),
        })
    }

    pub fn dsn(&self) -> Option<&Dsn> {
        self.dsn.as_ref()
    }

    /// The connector built from the DSN, once [`Dialect::initialize`] has run
    /// without a caller-supplied connection.
    pub fn connector(&self) -> Option<&Connector> {
        self.connector.get()
    }
}

impl fmt::Debug for LibsqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibsqlDialect")
            .field("dsn", &self.dsn.as_ref().map(ToString::to_string))
            .field("has_conn", &self.conn.is_some())
            .finish()
    }
}

#[async_trait]
impl Dialect for LibsqlDialect {
    fn name(&self) -> &'static str {
        "libsql"
    }

    async fn initialize(&self) -> Result<Connection, DatabaseError> {
        if let Some(conn) = &self.conn {
            debug!("using caller-supplied libsql connection");
            return Ok(conn.clone());
        }
        let dsn = self.dsn.as_ref().ok_or(DatabaseError::NoConnectionSource)?;
        let connector = self
            .connector
            .get_or_try_init(|| Connector::from_dsn(dsn))
            .await?;
        connector.connect()
    }

    fn bind_var(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn quote(&self, identifier: &str) -> String {
        identifier
            .split('.')
            .map(|part| format!("`{}`", part.replace('`', "``")))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn data_type_of(&self, column: ColumnType) -> &'static str {
        match column {
            ColumnType::Bool => "NUMERIC",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
        }
    }

    fn explain(&self, sql: &str, vars: &[Value]) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut chars = sql.chars().peekable();
        let mut quote: Option<char> = None;
        // bare `?` takes the slot after the highest one used so far
        let mut next_slot = 0usize;
        while let Some(ch) = chars.next() {
            match (quote, ch) {
                (Some(open), c) if c == open => quote = None,
                (None, '\'' | '"' | '`') => quote = Some(ch),
                (None, '?') => {
                    let mut digits = String::new();
                    while let Some(d) = chars.next_if(char::is_ascii_digit) {
                        digits.push(d);
                    }
                    let slot = match digits.parse::<usize>() {
                        Ok(n) if n > 0 => n - 1,
                        Ok(_) => usize::MAX,
                        Err(_) => next_slot,
                    };
                    match vars.get(slot) {
                        Some(value) => {
                            out.push_str(&literal(value));
                            next_slot = next_slot.max(slot + 1);
                        }
                        None => {
                            out.push('?');
                            out.push_str(&digits);
                        }
                    }
                    continue;
                }
                _ => {}
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use libsql::Value;
    use test_case::test_case;

    use super::{validate_identifier, ColumnType, Dialect, DialectConfig, LibsqlDialect};
    use crate::db::dsn::DsnError;
    use crate::db::{Connector, DatabaseError};

    fn dialect() -> LibsqlDialect {
        LibsqlDialect::open(":memory:").expect("memory dialect")
    }

    #[test]
    fn open_rejects_unparsable_dsn() {
        let err = LibsqlDialect::open("mysql://localhost/db").unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Dsn(DsnError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn new_requires_a_connection_source() {
        assert!(matches!(
            LibsqlDialect::new(DialectConfig::default()),
            Err(DatabaseError::NoConnectionSource)
        ));
        assert!(matches!(
            LibsqlDialect::new(DialectConfig::with_dsn("  ")),
            Err(DatabaseError::NoConnectionSource)
        ));
    }

    #[test]
    fn new_keeps_dsn_as_informational() {
        let dialect = LibsqlDialect::new(DialectConfig::with_dsn("http://localhost:18080")).unwrap();
        assert!(dialect.dsn().is_some_and(|dsn| dsn.is_remote()));
        assert!(dialect.connector().is_none());
    }

    #[test_case("users", "`users`" ; "plain")]
    #[test_case("main.users", "`main`.`users`" ; "schema qualified")]
    #[test_case("we`ird", "`we``ird`" ; "embedded backtick")]
    fn quotes_identifiers(input: &str, expected: &str) {
        assert_eq!(dialect().quote(input), expected);
    }

    #[test]
    fn maps_column_types_to_affinities() {
        let d = dialect();
        assert_eq!(d.data_type_of(ColumnType::Integer), "INTEGER");
        assert_eq!(d.data_type_of(ColumnType::Bool), "NUMERIC");
        assert_eq!(d.data_type_of(ColumnType::Text), "TEXT");
        assert_eq!(d.bind_var(3), "?");
        assert_eq!(d.name(), "libsql");
    }

    #[test]
    fn explain_inlines_vars_outside_string_literals() {
        let sql = "SELECT * FROM foo WHERE id = ? AND note = '?' AND name = ?";
        let explained = dialect().explain(
            sql,
            &[Value::Integer(42), Value::Text("m1".to_string())],
        );
        assert_eq!(
            explained,
            "SELECT * FROM foo WHERE id = 42 AND note = '?' AND name = \"m1\""
        );
    }

    #[test]
    fn explain_handles_numbered_placeholders() {
        let d = dialect();
        let vars = [Value::Integer(42), Value::Text("m1".to_string())];
        assert_eq!(d.explain("WHERE id = ?1", &vars[..1]), "WHERE id = 42");
        assert_eq!(
            d.explain("WHERE name = ?2 AND id = ?1 OR id = ?", &vars),
            "WHERE name = \"m1\" AND id = 42 OR id = ?"
        );
        assert_eq!(d.explain("WHERE id = ?1 AND x = ?", &vars), "WHERE id = 42 AND x = \"m1\"");
        assert_eq!(d.explain("WHERE id = ?7", &vars), "WHERE id = ?7");
    }

    #[tokio::test]
    async fn new_rejects_malformed_dsn_next_to_a_connection() {
        let connector = Connector::memory().await.expect("memory connector");
        let conn = connector.connect().expect("connection");
        let err = LibsqlDialect::new(DialectConfig::with_connection(conn).dsn("ftp://x")).unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Dsn(DsnError::UnsupportedScheme(_))
        ));
    }

    #[test_case("foo_123", true ; "snake case")]
    #[test_case("main.foo", true ; "qualified")]
    #[test_case("1foo", false ; "leading digit")]
    #[test_case("foo; DROP TABLE bar", false ; "injection")]
    #[test_case("", false ; "empty")]
    fn validates_identifiers(input: &str, valid: bool) {
        assert_eq!(validate_identifier(input).is_ok(), valid);
    }
}
