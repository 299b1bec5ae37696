use libsql::Value;

use super::session::Orm;
use crate::db::{ColumnType, DatabaseError, validate_identifier};

#[derive(Clone, Debug)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            not_null: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

/// Schema operations, rendered through the session's dialect.
pub struct Migrator<'a> {
    orm: &'a Orm,
}

impl<'a> Migrator<'a> {
    pub(crate) fn new(orm: &'a Orm) -> Self {
        Self { orm }
    }

    pub async fn has_table(&self, name: &str) -> Result<bool, DatabaseError> {
        let count: i64 = self
            .orm
            .raw(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                vec![Value::Text(name.to_string())],
            )
            .scan()
            .await?;
        Ok(count > 0)
    }

    pub async fn create_table(&self, name: &str, columns: &[Column]) -> Result<(), DatabaseError> {
        validate_identifier(name)?;
        let dialect = self.orm.dialect();

        let mut definitions = Vec::with_capacity(columns.len());
        for column in columns {
            validate_identifier(&column.name)?;
            let mut definition = format!(
                "{} {}",
                dialect.quote(&column.name),
                dialect.data_type_of(column.column_type)
            );
            if column.primary_key {
                definition.push_str(" PRIMARY KEY");
            }
            if column.not_null {
                definition.push_str(" NOT NULL");
            }
            definitions.push(definition);
        }

        let sql = format!(
            "CREATE TABLE {} ({})",
            dialect.quote(name),
            definitions.join(",")
        );
        self.orm.exec(&sql, Vec::new()).await.map(|_| ())
    }

    pub async fn drop_table(&self, name: &str) -> Result<(), DatabaseError> {
        validate_identifier(name)?;
        let sql = format!("DROP TABLE IF EXISTS {}", self.orm.dialect().quote(name));
        self.orm.exec(&sql, Vec::new()).await.map(|_| ())
    }
}
