use libsql::Value;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::session::Orm;
use crate::db::value::{decode_row, model_columns};
use crate::db::{DatabaseError, validate_identifier};

/// A raw SQL statement waiting to be scanned.
pub struct RawQuery<'a> {
    orm: &'a Orm,
    sql: String,
    vars: Vec<Value>,
}

impl<'a> RawQuery<'a> {
    pub(crate) fn new(orm: &'a Orm, sql: String, vars: Vec<Value>) -> Self {
        Self { orm, sql, vars }
    }

    /// Decodes the first row, or fails with [`DatabaseError::RecordNotFound`].
    pub async fn scan<T: DeserializeOwned>(self) -> Result<T, DatabaseError> {
        let row = self
            .orm
            .query_rows(&self.sql, self.vars)
            .await?
            .into_iter()
            .next()
            .ok_or(DatabaseError::RecordNotFound)?;
        decode_row(row)
    }

    pub async fn scan_all<T: DeserializeOwned>(self) -> Result<Vec<T>, DatabaseError> {
        self.orm
            .query_rows(&self.sql, self.vars)
            .await?
            .into_iter()
            .map(decode_row)
            .collect()
    }
}

/// Structured operations against one table. Conditions are ANDed.
pub struct TableQuery<'a> {
    orm: &'a Orm,
    table: String,
    conditions: Vec<String>,
    vars: Vec<Value>,
    limit: Option<u64>,
}

impl<'a> TableQuery<'a> {
    pub(crate) fn new(orm: &'a Orm, table: String) -> Self {
        Self {
            orm,
            table,
            conditions: Vec::new(),
            vars: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, condition: impl Into<String>, vars: Vec<Value>) -> Self {
        self.conditions.push(condition.into());
        self.vars.extend(vars);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub async fn create<T: Serialize>(self, model: &T) -> Result<u64, DatabaseError> {
        let table = self.quoted_table()?;
        let dialect = self.orm.dialect();

        let columns = model_columns(model)?;
        let mut names = Vec::with_capacity(columns.len());
        let mut binds = Vec::with_capacity(columns.len());
        let mut vars = Vec::with_capacity(columns.len());
        for (idx, (column, value)) in columns.into_iter().enumerate() {
            validate_identifier(&column)?;
            names.push(dialect.quote(&column));
            binds.push(dialect.bind_var(idx + 1));
            vars.push(value);
        }

        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            names.join(","),
            binds.join(",")
        );
        self.orm.exec(&sql, vars).await
    }

    pub async fn find<T: DeserializeOwned>(self) -> Result<Vec<T>, DatabaseError> {
        let sql = self.select_sql("*")?;
        self.orm.raw(sql, self.vars).scan_all().await
    }

    /// The first matching row, or [`DatabaseError::RecordNotFound`].
    pub async fn first<T: DeserializeOwned>(self) -> Result<T, DatabaseError> {
        self.limit(1).find().await?.into_iter().next().ok_or(DatabaseError::RecordNotFound)
    }

    pub async fn count(self) -> Result<i64, DatabaseError> {
        let sql = self.select_sql("count(*)")?;
        self.orm.raw(sql, self.vars).scan().await
    }

    pub async fn delete(self) -> Result<u64, DatabaseError> {
        if self.conditions.is_empty() {
            return Err(DatabaseError::MissingWhereClause("DELETE"));
        }
        let sql = format!("DELETE FROM {}{}", self.quoted_table()?, self.where_clause());
        self.orm.exec(&sql, self.vars).await
    }

    fn quoted_table(&self) -> Result<String, DatabaseError> {
        validate_identifier(&self.table)?;
        Ok(self.orm.dialect().quote(&self.table))
    }

    fn select_sql(&self, projection: &str) -> Result<String, DatabaseError> {
        let mut sql = format!(
            "SELECT {projection} FROM {}{}",
            self.quoted_table()?,
            self.where_clause()
        );
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        Ok(sql)
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        let joined = self
            .conditions
            .iter()
            .map(|condition| format!("({condition})"))
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(" WHERE {joined}")
    }
}
