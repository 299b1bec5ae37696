//! Basic statements through each connection mode. libsql is expected to keep
//! sqlite semantics; a failure here that only shows up on libsql is a driver
//! issue rather than an adapter one.

mod common;

use anyhow::Result;
use libsql::Value;
use libsql_dialect::{Connector, DialectConfig, LibsqlDialect, Orm, OrmConfig};

use common::{Model, db_path, db_url, file_dsn, setup, teardown, unique_id, unique_table};

async fn select_one(orm: &Orm) -> Result<()> {
    let num: i64 = orm.raw("SELECT 1", vec![]).scan().await?;
    assert_eq!(num, 1, "expected 1, got {num}");
    Ok(())
}

async fn create_table(orm: &Orm, table: &str) -> Result<()> {
    orm.exec(
        &format!("CREATE TABLE {table} (id INTEGER PRIMARY KEY, name TEXT)"),
        vec![],
    )
    .await?;
    Ok(())
}

async fn insert_then_raw_select(orm: &Orm, table: &str) -> Result<()> {
    let m1 = Model {
        id: unique_id(),
        name: "m1".to_string(),
    };
    orm.table(table).create(&m1).await?;

    let m1_ck: Model = orm
        .raw(
            format!("SELECT * FROM {table} WHERE id = ?"),
            vec![Value::Integer(m1.id)],
        )
        .scan()
        .await?;
    assert_eq!(m1_ck, m1);
    Ok(())
}

async fn raw_insert_then_find(orm: &Orm, table: &str) -> Result<()> {
    // offset so it cannot collide with the row inserted in the same millisecond
    let m2 = Model {
        id: unique_id() + 1,
        name: "m2".to_string(),
    };
    orm.exec(
        &format!("INSERT INTO {table} (id, name) VALUES (?, ?)"),
        vec![Value::Integer(m2.id), Value::Text(m2.name.clone())],
    )
    .await?;

    let found: Vec<Model> = orm
        .table(table)
        .filter("id = ?", vec![Value::Integer(m2.id)])
        .find()
        .await?;
    assert_eq!(found, vec![m2]);
    Ok(())
}

async fn run_sanity(orm: &Orm) -> Result<()> {
    select_one(orm).await?;

    let table = unique_table();
    create_table(orm, &table).await?;
    let outcome = async {
        insert_then_raw_select(orm, &table).await?;
        raw_insert_then_find(orm, &table).await
    }
    .await;
    orm.migrator().drop_table(&table).await?;
    outcome
}

#[tokio::test]
async fn sanity_local() -> Result<()> {
    let dir = setup();
    {
        let dialect = LibsqlDialect::open(&file_dsn(dir.path(), "sanity_local.db"))?;
        let orm = Orm::open(dialect, OrmConfig::default()).await?;
        run_sanity(&orm).await?;
    }
    teardown(dir);
    Ok(())
}

#[tokio::test]
async fn sanity_memory() -> Result<()> {
    let orm = Orm::open(LibsqlDialect::open(":memory:")?, OrmConfig::default()).await?;
    run_sanity(&orm).await
}

#[tokio::test]
#[ignore = "requires a libsql server at DATABASE_URL"]
async fn sanity_remote() -> Result<()> {
    let orm = Orm::open(LibsqlDialect::open(&db_url())?, OrmConfig::default()).await?;
    run_sanity(&orm).await
}

#[tokio::test]
#[ignore = "requires a libsql server at DATABASE_URL"]
async fn sanity_embedded_replica() -> Result<()> {
    let dir = setup();
    {
        let connector =
            Connector::embedded_replica(db_path(dir.path(), "embedded_replica.db"), db_url(), None)
                .await?;
        let config = DialectConfig::with_connection(connector.connect()?).dsn(db_url());
        let orm = Orm::open(LibsqlDialect::new(config)?, OrmConfig::default()).await?;
        run_sanity(&orm).await?;
    }
    teardown(dir);
    Ok(())
}
