#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use libsql_dialect::config::Config;
use libsql_dialect::{Connector, DialectConfig, Dsn, LibsqlDialect, Orm, OrmConfig, logging};
use tracing::info;

/// Opens a libsql database through the dialect adapter and checks it answers.
#[derive(Debug, Parser)]
#[command(name = "libsql-probe", version, about)]
struct Cli {
    /// YAML settings file.
    #[arg(long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Connection string; overrides `database.url`.
    #[arg(long)]
    dsn: Option<String>,

    /// Open an embedded replica at this path instead of connecting directly.
    #[arg(long)]
    replica: Option<PathBuf>,

    /// Pull remote changes into the replica after the probe query.
    #[arg(long, requires = "replica")]
    sync: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(dsn) = cli.dsn {
        config.database.url = Some(dsn);
    }
    if let Some(replica) = cli.replica {
        config.database.replica_path = Some(replica.display().to_string());
    }
    config.validate()?;
    logging::init_tracing(&config.logging);

    let target = config.database.target()?;
    let dsn = target.to_string();
    let orm_config = OrmConfig::from(&config.orm);

    let (orm, connector) = match (target, config.database.replica_path.as_deref()) {
        (Dsn::Remote { url, auth_token }, Some(path)) => {
            let connector = Connector::embedded_replica(path, url.as_str(), auth_token.as_ref())
                .await
                .with_context(|| format!("opening embedded replica at {path}"))?;
            if config.database.sync_on_open {
                connector.sync().await.context("initial replica sync")?;
            }
            let dialect = LibsqlDialect::new(
                DialectConfig::with_connection(connector.connect()?).dsn(dsn.clone()),
            )?;
            (Orm::open(dialect, orm_config).await?, Some(connector))
        }
        (Dsn::Remote { url, auth_token }, None) => {
            let connector = Connector::remote(url.as_str(), auth_token.as_ref())
                .await
                .with_context(|| format!("opening remote database at {dsn}"))?;
            let dialect = LibsqlDialect::new(
                DialectConfig::with_connection(connector.connect()?).dsn(dsn.clone()),
            )?;
            (Orm::open(dialect, orm_config).await?, Some(connector))
        }
        (_, Some(_)) => {
            anyhow::bail!("an embedded replica needs a remote database url, got {dsn}")
        }
        (_, None) => {
            let dialect = LibsqlDialect::open(&dsn)?;
            (Orm::open(dialect, orm_config).await?, None)
        }
    };

    let one: i64 = orm
        .raw("SELECT 1", Vec::new())
        .scan()
        .await
        .with_context(|| format!("probing {dsn}"))?;
    info!("{} answered SELECT 1 = {}", dsn, one);

    if cli.sync {
        if let Some(connector) = connector {
            let report = connector.sync().await.context("syncing replica")?;
            info!(
                "replica synced {} frames (frame {:?})",
                report.frames_synced, report.frame_no
            );
        }
    }

    println!("ok");
    Ok(())
}
