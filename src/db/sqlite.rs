use crate::db::schema::SQLITE_INIT;
use crate::error::StratusError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the pool and bootstrap the schema.
///
/// An in-memory database lives only as long as its connection, so it is pinned to a
/// single connection that is never recycled.
pub async fn connect(database_url: &str) -> Result<SqlitePool, StratusError> {
    let mut connect_opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    let mut pool_opts = SqlitePoolOptions::new();
    if database_url.contains(":memory:") {
        pool_opts = pool_opts
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    } else {
        connect_opts = connect_opts.journal_mode(SqliteJournalMode::Wal);
    }
    let pool = pool_opts.connect_with(connect_opts).await?;
    init_schema(&pool).await?;
    info!(database_url, "database ready");
    Ok(pool)
}

/// Initialize the schema by executing the bundled DDL.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), StratusError> {
    // sqlx::query runs a single statement at a time
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite pool")
}
