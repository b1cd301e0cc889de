//! Backing table checks.
//!
//! The cache does not migrate schemas. It verifies the table is present and,
//! only when asked to, creates it with [`create_table_sql`].

use tokio_rusqlite::params;

use super::connection::PooledConnection;
use crate::Error;

/// DDL for the backing table.
pub fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (
    host VARCHAR PRIMARY KEY,
    changed TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    timeout BIGINT NOT NULL DEFAULT 0,
    facts TEXT NOT NULL
);"
    )
}

pub(crate) async fn table_exists(conn: &PooledConnection, table: &str) -> Result<bool, Error> {
    let table = table.to_string();
    conn.call(move |conn| -> Result<bool, Error> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
            params![table],
            |row| row.get(0),
        )?;
        Ok(exists)
    })
    .await
    .map_err(Error::from)
}

/// Make sure `table` exists, creating it when `create` is set.
///
/// # Errors
///
/// Returns `Error::Configuration` carrying the DDL when the table is missing
/// and `create` is false.
pub(crate) async fn ensure_table(conn: &PooledConnection, table: &str, create: bool) -> Result<(), Error> {
    if table_exists(conn, table).await? {
        return Ok(());
    }

    if !create {
        return Err(Error::Configuration(format!(
            "Table \"{table}\" does not exist. Create it with:\n{}\nor set FACT_CACHE_CREATE_TABLE=true",
            create_table_sql(table)
        )));
    }

    tracing::info!(table, "creating fact cache table");
    let ddl = create_table_sql(table);
    conn.call(move |conn| -> Result<(), Error> {
        conn.execute_batch(&ddl)?;
        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ConnectionPool, PoolConfig};
    use std::time::Duration;

    async fn memory_pool() -> ConnectionPool {
        ConnectionPool::connect(PoolConfig {
            target: crate::config::IN_MEMORY.into(),
            min_connections: 1,
            max_connections: 1,
            acquire_timeout: Duration::from_millis(500),
            busy_timeout: Duration::from_millis(500),
        })
        .await
        .unwrap()
    }

    #[test]
    fn test_create_table_sql_quotes_name() {
        let ddl = create_table_sql("ansible_fact_cache");
        assert!(ddl.contains("\"ansible_fact_cache\""));
        assert!(ddl.contains("host VARCHAR PRIMARY KEY"));
        assert!(ddl.contains("timeout BIGINT NOT NULL DEFAULT 0"));
    }

    #[tokio::test]
    async fn test_missing_table_reports_ddl() {
        let pool = memory_pool().await;
        let conn = pool.acquire().await.unwrap();

        let err = ensure_table(&conn, "ansible_fact_cache", false).await.unwrap_err();
        match err {
            Error::Configuration(msg) => {
                assert!(msg.contains("does not exist"));
                assert!(msg.contains("CREATE TABLE"));
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ensure_table_creates_idempotently() {
        let pool = memory_pool().await;
        let conn = pool.acquire().await.unwrap();

        ensure_table(&conn, "facts", true).await.unwrap();
        ensure_table(&conn, "facts", true).await.unwrap();
        ensure_table(&conn, "facts", false).await.unwrap();

        assert!(table_exists(&conn, "facts").await.unwrap());
        assert!(!table_exists(&conn, "other").await.unwrap());
    }
}
