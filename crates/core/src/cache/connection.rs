//! Connection pooling with pragma configuration.
//!
//! This module opens SQLite connections, applies the pragmas every
//! connection needs (WAL mode, busy timeout), and hands them out through a
//! deadpool pool. A checked-out connection goes back to the pool when its
//! [`PooledConnection`] is dropped, and is health-checked before reuse.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use deadpool::managed::{self, Metrics, PoolError, RecycleError, RecycleResult};
use deadpool::Runtime;
use tokio_rusqlite::Connection;

use crate::Error;
use crate::config::IN_MEMORY;

/// Settings for a [`ConnectionPool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Database path, or `:memory:`.
    pub target: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub busy_timeout: Duration,
}

/// Opens and health-checks SQLite connections for the pool.
#[derive(Debug)]
pub struct SqliteManager {
    config: PoolConfig,
    /// Set once the single in-memory database has been opened.
    opened_in_memory: AtomicBool,
}

impl SqliteManager {
    fn new(config: PoolConfig) -> Self {
        Self { config, opened_in_memory: AtomicBool::new(false) }
    }
}

impl managed::Manager for SqliteManager {
    type Type = Connection;
    type Error = Error;

    async fn create(&self) -> Result<Connection, Error> {
        if self.config.target == IN_MEMORY && self.opened_in_memory.swap(true, Ordering::SeqCst) {
            // A second in-memory connection would be a different, empty database.
            return Err(Error::Backend("in-memory fact cache connection was lost".into()));
        }

        tracing::debug!(db = %self.config.target, "opening pooled connection");
        open_connection(&self.config).await
    }

    async fn recycle(&self, conn: &mut Connection, _metrics: &Metrics) -> RecycleResult<Error> {
        let alive = conn
            .call(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await;
        match alive {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(db = %self.config.target, error = %e, "discarding broken pooled connection");
                Err(RecycleError::Backend(Error::Database(e)))
            }
        }
    }
}

/// A connection checked out of a [`ConnectionPool`].
///
/// Dereferences to the underlying `tokio_rusqlite::Connection`, which runs
/// every statement in autocommit mode.
pub type PooledConnection = managed::Object<SqliteManager>;

/// Bounded pool of SQLite connections.
///
/// Cloning is cheap; clones share the same connections and limits.
#[derive(Clone, Debug)]
pub struct ConnectionPool {
    pool: managed::Pool<SqliteManager>,
    config: PoolConfig,
}

impl ConnectionPool {
    /// Open the pool, eagerly connecting `min_connections` connections.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` with an example configuration if the
    /// database cannot be opened.
    pub async fn connect(config: PoolConfig) -> Result<Self, Error> {
        let pool = managed::Pool::builder(SqliteManager::new(config.clone()))
            .max_size(config.max_connections as usize)
            .wait_timeout(Some(config.acquire_timeout))
            .create_timeout(Some(config.acquire_timeout))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| Error::Configuration(format!("invalid connection pool settings: {e}")))?;
        let pool = Self { pool, config };

        let mut warm = Vec::with_capacity(pool.config.min_connections as usize);
        for _ in 0..pool.config.min_connections {
            let conn = pool.acquire().await.map_err(|e| {
                tracing::warn!(db = %pool.config.target, error = %e, "unable to open fact cache database");
                Error::Configuration(format!(
                    "Unable to open the fact cache database at {:?}: {e}. \
                     Set a writable path, e.g. FACT_CACHE_CONNECTION=/var/cache/ansible/facts.sqlite",
                    pool.config.target
                ))
            })?;
            warm.push(conn);
        }
        drop(warm);

        tracing::info!(
            db = %pool.config.target,
            min = pool.config.min_connections,
            max = pool.config.max_connections,
            "fact cache connection pool established"
        );
        Ok(pool)
    }

    /// Check out a connection, opening a new one if none is idle.
    ///
    /// Waits at most `acquire_timeout` for a free slot.
    pub async fn acquire(&self) -> Result<PooledConnection, Error> {
        self.pool.get().await.map_err(|e| match e {
            PoolError::Backend(e) => e,
            PoolError::Timeout(_) => Error::Backend(format!(
                "timed out after {}ms waiting for a connection",
                self.config.acquire_timeout.as_millis()
            )),
            PoolError::Closed => Error::Backend("connection pool is closed".into()),
            other => Error::Backend(other.to_string()),
        })
    }

    /// Connections currently parked in the pool.
    pub fn idle_connections(&self) -> usize {
        self.pool.status().available
    }

    /// Free checkout slots.
    pub fn available(&self) -> usize {
        let status = self.pool.status();
        status.max_size - (status.size - status.available)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

async fn open_connection(config: &PoolConfig) -> Result<Connection, Error> {
    let conn = if config.target == IN_MEMORY {
        Connection::open_in_memory().await
    } else {
        Connection::open(&config.target).await
    }
    .map_err(|e| Error::Database(e.into()))?;

    let busy_timeout = config.busy_timeout;
    conn.call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;",
        )?;
        Ok(())
    })
    .await
    .map_err(Error::Database)?;

    Ok(conn)
}
