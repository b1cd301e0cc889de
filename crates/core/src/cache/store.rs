//! Fact cache operations.
//!
//! Every operation checks a connection out of the pool, runs exactly one SQL
//! statement in autocommit mode, and returns the connection. There is no
//! client-side locking; concurrent writers to one host are serialized by the
//! single-statement upsert in [`FactCache::set`].
//!
//! Expired rows are only removed by the sweep that runs when the cache is
//! opened (or by an explicit [`FactCache::sweep_expired`]). Rows that expire
//! while the cache is open stay readable until then.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio_rusqlite::{params, rusqlite};

use super::connection::ConnectionPool;
use super::entry::CacheEntry;
use super::schema;
use crate::Error;
use crate::clock::{Clock, SystemClock, format_timestamp, parse_timestamp};
use crate::config::{AppConfig, is_valid_table_name};

/// SQL for one table, built once when the cache opens.
#[derive(Debug)]
struct Statements {
    get: String,
    contains: String,
    entry: String,
    upsert: String,
    delete: String,
    keys: String,
    flush: String,
    copy: String,
    sweep: String,
}

impl Statements {
    fn for_table(table: &str) -> Self {
        let t = format!("\"{table}\"");
        Self {
            get: format!("SELECT facts FROM {t} WHERE host = ?1"),
            contains: format!("SELECT EXISTS(SELECT 1 FROM {t} WHERE host = ?1)"),
            entry: format!("SELECT host, changed, timeout, facts FROM {t} WHERE host = ?1"),
            upsert: format!(
                "INSERT INTO {t} (host, changed, timeout, facts) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(host) DO UPDATE SET
                    facts = excluded.facts,
                    changed = excluded.changed,
                    timeout = excluded.timeout"
            ),
            delete: format!("DELETE FROM {t} WHERE host = ?1"),
            keys: format!("SELECT host FROM {t} ORDER BY host"),
            flush: format!("DELETE FROM {t}"),
            copy: format!("SELECT host, facts FROM {t} ORDER BY host"),
            sweep: format!(
                "DELETE FROM {t}
                WHERE timeout != 0
                AND datetime(changed, '+' || timeout || ' seconds') < datetime(?1)"
            ),
        }
    }
}

/// Host-keyed fact cache backed by a SQLite table.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Clone, Debug)]
pub struct FactCache {
    pool: ConnectionPool,
    table: Arc<str>,
    timeout: u32,
    clock: Arc<dyn Clock>,
    sql: Arc<Statements>,
}

/// Decode facts read back from the table.
///
/// Undecodable stored text is a backend fault, not a caller encoding error.
fn decode_facts(host: &str, raw: &str) -> Result<Value, Error> {
    serde_json::from_str(raw).map_err(|e| Error::Backend(format!("stored facts for host {host} are not valid JSON: {e}")))
}

impl FactCache {
    /// Open the cache described by `config` using the wall clock.
    pub async fn open(config: &AppConfig) -> Result<Self, Error> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    /// Open a private in-memory cache, creating its table.
    pub async fn open_in_memory() -> Result<Self, Error> {
        Self::open(&AppConfig::in_memory()).await
    }

    /// Open the cache with an explicit time source.
    ///
    /// # Errors
    ///
    /// - `Error::Configuration` if the configuration is invalid, the database
    ///   cannot be opened, or the table is missing and `create_table` is off
    /// - `Error::Database` if the startup expiry sweep fails
    pub async fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        config.validate()?;
        let pool = ConnectionPool::connect(config.pool()).await?;
        Self::with_pool(pool, config, clock).await
    }

    /// Open the cache over an existing pool.
    ///
    /// Verifies the table and runs the expiry sweep, like [`FactCache::with_clock`].
    /// The pool settings in `config` are not used, so only the table name is
    /// checked here; it is quoted into every statement.
    pub async fn with_pool(pool: ConnectionPool, config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        if !is_valid_table_name(&config.table) {
            return Err(Error::Configuration(format!("invalid table name {:?}", config.table)));
        }

        {
            let conn = pool.acquire().await?;
            schema::ensure_table(&conn, &config.table, config.create_table).await?;
        }

        let cache = Self {
            pool,
            table: Arc::from(config.table.as_str()),
            timeout: config.timeout,
            clock,
            sql: Arc::new(Statements::for_table(&config.table)),
        };

        let removed = cache.sweep_expired().await.inspect_err(|e| {
            tracing::error!(table = %cache.table, error = %e, "unable to delete expired facts");
        })?;

        tracing::info!(table = %cache.table, removed, default_timeout = cache.timeout, "fact cache ready");
        Ok(cache)
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Timeout applied by [`FactCache::set`], in seconds.
    pub fn default_timeout(&self) -> u32 {
        self.timeout
    }

    /// Facts stored for `host`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no row exists or the stored facts are
    /// JSON `null`; the two cases are indistinguishable to callers.
    pub async fn get(&self, host: &str) -> Result<Value, Error> {
        let conn = self.pool.acquire().await?;
        let sql = Arc::clone(&self.sql);
        let key = host.to_string();
        let stored = conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare_cached(&sql.get)?;
                match stmt.query_row(params![key], |row| row.get::<_, Option<String>>(0)) {
                    Ok(facts) => Ok(facts),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await?;
        drop(conn);

        let facts = match stored {
            Some(raw) => decode_facts(host, &raw)?,
            None => Value::Null,
        };

        if facts.is_null() {
            tracing::debug!(host, "fact cache miss");
            return Err(Error::NotFound(host.to_string()));
        }

        tracing::debug!(host, "fact cache hit");
        Ok(facts)
    }

    /// [`FactCache::get`], decoded into `T`.
    ///
    /// Facts that do not fit `T` are an `Error::Serialization`.
    pub async fn get_as<T: DeserializeOwned>(&self, host: &str) -> Result<T, Error> {
        let facts = self.get(host).await?;
        Ok(serde_json::from_value(facts)?)
    }

    /// Store `facts` for `host` with the default timeout.
    ///
    /// Replaces any existing facts wholesale and refreshes `changed`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if `facts` cannot be encoded as JSON.
    pub async fn set<T: Serialize + ?Sized>(&self, host: &str, facts: &T) -> Result<(), Error> {
        self.set_with_timeout(host, facts, self.timeout).await
    }

    /// Store `facts` for `host`, expiring `timeout` seconds from now (0 = never).
    pub async fn set_with_timeout<T: Serialize + ?Sized>(&self, host: &str, facts: &T, timeout: u32) -> Result<(), Error> {
        let facts = serde_json::to_string(facts)?;
        let changed = format_timestamp(self.clock.now());

        let conn = self.pool.acquire().await?;
        let sql = Arc::clone(&self.sql);
        let key = host.to_string();
        conn.call(move |conn| -> Result<(), Error> {
            conn.prepare_cached(&sql.upsert)?
                .execute(params![key, changed, i64::from(timeout), facts])?;
            Ok(())
        })
        .await?;

        tracing::debug!(host, timeout, "facts stored");
        Ok(())
    }

    /// Whether a row exists for `host`, expired or not.
    pub async fn contains(&self, host: &str) -> Result<bool, Error> {
        let conn = self.pool.acquire().await?;
        let sql = Arc::clone(&self.sql);
        let key = host.to_string();
        let exists = conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn
                    .prepare_cached(&sql.contains)?
                    .query_row(params![key], |row| row.get(0))?;
                Ok(exists)
            })
            .await?;
        Ok(exists)
    }

    /// Remove the row for `host`.
    ///
    /// Returns true iff a row was removed.
    pub async fn delete(&self, host: &str) -> Result<bool, Error> {
        let conn = self.pool.acquire().await?;
        let sql = Arc::clone(&self.sql);
        let key = host.to_string();
        let count = conn
            .call(move |conn| -> Result<usize, Error> {
                let count = conn.prepare_cached(&sql.delete)?.execute(params![key])?;
                Ok(count)
            })
            .await?;
        let removed = count > 0;

        tracing::debug!(host, removed, "facts deleted");
        Ok(removed)
    }

    /// Every stored host, in ascending order.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let conn = self.pool.acquire().await?;
        let sql = Arc::clone(&self.sql);
        let hosts = conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare_cached(&sql.keys)?;
                let hosts = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(hosts)
            })
            .await?;
        Ok(hosts)
    }

    /// Remove every row.
    ///
    /// Returns the number of rows removed.
    pub async fn flush(&self) -> Result<u64, Error> {
        let conn = self.pool.acquire().await?;
        let sql = Arc::clone(&self.sql);
        let removed = conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(&sql.flush, [])?;
                Ok(count as u64)
            })
            .await?;

        tracing::info!(table = %self.table, removed, "fact cache flushed");
        Ok(removed)
    }

    /// Snapshot of every stored host and its facts, read in one statement.
    pub async fn copy(&self) -> Result<BTreeMap<String, Value>, Error> {
        let conn = self.pool.acquire().await?;
        let sql = Arc::clone(&self.sql);
        let rows = conn
            .call(move |conn| -> Result<Vec<(String, String)>, Error> {
                let mut stmt = conn.prepare_cached(&sql.copy)?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        drop(conn);

        rows.into_iter()
            .map(|(host, raw)| -> Result<(String, Value), Error> {
                let facts = decode_facts(&host, &raw)?;
                Ok((host, facts))
            })
            .collect()
    }

    /// The full row for `host`, including its timestamp and timeout.
    pub async fn entry(&self, host: &str) -> Result<Option<CacheEntry>, Error> {
        let conn = self.pool.acquire().await?;
        let sql = Arc::clone(&self.sql);
        let key = host.to_string();
        let row = conn
            .call(move |conn| -> Result<Option<(String, String, i64, String)>, Error> {
                let mut stmt = conn.prepare_cached(&sql.entry)?;
                match stmt.query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await?;
        drop(conn);

        let Some((host, changed, timeout, facts)) = row else {
            return Ok(None);
        };
        let changed = parse_timestamp(&changed)
            .ok_or_else(|| Error::Backend(format!("invalid changed timestamp {changed:?} for host {host}")))?;
        let facts = decode_facts(&host, &facts)?;

        Ok(Some(CacheEntry { host, changed, timeout, facts }))
    }

    /// Delete every row whose timeout has elapsed according to the clock.
    ///
    /// Runs automatically when the cache opens. Returns the number of rows removed.
    pub async fn sweep_expired(&self) -> Result<u64, Error> {
        let now = format_timestamp(self.clock.now());
        let conn = self.pool.acquire().await?;
        let sql = Arc::clone(&self.sql);
        let removed = conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(&sql.sweep, params![now])?;
                Ok(count as u64)
            })
            .await?;

        if removed > 0 {
            tracing::info!(table = %self.table, removed, "expired facts removed");
        }
        Ok(removed)
    }
}
