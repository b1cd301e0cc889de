//! SQLite-backed fact cache.
//!
//! This module provides a host-keyed cache of JSON fact documents with
//! async access via tokio-rusqlite. It supports:
//!
//! - A bounded deadpool connection pool with health-checked reuse
//! - Single-statement upserts for concurrent writers
//! - Per-entry timeouts with a startup expiry sweep

pub mod connection;
pub mod entry;
pub mod schema;
pub mod store;

pub use crate::Error;

pub use connection::{ConnectionPool, PoolConfig, PooledConnection};
pub use entry::CacheEntry;
pub use schema::create_table_sql;
pub use store::FactCache;
