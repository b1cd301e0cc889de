//! Core types for the fact cache.
//!
//! This crate provides:
//! - Host-keyed fact cache with a SQLite backend
//! - Unified error types
//! - Configuration structures
//! - Injectable clock for expiry

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;

pub use cache::{CacheEntry, FactCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use error::Error;
