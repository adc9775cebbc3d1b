//! Tickvault Storage Layer
//!
//! This crate persists OHLC bars and tick quotes in an embedded ordered
//! key-value store and keeps a per-partition overview (count, first and last
//! timestamp) next to the records.
//!
//! # Features
//!
//! - **Sortable keys**: `{interval}|{exchange}|{symbol}|{timestamp}` for bars,
//!   `{exchange}|{symbol}|{timestamp}` for ticks, so a time range is one scan
//! - **Versioned payloads**: a schema-version byte in front of every value
//! - **Exact overviews**: updated in the same atomic batch as the records
//! - **Multiple Backends**: redb (default) and in-memory stores
//!
//! # Example
//!
//! ```rust,no_run
//! use tickvault_storage::{create_database, DatabaseConfig};
//!
//! let config = DatabaseConfig::from_file("./tickvault.toml")?;
//! let db = create_database(&config)?;
//!
//! for overview in db.list_bar_overviews()? {
//!     println!("{} {}: {} bars", overview.vt_symbol(), overview.interval, overview.count);
//! }
//! # Ok::<(), tickvault_storage::StorageError>(())
//! ```
//!
//! # Storage Backends
//!
//! ## RedbStore (Default)
//!
//! Uses [redb](https://crates.io/crates/redb), a pure-Rust embedded database
//! with ACID transactions. Suitable for single-process applications.
//!
//! ## InMemoryStore
//!
//! A `BTreeMap` per namespace, for testing and development.
//! Data is not persisted across restarts.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod adapter;
pub mod backend;
pub mod codec;
mod config;
mod database;
mod error;
pub mod keys;
pub mod overview;
mod series;

// Re-export core types
pub use adapter::{BaseDatabase, DatabaseStats};
pub use backend::{InMemoryStore, KeyRange, Namespace, OrderedStore, RedbStore, WriteBatch};
pub use config::{BackendKind, DatabaseConfig};
pub use database::{create_database, KvDatabase};
pub use error::{StorageError, StorageResult};
pub use keys::{BarPartition, TickPartition};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::adapter::{BaseDatabase, DatabaseStats};
    pub use crate::config::DatabaseConfig;
    pub use crate::database::{create_database, KvDatabase};
    pub use crate::error::{StorageError, StorageResult};
    pub use tickvault_core::prelude::*;
}
