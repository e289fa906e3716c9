//! Endb SQL - relational storage adapter for the endb key-value layer
//!
//! This crate persists key/value entries in a two-column SQL table and
//! exposes them through the `get`/`has`/`set`/`delete`/`clear`/`all`
//! contract expected by the caching layer above it. Serialization, expiry
//! and namespacing policy stay in that layer; this crate only turns each
//! operation into dialect-correct SQL and runs it through an injected
//! connector.
//!
//! ```no_run
//! use endb_sql::prelude::*;
//! use endb_sql::backends::SqlxConnector;
//!
//! # async fn run() -> endb_sql::Result<()> {
//! let adapter = SqlAdapter::new(
//!     AdapterConfig::new(Dialect::Sqlite),
//!     SqlxConnector::new("sqlite://cache.db?mode=rwc"),
//! )?;
//! let users = adapter.namespace("users");
//!
//! users.set(&users.qualify("42"), r#"{"name":"Ada"}"#).await?;
//! assert!(users.has(&users.qualify("42")).await?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod backends;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod observable;
pub mod query;
pub mod schema;
pub mod stats;
pub mod traits;

// Re-export commonly used types
pub use adapter::{NamespacedStore, SqlAdapter};
pub use config::AdapterConfig;
pub use connection::ConnectionState;
pub use dialect::{Dialect, DialectStrategy};
pub use error::{BackendError, Result, StorageError};
pub use observable::AdapterEvent;
pub use stats::AdapterStats;
pub use traits::{Connector, FnConnector, KeyValueStore, QueryExecutor, StoredEntry};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        adapter::{NamespacedStore, SqlAdapter},
        config::AdapterConfig,
        connection::ConnectionState,
        dialect::Dialect,
        error::{Result, StorageError},
        observable::AdapterEvent,
        traits::{Connector, KeyValueStore, QueryExecutor, StoredEntry},
    };
}
