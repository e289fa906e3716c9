//! Contracts between the adapter, its collaborators and the layer above it

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// One row of the backing table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Primary key, conventionally `"<namespace>:<local key>"`
    pub key: String,
    /// Opaque serialized payload
    pub value: String,
}

impl StoredEntry {
    /// Create a new entry
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Executes one SQL statement and returns the rows it produced.
///
/// Statements that produce no rows return an empty vector.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run `sql` against the backend
    async fn query(&self, sql: &str) -> Result<Vec<StoredEntry>>;
}

/// Produces the executor the adapter will use for its whole lifetime.
///
/// The adapter invokes [`Connector::connect`] at most once.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a connection and hand back its executor
    async fn connect(&self) -> Result<Arc<dyn QueryExecutor>>;
}

/// Adapts an async closure into a [`Connector`]
pub struct FnConnector<F> {
    connect: F,
}

impl<F> FnConnector<F> {
    /// Wrap `connect`
    pub fn new(connect: F) -> Self {
        Self { connect }
    }
}

impl<F> fmt::Debug for FnConnector<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConnector").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Connector for FnConnector<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Arc<dyn QueryExecutor>>> + Send,
{
    async fn connect(&self) -> Result<Arc<dyn QueryExecutor>> {
        (self.connect)().await
    }
}

#[async_trait]
impl<T: Connector + ?Sized> Connector for Arc<T> {
    async fn connect(&self) -> Result<Arc<dyn QueryExecutor>> {
        (**self).connect().await
    }
}

/// Key/value contract consumed by the caching layer above the adapter
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a value by exact key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Check whether a key exists
    async fn has(&self, key: &str) -> Result<bool>;

    /// Insert or overwrite a value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key, reporting whether a row was actually removed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every entry in this store's namespace
    async fn clear(&self) -> Result<()>;

    /// List every entry in this store's namespace
    async fn all(&self) -> Result<Vec<StoredEntry>>;
}

impl From<StoredEntry> for (String, String) {
    fn from(entry: StoredEntry) -> Self {
        (entry.key, entry.value)
    }
}

