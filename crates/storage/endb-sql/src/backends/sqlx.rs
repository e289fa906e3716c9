//! Connector backed by an sqlx `Any` pool
//!
//! The driver is picked from the URL scheme (`sqlite:`, `postgres:`,
//! `mysql:`); only drivers enabled through crate features are available.

use crate::error::{Result, StorageError};
use crate::schema::{KEY_COLUMN, VALUE_COLUMN};
use crate::traits::{Connector, QueryExecutor, StoredEntry};
use async_trait::async_trait;
use sqlx::any::{install_default_drivers, AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use std::sync::Arc;
use tracing::info;

/// Default pool size
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Opens an sqlx pool on first use
#[derive(Debug, Clone)]
pub struct SqlxConnector {
    url: String,
    max_connections: u32,
}

impl SqlxConnector {
    /// Connector for a database URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Limit the pool size
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// Database URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for SqlxConnector {
    async fn connect(&self) -> Result<Arc<dyn QueryExecutor>> {
        install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.url)
            .await?;
        info!(max_connections = self.max_connections, "opened sqlx pool");
        Ok(Arc::new(SqlxExecutor::new(pool)))
    }
}

/// Runs raw SQL text on an sqlx pool
#[derive(Debug, Clone)]
pub struct SqlxExecutor {
    pool: AnyPool,
}

impl SqlxExecutor {
    /// Wrap an existing pool
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait]
impl QueryExecutor for SqlxExecutor {
    async fn query(&self, sql: &str) -> Result<Vec<StoredEntry>> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }
}

fn decode_row(row: &AnyRow) -> Result<StoredEntry> {
    let column = |name: &str| -> Result<String> {
        row.try_get(name)
            .map_err(|e| StorageError::MalformedRow(format!("column {name}: {e}")))
    };
    Ok(StoredEntry {
        key: column(KEY_COLUMN)?,
        value: column(VALUE_COLUMN)?,
    })
}
