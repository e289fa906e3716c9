//! Common test utilities and fixtures for endb-sql

#![allow(dead_code)]

use async_trait::async_trait;
use endb_sql::{AdapterConfig, Connector, QueryExecutor, Result, StorageError, StoredEntry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Install a test subscriber once; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test fixture holding a temporary SQLite database
#[cfg(feature = "sqlite")]
pub struct SqliteFixture {
    _temp_dir: tempfile::TempDir,
    pub url: String,
    pub adapter: endb_sql::SqlAdapter,
}

#[cfg(feature = "sqlite")]
impl SqliteFixture {
    /// Fresh database with the default table
    pub fn new() -> Self {
        Self::with_config(AdapterConfig::new(endb_sql::Dialect::Sqlite))
    }

    /// Fresh database with a custom configuration
    pub fn with_config(config: AdapterConfig) -> Self {
        init_tracing();
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let url = format!("sqlite://{}?mode=rwc", temp_dir.path().join("test.db").display());
        let adapter = Self::open(&url, config);
        Self {
            _temp_dir: temp_dir,
            url,
            adapter,
        }
    }

    /// Another adapter on the same database file
    pub fn open(url: &str, config: AdapterConfig) -> endb_sql::SqlAdapter {
        let connector = endb_sql::backends::SqlxConnector::new(url).with_max_connections(1);
        endb_sql::SqlAdapter::new(config, connector).expect("Failed to create adapter")
    }
}

/// Connector that always fails and counts its invocations
#[derive(Default)]
pub struct FailingConnector {
    pub calls: AtomicUsize,
}

impl FailingConnector {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FailingConnector {
    async fn connect(&self) -> Result<Arc<dyn QueryExecutor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Err(StorageError::connect("connection refused"))
    }
}

/// Executor that records every statement and fails the ones starting with `fail_on`
#[derive(Default)]
pub struct RecordingExecutor {
    pub statements: Mutex<Vec<String>>,
    pub fail_on: Option<&'static str>,
}

impl RecordingExecutor {
    pub fn failing_on(prefix: &'static str) -> Self {
        Self {
            fail_on: Some(prefix),
            ..Default::default()
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn query(&self, sql: &str) -> Result<Vec<StoredEntry>> {
        self.statements.lock().unwrap().push(sql.to_string());
        match self.fail_on {
            Some(prefix) if sql.starts_with(prefix) => Err(StorageError::query("syntax error")),
            _ => Ok(Vec::new()),
        }
    }
}

/// Connector handing out one shared executor
pub struct StaticConnector {
    pub executor: Arc<RecordingExecutor>,
    pub calls: AtomicUsize,
}

impl StaticConnector {
    pub fn new(executor: RecordingExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Connector for StaticConnector {
    async fn connect(&self) -> Result<Arc<dyn QueryExecutor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.executor.clone())
    }
}
