//! Lazy, exactly-once connection bootstrap
//!
//! The bootstrap (connect, then create the table if absent) is one shared
//! future built at construction. It first runs when an operation or
//! [`ConnectionManager::ready`] awaits it, and every concurrent caller awaits
//! the same in-flight future. Once settled, the outcome never changes.

use crate::error::{BackendError, Result, StorageError};
use crate::observable::{AdapterEvent, ErrorSignal, EventRecord};
use crate::traits::{Connector, QueryExecutor, StoredEntry};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

/// Observable health of an adapter's connection
#[derive(Debug, Clone)]
pub enum ConnectionState {
    /// Bootstrap has not settled yet (it may not have started)
    Connecting,
    /// The executor is available and the table exists
    Ready,
    /// Bootstrap failed; every operation returns its empty default
    Failed(Arc<StorageError>),
}

impl ConnectionState {
    /// Whether the connection is usable
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }

    /// Whether bootstrap failed
    pub fn is_failed(&self) -> bool {
        matches!(self, ConnectionState::Failed(_))
    }

    /// The bootstrap error, if any
    pub fn error(&self) -> Option<&Arc<StorageError>> {
        match self {
            ConnectionState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Clone)]
enum Settled {
    Ready(Arc<dyn QueryExecutor>),
    Failed(Arc<StorageError>),
}

/// Owns the single connection handle of one adapter
pub struct ConnectionManager {
    bootstrap: Shared<BoxFuture<'static, Settled>>,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionManager {
    /// Prepare the bootstrap without running it.
    ///
    /// `create_table` is the idempotent create statement issued right after
    /// the connector succeeds. The outcome is published on `signal`.
    pub fn new(connector: Arc<dyn Connector>, create_table: String, signal: ErrorSignal) -> Self {
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);

        let bootstrap = async move {
            let (settled, event) = match bootstrap(connector.as_ref(), &create_table).await {
                Ok(executor) => {
                    info!("SQL adapter connected");
                    state_tx.send_replace(ConnectionState::Ready);
                    (Settled::Ready(executor), AdapterEvent::Connected)
                }
                Err(err) => {
                    let err = Arc::new(err);
                    error!(error = %err, "SQL adapter bootstrap failed, operations will return empty results");
                    state_tx.send_replace(ConnectionState::Failed(err.clone()));
                    (Settled::Failed(err.clone()), AdapterEvent::Failed(err))
                }
            };
            debug!(record = ?EventRecord::from(&event), "publishing adapter event");
            signal.emit(event);
            settled
        }
        .boxed()
        .shared();

        Self { bootstrap, state }
    }

    /// Current state, without driving the bootstrap
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Drive the bootstrap to completion and report its outcome
    pub async fn ready(&self) -> std::result::Result<(), Arc<StorageError>> {
        match self.bootstrap.clone().await {
            Settled::Ready(_) => Ok(()),
            Settled::Failed(err) => Err(err),
        }
    }

    /// Run one statement.
    ///
    /// Returns `Ok(None)` when bootstrap failed; per-query failures after a
    /// successful bootstrap are returned as errors.
    pub async fn execute(&self, sql: &str) -> Result<Option<Vec<StoredEntry>>> {
        match self.bootstrap.clone().await {
            Settled::Ready(executor) => {
                debug!(sql, "executing statement");
                executor.query(sql).await.map(Some)
            }
            Settled::Failed(_) => Ok(None),
        }
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[instrument(skip_all)]
async fn bootstrap(connector: &dyn Connector, create_table: &str) -> Result<Arc<dyn QueryExecutor>> {
    let executor = connector.connect().await.map_err(|err| {
        if err.is_bootstrap() {
            err
        } else {
            StorageError::connect(err.to_string())
        }
    })?;
    debug!(sql = create_table, "ensuring table exists");
    executor
        .query(create_table)
        .await
        .map_err(|err| BackendError::CreateTable(err.to_string()))?;
    Ok(executor)
}
