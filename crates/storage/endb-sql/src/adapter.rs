//! The SQL adapter and its namespace-scoped views

use crate::config::{AdapterConfig, Dialect};
use crate::connection::{ConnectionManager, ConnectionState};
use crate::dialect::DialectStrategy;
use crate::error::{Result, StorageError};
use crate::observable::{AdapterEvent, ErrorSignal};
use crate::query::QueryBuilder;
use crate::schema::TableDefinition;
use crate::stats::{AdapterStats, Operation, StatsCounters};
use crate::traits::{Connector, KeyValueStore, StoredEntry};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{instrument, warn};

/// Key/value storage persisted in a relational table.
///
/// Cloning is cheap; every clone and every [`NamespacedStore`] created from
/// it share one connection handle. Construction never connects: the
/// connector runs once, on the first operation or on [`SqlAdapter::ready`].
#[derive(Clone)]
pub struct SqlAdapter {
    inner: Arc<AdapterInner>,
}

struct AdapterInner {
    config: AdapterConfig,
    query: QueryBuilder,
    strategy: &'static dyn DialectStrategy,
    connection: ConnectionManager,
    signal: ErrorSignal,
    stats: StatsCounters,
}

impl SqlAdapter {
    /// Create an adapter.
    ///
    /// Fails only if `config` is invalid. Connector failures surface later
    /// through [`SqlAdapter::state`], [`SqlAdapter::subscribe`] and
    /// [`SqlAdapter::ready`], never as an error from an operation.
    pub fn new(config: AdapterConfig, connector: impl Connector + 'static) -> Result<Self> {
        config.validate()?;

        let table = TableDefinition::key_value(config.table.clone(), config.key_size);
        let query = QueryBuilder::new(config.dialect, table);
        let signal = ErrorSignal::new(config.event_capacity);
        let connection = ConnectionManager::new(
            Arc::new(connector),
            query.create_table_if_not_exists(),
            signal.clone(),
        );

        Ok(Self {
            inner: Arc::new(AdapterInner {
                strategy: config.dialect.strategy(),
                config,
                query,
                connection,
                signal,
                stats: StatsCounters::default(),
            }),
        })
    }

    /// A view whose `clear` and `all` are scoped to `"<namespace>:"`
    pub fn namespace(&self, namespace: impl Into<String>) -> NamespacedStore {
        NamespacedStore {
            adapter: self.clone(),
            namespace: namespace.into(),
        }
    }

    /// Connect if needed and report whether the adapter is usable
    pub async fn ready(&self) -> std::result::Result<(), Arc<StorageError>> {
        self.inner.connection.ready().await
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// Subscribe to connection lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.inner.signal.subscribe()
    }

    /// Configuration this adapter was built with
    pub fn config(&self) -> &AdapterConfig {
        &self.inner.config
    }

    /// SQL dialect of the backend
    pub fn dialect(&self) -> Dialect {
        self.inner.config.dialect
    }

    /// Description of the backing table
    pub fn table(&self) -> &TableDefinition {
        self.inner.query.table()
    }

    /// Operation counters since construction
    pub fn stats(&self) -> AdapterStats {
        self.inner.stats.snapshot()
    }
}

impl fmt::Debug for SqlAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlAdapter")
            .field("config", &self.inner.config)
            .field("connection", &self.inner.connection)
            .finish()
    }
}

/// Namespace-scoped view over a [`SqlAdapter`].
///
/// `get`, `has`, `set` and `delete` address the exact stored key;
/// [`NamespacedStore::qualify`] builds the conventional `"<namespace>:<key>"`
/// form. `clear` and `all` only ever touch keys under `"<namespace>:"`.
#[derive(Debug, Clone)]
pub struct NamespacedStore {
    adapter: SqlAdapter,
    namespace: String,
}

impl NamespacedStore {
    /// Namespace of this view
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The adapter this view was created from
    pub fn adapter(&self) -> &SqlAdapter {
        &self.adapter
    }

    /// Full stored key for a namespace-local key
    pub fn qualify(&self, local: &str) -> String {
        format!("{}:{}", self.namespace, local)
    }

    fn prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    fn inner(&self) -> &AdapterInner {
        &self.adapter.inner
    }

    async fn lookup(&self, key: &str) -> Result<Option<StoredEntry>> {
        let inner = self.inner();
        let sql = inner.query.select_by_key(&inner.strategy.escape(key));
        let rows = inner.connection.execute(&sql).await?.unwrap_or_default();
        let row = rows.into_iter().next();
        inner.stats.record_lookup(row.is_some());
        Ok(row)
    }

    /// Value stored under `key`, or `None` when absent
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner().stats.record(Operation::Get);
        Ok(self.lookup(key).await?.map(|row| row.value))
    }

    /// Whether a row exists for `key`, regardless of its value
    pub async fn has(&self, key: &str) -> Result<bool> {
        self.inner().stats.record(Operation::Has);
        Ok(self.lookup(key).await?.is_some())
    }

    /// Insert or overwrite the value for `key`.
    ///
    /// Keys longer than the configured key size are rejected with
    /// [`StorageError::KeyTooLong`] before anything is sent to the backend.
    #[instrument(level = "debug", skip(self, value), fields(namespace = %self.namespace))]
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let inner = self.inner();
        inner.stats.record(Operation::Set);

        let len = key.chars().count();
        if len > inner.config.key_size {
            warn!(len, max = inner.config.key_size, "rejecting key longer than the key column");
            return Err(StorageError::KeyTooLong {
                len,
                max: inner.config.key_size,
            });
        }

        let key = inner.strategy.escape(key);
        let value = inner.strategy.escape(value);
        let sql = inner.strategy.upsert(&inner.query, &key, &value);
        inner.connection.execute(&sql).await?;
        Ok(())
    }

    /// Remove `key`, returning whether a row was present.
    ///
    /// The existence check and the delete are separate statements. If another
    /// caller removes the row in between, this call still returns `true`.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let inner = self.inner();
        inner.stats.record(Operation::Delete);

        let key = inner.strategy.escape(key);
        let rows = inner
            .connection
            .execute(&inner.query.select_by_key(&key))
            .await?
            .unwrap_or_default();
        if rows.is_empty() {
            return Ok(false);
        }

        inner.connection.execute(&inner.query.delete_by_key(&key)).await?;
        Ok(true)
    }

    /// Remove every entry under `"<namespace>:"`
    pub async fn clear(&self) -> Result<()> {
        let inner = self.inner();
        inner.stats.record(Operation::Clear);

        let prefix = self.prefix();
        let sql = inner.query.delete_by_prefix(&inner.strategy.escape(&prefix));
        inner.connection.execute(&sql).await?;
        Ok(())
    }

    /// Every entry under `"<namespace>:"`, in no particular order
    pub async fn all(&self) -> Result<Vec<StoredEntry>> {
        let inner = self.inner();
        inner.stats.record(Operation::All);

        let prefix = self.prefix();
        let sql = inner.query.select_by_prefix(&inner.strategy.escape(&prefix));
        Ok(inner.connection.execute(&sql).await?.unwrap_or_default())
    }
}

#[async_trait]
impl KeyValueStore for NamespacedStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        NamespacedStore::get(self, key).await
    }

    async fn has(&self, key: &str) -> Result<bool> {
        NamespacedStore::has(self, key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        NamespacedStore::set(self, key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        NamespacedStore::delete(self, key).await
    }

    async fn clear(&self) -> Result<()> {
        NamespacedStore::clear(self).await
    }

    async fn all(&self) -> Result<Vec<StoredEntry>> {
        NamespacedStore::all(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::QueryExecutor;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records statements and answers every `SELECT` with a canned row set
    #[derive(Default)]
    struct Script {
        statements: Mutex<Vec<String>>,
        rows: Mutex<Vec<StoredEntry>>,
    }

    #[async_trait]
    impl QueryExecutor for Script {
        async fn query(&self, sql: &str) -> Result<Vec<StoredEntry>> {
            self.statements.lock().unwrap().push(sql.to_string());
            if sql.starts_with("SELECT") {
                return Ok(self.rows.lock().unwrap().clone());
            }
            Ok(Vec::new())
        }
    }

    fn adapter(dialect: Dialect, script: Arc<Script>) -> SqlAdapter {
        let connector = crate::traits::FnConnector::new(move || {
            let executor: Arc<dyn QueryExecutor> = script.clone();
            async move { Ok::<_, StorageError>(executor) }
        });
        SqlAdapter::new(AdapterConfig::new(dialect), connector).unwrap()
    }

    fn last_statement(script: &Script) -> String {
        script.statements.lock().unwrap().last().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_postgres_set_uses_conflict_clause() {
        let script = Arc::new(Script::default());
        let store = adapter(Dialect::Postgres, script.clone()).namespace("ns");

        store.set("ns:a", r"x\y").await.unwrap();
        assert_eq!(
            last_statement(&script),
            r#"INSERT INTO "endb" ("key", "value") VALUES ('ns:a', 'x\y') ON CONFLICT ("key") DO UPDATE SET "value" = EXCLUDED."value""#
        );
    }

    #[tokio::test]
    async fn test_mysql_set_doubles_backslashes() {
        let script = Arc::new(Script::default());
        let store = adapter(Dialect::Mysql, script.clone()).namespace("ns");

        store.set("ns:a", r"C:\dir\file").await.unwrap();
        assert_eq!(
            last_statement(&script),
            r"REPLACE INTO `endb` (`key`, `value`) VALUES ('ns:a', 'C:\\dir\\file')"
        );
    }

    #[tokio::test]
    async fn test_sqlite_set_uses_replace_without_escaping() {
        let script = Arc::new(Script::default());
        let store = adapter(Dialect::Sqlite, script.clone()).namespace("ns");

        store.set("ns:a", r"it's \ fine").await.unwrap();
        assert_eq!(
            last_statement(&script),
            r#"REPLACE INTO "endb" ("key", "value") VALUES ('ns:a', 'it''s \ fine')"#
        );
    }

    #[tokio::test]
    async fn test_first_statement_creates_table() {
        let script = Arc::new(Script::default());
        let store = adapter(Dialect::Sqlite, script.clone()).namespace("ns");

        store.has("ns:a").await.unwrap();
        let statements = script.statements.lock().unwrap().clone();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS"));
    }

    #[tokio::test]
    async fn test_delete_absent_key_skips_delete_statement() {
        let script = Arc::new(Script::default());
        let store = adapter(Dialect::Sqlite, script.clone()).namespace("ns");

        assert!(!store.delete("ns:missing").await.unwrap());
        let statements = script.statements.lock().unwrap().clone();
        assert!(statements.iter().all(|s| !s.starts_with("DELETE")));
    }

    #[tokio::test]
    async fn test_delete_present_key() {
        let script = Arc::new(Script::default());
        script.rows.lock().unwrap().push(StoredEntry::new("ns:a", "1"));
        let store = adapter(Dialect::Sqlite, script.clone()).namespace("ns");

        assert!(store.delete("ns:a").await.unwrap());
        assert_eq!(
            last_statement(&script),
            r#"DELETE FROM "endb" WHERE "key" = 'ns:a'"#
        );
    }

    #[tokio::test]
    async fn test_clear_and_all_are_prefix_scoped() {
        let script = Arc::new(Script::default());
        let store = adapter(Dialect::Postgres, script.clone()).namespace("cache_v1");

        store.clear().await.unwrap();
        assert_eq!(
            last_statement(&script),
            r#"DELETE FROM "endb" WHERE "key" LIKE 'cache!_v1:%' ESCAPE '!' AND SUBSTR("key", 1, 9) = 'cache_v1:'"#
        );

        store.all().await.unwrap();
        assert_eq!(
            last_statement(&script),
            r#"SELECT "key", "value" FROM "endb" WHERE "key" LIKE 'cache!_v1:%' ESCAPE '!' AND SUBSTR("key", 1, 9) = 'cache_v1:'"#
        );
    }

    #[tokio::test]
    async fn test_overlong_key_is_rejected_before_sql() {
        let script = Arc::new(Script::default());
        let adapter = SqlAdapter::new(
            AdapterConfig::new(Dialect::Sqlite).with_key_size(4),
            {
                let script = script.clone();
                crate::traits::FnConnector::new(move || {
                    let executor: Arc<dyn QueryExecutor> = script.clone();
                    async move { Ok::<_, StorageError>(executor) }
                })
            },
        )
        .unwrap();
        let store = adapter.namespace("n");

        let err = store.set("n:abc", "v").await.unwrap_err();
        assert!(matches!(err, StorageError::KeyTooLong { len: 5, max: 4 }));
        assert!(script.statements.lock().unwrap().is_empty());

        // Length counts characters, not bytes
        store.set("n:éé", "v").await.unwrap();
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let connector = crate::traits::FnConnector::new(|| {
            async { Err::<Arc<dyn QueryExecutor>, _>(StorageError::connect("unused")) }
        });
        let result = SqlAdapter::new(AdapterConfig::new(Dialect::Sqlite).with_table(""), connector);
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[tokio::test]
    async fn test_stats_track_operations() {
        let script = Arc::new(Script::default());
        let adapter = adapter(Dialect::Sqlite, script);
        let store = adapter.namespace("ns");

        store.get("ns:a").await.unwrap();
        store.has("ns:a").await.unwrap();
        store.set("ns:a", "1").await.unwrap();

        let stats = adapter.stats();
        assert_eq!(stats.get_count, 1);
        assert_eq!(stats.has_count, 1);
        assert_eq!(stats.set_count, 1);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn test_qualify() {
        let script = Arc::new(Script::default());
        let store = adapter(Dialect::Sqlite, script).namespace("users");
        assert_eq!(store.namespace(), "users");
        assert_eq!(store.qualify("42"), "users:42");
    }
}
