//! Basic usage of endb-sql against a local SQLite file

use endb_sql::backends::SqlxConnector;
use endb_sql::prelude::*;
use std::error::Error;
use tracing_subscriber::EnvFilter;

type BoxResult<T> = std::result::Result<T, Box<dyn Error>>;

#[tokio::main]
async fn main() -> BoxResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::temp_dir().join("endb-sql-example.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let adapter = SqlAdapter::new(AdapterConfig::new(Dialect::Sqlite), SqlxConnector::new(url))?;

    // Example 1: Basic operations within a namespace
    basic_operations_example(&adapter).await?;

    // Example 2: Namespaces do not see each other
    namespace_example(&adapter).await?;

    // Example 3: Observing connection health
    health_example(&adapter).await?;

    println!("stats: {:?}", adapter.stats());
    Ok(())
}

async fn basic_operations_example(adapter: &SqlAdapter) -> BoxResult<()> {
    println!("=== Basic Operations ===");
    let users = adapter.namespace("users");
    let key = users.qualify("42");

    users.set(&key, r#"{"name":"Ada","home":"C:\\Users\\ada"}"#).await?;
    println!("get {key}: {:?}", users.get(&key).await?);
    println!("has {key}: {}", users.has(&key).await?);
    println!("delete {key}: {}", users.delete(&key).await?);
    println!("delete {key} again: {}", users.delete(&key).await?);
    Ok(())
}

async fn namespace_example(adapter: &SqlAdapter) -> BoxResult<()> {
    println!("=== Namespaces ===");
    let sessions = adapter.namespace("sessions");
    let tokens = adapter.namespace("tokens");

    for id in ["a", "b", "c"] {
        sessions.set(&sessions.qualify(id), "active").await?;
    }
    tokens.set(&tokens.qualify("t1"), "secret").await?;

    sessions.clear().await?;
    println!("sessions after clear: {:?}", sessions.all().await?);
    println!("tokens after clearing sessions: {:?}", tokens.all().await?);

    tokens.clear().await?;
    Ok(())
}

async fn health_example(adapter: &SqlAdapter) -> BoxResult<()> {
    println!("=== Health ===");
    let unreachable = SqlAdapter::new(
        AdapterConfig::new(Dialect::Sqlite),
        SqlxConnector::new("sqlite:///nonexistent-dir/endb.db"),
    )?;
    let mut events = unreachable.subscribe();

    // Degraded adapters answer with empty results instead of erroring
    let store = unreachable.namespace("users");
    println!("get on failed adapter: {:?}", store.get("users:1").await?);
    if let Ok(event) = events.recv().await {
        println!("event: {:?}", event.error().map(|e| e.to_string()));
    }

    println!("healthy adapter state: {:?}", adapter.state());
    Ok(())
}
