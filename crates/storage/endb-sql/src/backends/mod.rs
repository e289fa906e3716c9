//! Concrete connectors

#[cfg(feature = "sqlx-backend")]
pub mod sqlx;

#[cfg(feature = "sqlx-backend")]
pub use self::sqlx::{SqlxConnector, SqlxExecutor};
