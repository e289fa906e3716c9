//! SQL dialects and the per-family upsert/escape strategies

use crate::error::StorageError;
use crate::query::QueryBuilder;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
    /// MySQL and MariaDB
    #[serde(alias = "mariadb")]
    Mysql,
    /// SQLite
    #[serde(alias = "sqlite3")]
    Sqlite,
}

impl Dialect {
    /// Resolve the strategy for this dialect's family
    pub fn strategy(self) -> &'static dyn DialectStrategy {
        match self {
            Dialect::Postgres => &ConflictClause,
            Dialect::Mysql => &BackslashSensitive,
            Dialect::Sqlite => &TableReplace,
        }
    }

    /// Dialect identifier as used in configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::Mysql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => Err(StorageError::Config(format!("Unknown dialect: {other}"))),
        }
    }
}

/// Upsert and escaping rules for one dialect family
pub trait DialectStrategy: Send + Sync + fmt::Debug {
    /// Build the insert-or-update statement for a key/value pair.
    ///
    /// Both inputs must already have gone through [`DialectStrategy::escape`].
    fn upsert(&self, query: &QueryBuilder, key: &str, value: &str) -> String;

    /// Escape a string before it is embedded as a literal
    fn escape<'a>(&self, input: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(input)
    }
}

/// Family with `INSERT ... ON CONFLICT (key) DO UPDATE`
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictClause;

impl DialectStrategy for ConflictClause {
    fn upsert(&self, query: &QueryBuilder, key: &str, value: &str) -> String {
        query.insert_on_conflict_update(key, value)
    }
}

/// Family where backslash is an escape character inside string literals
#[derive(Debug, Clone, Copy, Default)]
pub struct BackslashSensitive;

impl DialectStrategy for BackslashSensitive {
    fn upsert(&self, query: &QueryBuilder, key: &str, value: &str) -> String {
        query.replace(key, value)
    }

    fn escape<'a>(&self, input: &'a str) -> Cow<'a, str> {
        escape_backslashes(input)
    }
}

/// Generic family using the native table-replace upsert
#[derive(Debug, Clone, Copy, Default)]
pub struct TableReplace;

impl DialectStrategy for TableReplace {
    fn upsert(&self, query: &QueryBuilder, key: &str, value: &str) -> String {
        query.replace(key, value)
    }
}

/// Double every backslash, borrowing when there is nothing to escape
pub fn escape_backslashes(input: &str) -> Cow<'_, str> {
    if input.contains('\\') {
        Cow::Owned(input.replace('\\', "\\\\"))
    } else {
        Cow::Borrowed(input)
    }
}
