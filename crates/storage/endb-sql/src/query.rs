//! SQL text generation for the key/value table
//!
//! Every function here is pure: it maps a dialect, a table description and
//! already-escaped inputs to SQL text. Nothing in this module performs I/O.

use crate::dialect::Dialect;
use crate::schema::{ColumnDefinition, ColumnType, TableDefinition, KEY_COLUMN, VALUE_COLUMN};

/// Escape character used in `LIKE` prefix patterns
pub const LIKE_ESCAPE: char = '!';

/// Builds dialect-specific statements against one table
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    dialect: Dialect,
    table: TableDefinition,
}

impl QueryBuilder {
    /// Create a builder for `table` in `dialect`
    pub fn new(dialect: Dialect, table: TableDefinition) -> Self {
        Self { dialect, table }
    }

    /// Dialect this builder targets
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Table this builder targets
    pub fn table(&self) -> &TableDefinition {
        &self.table
    }

    /// `CREATE TABLE IF NOT EXISTS` for the described table
    pub fn create_table_if_not_exists(&self) -> String {
        let columns = self
            .table
            .columns()
            .iter()
            .map(|c| self.column_definition(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.quote_ident(self.table.name()),
            columns
        )
    }

    /// Select the row with exactly this key
    pub fn select_by_key(&self, key: &str) -> String {
        format!(
            "SELECT {}, {} FROM {} WHERE {} = {}",
            self.quote_ident(KEY_COLUMN),
            self.quote_ident(VALUE_COLUMN),
            self.quote_ident(self.table.name()),
            self.quote_ident(KEY_COLUMN),
            quote_literal(key)
        )
    }

    /// Delete the row with exactly this key
    pub fn delete_by_key(&self, key: &str) -> String {
        format!(
            "DELETE FROM {} WHERE {} = {}",
            self.quote_ident(self.table.name()),
            self.quote_ident(KEY_COLUMN),
            quote_literal(key)
        )
    }

    /// Select every row whose key starts with `prefix`
    pub fn select_by_prefix(&self, prefix: &str) -> String {
        format!(
            "SELECT {}, {} FROM {} WHERE {}",
            self.quote_ident(KEY_COLUMN),
            self.quote_ident(VALUE_COLUMN),
            self.quote_ident(self.table.name()),
            self.prefix_predicate(prefix)
        )
    }

    /// Delete every row whose key starts with `prefix`
    pub fn delete_by_prefix(&self, prefix: &str) -> String {
        format!(
            "DELETE FROM {} WHERE {}",
            self.quote_ident(self.table.name()),
            self.prefix_predicate(prefix)
        )
    }

    /// `INSERT ... ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value`
    pub fn insert_on_conflict_update(&self, key: &str, value: &str) -> String {
        let value_col = self.quote_ident(VALUE_COLUMN);
        format!(
            "INSERT INTO {} ({}, {}) VALUES ({}, {}) ON CONFLICT ({}) DO UPDATE SET {} = EXCLUDED.{}",
            self.quote_ident(self.table.name()),
            self.quote_ident(KEY_COLUMN),
            value_col,
            quote_literal(key),
            quote_literal(value),
            self.quote_ident(KEY_COLUMN),
            value_col,
            value_col
        )
    }

    /// `REPLACE INTO` upsert
    pub fn replace(&self, key: &str, value: &str) -> String {
        format!(
            "REPLACE INTO {} ({}, {}) VALUES ({}, {})",
            self.quote_ident(self.table.name()),
            self.quote_ident(KEY_COLUMN),
            self.quote_ident(VALUE_COLUMN),
            quote_literal(key),
            quote_literal(value)
        )
    }

    /// Quote an identifier for this dialect, doubling embedded quote characters
    pub fn quote_ident(&self, ident: &str) -> String {
        let quote = match self.dialect {
            Dialect::Mysql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        };
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(quote);
        for c in ident.chars() {
            if c == quote {
                out.push(quote);
            }
            out.push(c);
        }
        out.push(quote);
        out
    }

    fn prefix_predicate(&self, prefix: &str) -> String {
        // LIKE folds ASCII case on SQLite; the SUBSTR comparison does not
        let key = self.quote_ident(KEY_COLUMN);
        format!(
            "{key} LIKE {} ESCAPE '{}' AND SUBSTR({key}, 1, {}) = {}",
            quote_literal(&like_prefix_pattern(prefix)),
            LIKE_ESCAPE,
            self.literal_len(prefix),
            quote_literal(prefix)
        )
    }

    /// Length in characters of an escaped input once the backend parses it
    fn literal_len(&self, escaped: &str) -> usize {
        let chars = escaped.chars().count();
        match self.dialect {
            // Doubled backslashes collapse to one inside MySQL literals
            Dialect::Mysql => chars - escaped.matches('\\').count() / 2,
            Dialect::Postgres | Dialect::Sqlite => chars,
        }
    }

    fn column_definition(&self, column: &ColumnDefinition) -> String {
        let data_type = match (column.data_type, self.dialect) {
            // Binary collation keeps key equality case-sensitive
            (ColumnType::Varchar(size), Dialect::Mysql) => {
                format!("VARCHAR({size}) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin")
            }
            (ColumnType::Varchar(size), _) => format!("VARCHAR({size})"),
            // TEXT caps out at 64 KiB on MySQL
            (ColumnType::Text, Dialect::Mysql) => "LONGTEXT".to_string(),
            (ColumnType::Text, _) => "TEXT".to_string(),
        };
        let mut def = format!("{} {}", self.quote_ident(&column.name), data_type);
        if column.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        def
    }
}

/// Render a string literal, doubling embedded single quotes
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// `LIKE` pattern matching every string that starts with `prefix`.
///
/// Wildcards and the escape character inside `prefix` are escaped with
/// [`LIKE_ESCAPE`], so only a literal prefix match is possible.
pub fn like_prefix_pattern(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out.push('%');
    out
}
