//! Table description for the two-column key/value table

use serde::{Deserialize, Serialize};

/// Name of the primary key column
pub const KEY_COLUMN: &str = "key";

/// Name of the payload column
pub const VALUE_COLUMN: &str = "value";

/// Column data types used by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Bounded string with a maximum length in characters
    Varchar(usize),
    /// Unbounded text
    Text,
}

/// A single column of the backing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// Column data type
    pub data_type: ColumnType,
    /// Whether the column is the primary key
    pub primary_key: bool,
}

/// Description of the backing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    name: String,
    columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Describe the `(key, value)` table used by the adapter.
    ///
    /// `key` is a `VARCHAR(key_size)` primary key and `value` is unbounded text.
    pub fn key_value(name: impl Into<String>, key_size: usize) -> Self {
        Self {
            name: name.into(),
            columns: vec![
                ColumnDefinition {
                    name: KEY_COLUMN.to_string(),
                    data_type: ColumnType::Varchar(key_size),
                    primary_key: true,
                },
                ColumnDefinition {
                    name: VALUE_COLUMN.to_string(),
                    data_type: ColumnType::Text,
                    primary_key: false,
                },
            ],
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All columns in declaration order
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// The primary key column
    pub fn primary_key(&self) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Maximum key length declared by the schema
    pub fn key_size(&self) -> Option<usize> {
        self.primary_key().and_then(|c| match c.data_type {
            ColumnType::Varchar(size) => Some(size),
            ColumnType::Text => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_table() {
        let table = TableDefinition::key_value("endb", 255);
        assert_eq!(table.name(), "endb");
        assert_eq!(table.columns().len(), 2);

        let key = table.primary_key().unwrap();
        assert_eq!(key.name, KEY_COLUMN);
        assert_eq!(key.data_type, ColumnType::Varchar(255));

        let value = &table.columns()[1];
        assert_eq!(value.name, VALUE_COLUMN);
        assert_eq!(value.data_type, ColumnType::Text);
        assert!(!value.primary_key);
    }

    #[test]
    fn test_key_size_follows_config() {
        assert_eq!(TableDefinition::key_value("t", 64).key_size(), Some(64));
    }
}
