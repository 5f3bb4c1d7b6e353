//! Query result types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single row as a map of column name to value.
pub type Row = BTreeMap<String, Value>;

/// The rows returned by one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names in order.
    pub columns: Vec<String>,
    /// Rows as maps of column name to value.
    pub rows: Vec<Row>,
    /// Rows changed by a write statement, when the driver reports it.
    #[serde(default)]
    pub rows_affected: u64,
}

impl ResultSet {
    /// Create a new empty result set.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    /// Create from rows, inferring columns from first row.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        Self {
            columns,
            rows,
            rows_affected: 0,
        }
    }

    /// Result of a write statement.
    pub fn modified(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Default::default()
        }
    }

    /// Add a row.
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a row by index.
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_rows_infers_columns() {
        let row: Row = serde_json::from_value(json!({"id": 1, "name": "Alice"})).unwrap();
        let rs = ResultSet::from_rows(vec![row]);
        assert_eq!(rs.columns, vec!["id".to_string(), "name".to_string()]);
        assert_eq!(rs.get(0).and_then(|r| r.get("id")), Some(&json!(1)));
    }

    #[test]
    fn test_modified_has_no_rows() {
        let rs = ResultSet::modified(3);
        assert!(rs.is_empty());
        assert_eq!(rs.rows_affected, 3);
    }
}
