//! Query access to a trace-processor dataset.
//!
//! The trace processor exposes an already-ingested trace as SQL tables. The
//! parser only needs the ability to run a query and walk the returned rows,
//! so that is the whole of the [`TraceProcessor`] seam. [`SqliteTraceProcessor`]
//! implements it over an SQLite database laid out with the same tables.

mod sqlite;

pub use sqlite::{create_schema, SqliteTraceProcessor, SCHEMA_SQL};

use anyhow::Result;
use serde::Serialize;

/// Something that can answer SQL queries over trace tables.
///
/// Implementations must tolerate concurrent calls; the parser issues queries
/// from whichever thread asks for an entry.
pub trait TraceProcessor: Send + Sync {
    fn query(&self, sql: &str) -> Result<QueryResult>;
}

/// One cell of a query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Long(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Double(v) => Some(*v),
            SqlValue::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Result of a SQL query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate rows with by-name column access.
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }
}

/// Borrowed view of one result row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [SqlValue],
}

impl<'a> Row<'a> {
    /// Cell in column `name`; a missing column reads as NULL.
    pub fn get(&self, name: &str) -> &'a SqlValue {
        const NULL: &SqlValue = &SqlValue::Null;
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
            .unwrap_or(NULL)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).as_i64()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).as_f64()
    }

    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).as_str().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_access_by_name() {
        let result = QueryResult {
            columns: vec!["id".to_string(), "ts".to_string(), "name".to_string()],
            rows: vec![vec![
                SqlValue::Long(3),
                SqlValue::Double(1.5),
                SqlValue::String("motion".to_string()),
            ]],
        };
        let row = result.iter().next().unwrap();
        assert_eq!(row.get_i64("id"), Some(3));
        assert_eq!(row.get_f64("ts"), Some(1.5));
        assert_eq!(row.get_string("name").as_deref(), Some("motion"));
        assert!(row.get("missing").is_null());
        assert_eq!(result.column_index("ts"), Some(1));
        assert_eq!(result.len(), 1);
    }
}
