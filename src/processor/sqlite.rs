//! SQLite implementation of the trace-processor tables.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use super::{QueryResult, SqlValue, TraceProcessor};

/// Tables the input-event parsers read, in the trace processor's layout.
///
/// `ts` columns are BOOTTIME nanoseconds. Event payloads live in `args`,
/// keyed by `arg_set_id`.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS android_motion_events (
    id INTEGER PRIMARY KEY,
    event_id INTEGER NOT NULL,
    ts INTEGER NOT NULL,
    arg_set_id INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS android_key_events (
    id INTEGER PRIMARY KEY,
    event_id INTEGER NOT NULL,
    ts INTEGER NOT NULL,
    arg_set_id INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS android_input_event_dispatch (
    id INTEGER PRIMARY KEY,
    event_id INTEGER NOT NULL,
    arg_set_id INTEGER NOT NULL,
    vsync_id INTEGER,
    window_id INTEGER
);

CREATE TABLE IF NOT EXISTS args (
    id INTEGER PRIMARY KEY,
    arg_set_id INTEGER NOT NULL,
    flat_key TEXT NOT NULL,
    key TEXT NOT NULL,
    int_value INTEGER,
    string_value TEXT,
    real_value REAL,
    value_type TEXT
);

CREATE TABLE IF NOT EXISTS clock_snapshot (
    id INTEGER PRIMARY KEY,
    ts INTEGER NOT NULL,
    clock_id INTEGER NOT NULL,
    clock_name TEXT,
    clock_value INTEGER NOT NULL,
    snapshot_id INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_args_set ON args(arg_set_id);
CREATE INDEX IF NOT EXISTS idx_dispatch_event ON android_input_event_dispatch(event_id);
"#;

/// Create the input-event tables in `conn`.
pub fn create_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

/// [`TraceProcessor`] backed by an SQLite database.
pub struct SqliteTraceProcessor {
    conn: Mutex<Connection>,
}

impl SqliteTraceProcessor {
    /// Open an existing database.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Database not found: {}", path.display());
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Self::from_connection(conn))
    }

    /// Fresh in-memory database with the input-event tables created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run `f` with exclusive access to the connection, e.g. to load data.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("trace processor connection lock poisoned"))?;
        f(&conn)
    }
}

impl TraceProcessor for SqliteTraceProcessor {
    fn query(&self, sql: &str) -> Result<QueryResult> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .with_context(|| format!("Failed to prepare query: {sql}"))?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let column_count = columns.len();

            let mut rows = stmt.query([])?;
            let mut rows_data = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(sql_value(row.get_ref(i)?));
                }
                rows_data.push(values);
            }

            Ok(QueryResult {
                columns,
                rows: rows_data,
            })
        })
    }
}

fn sql_value(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(v) => SqlValue::Long(v),
        ValueRef::Real(v) => SqlValue::Double(v),
        ValueRef::Text(t) => SqlValue::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Bytes(b.to_vec()),
    }
}
