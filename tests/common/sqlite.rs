//! Trace-processor dataset fixtures.

use std::path::Path;
use std::sync::{Arc, LazyLock};

use perfetto_protos::builtin_clock::BuiltinClock;
use regex::Regex;
use rusqlite::{params, Connection};
use winscope_trace::processor::{create_schema, SqliteTraceProcessor};

use super::scenario::{
    key_scenario, motion_scenario, DispatchFixture, DEVICE_ID, MOTION_FLAGS,
    REAL_TO_ELAPSED_OFFSET_NS, SOURCE_TOUCHSCREEN,
};

static INDEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d+\]").unwrap());

enum Value {
    Int(i64),
    UInt(i64),
    Real(f64),
}

struct Writer<'a> {
    conn: &'a Connection,
    next_arg_set: i64,
    next_dispatch: i64,
}

impl Writer<'_> {
    fn arg_set(&mut self, args: &[(&str, Value)]) -> rusqlite::Result<i64> {
        let arg_set_id = self.next_arg_set;
        self.next_arg_set += 1;
        for (key, value) in args {
            let flat_key = INDEX_RE.replace_all(key, "").into_owned();
            let (int_value, real_value, value_type) = match value {
                Value::Int(v) => (Some(*v), None, "int"),
                Value::UInt(v) => (Some(*v), None, "uint"),
                Value::Real(v) => (None, Some(*v), "real"),
            };
            self.conn.execute(
                "INSERT INTO args (arg_set_id, flat_key, key, int_value, string_value, real_value, value_type)
                 VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6)",
                params![arg_set_id, flat_key, key, int_value, real_value, value_type],
            )?;
        }
        Ok(arg_set_id)
    }

    fn dispatch(&mut self, event_id: u32, dispatch: &DispatchFixture) -> rusqlite::Result<()> {
        let arg_set_id = self.arg_set(&[
            ("event_id", Value::UInt(i64::from(event_id))),
            ("vsync_id", Value::Int(dispatch.vsync_id)),
            ("window_id", Value::Int(dispatch.window_id)),
        ])?;
        self.conn.execute(
            "INSERT INTO android_input_event_dispatch (id, event_id, arg_set_id, vsync_id, window_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.next_dispatch,
                event_id,
                arg_set_id,
                dispatch.vsync_id,
                dispatch.window_id
            ],
        )?;
        self.next_dispatch += 1;
        Ok(())
    }
}

/// Write the whole scenario into `conn`, whose tables must already exist.
pub fn populate(conn: &Connection) -> rusqlite::Result<()> {
    let mut writer = Writer {
        conn,
        next_arg_set: 1,
        next_dispatch: 0,
    };

    let motions = motion_scenario();
    let boot = motions[0].elapsed_ns - 1_000_000;
    conn.execute(
        "INSERT INTO clock_snapshot (ts, clock_id, clock_name, clock_value, snapshot_id)
         VALUES (?1, ?3, 'BOOTTIME', ?1, 0), (?1, ?4, 'REALTIME', ?2, 0)",
        params![
            boot,
            boot + REAL_TO_ELAPSED_OFFSET_NS,
            BuiltinClock::BUILTIN_CLOCK_BOOTTIME as i64,
            BuiltinClock::BUILTIN_CLOCK_REALTIME as i64
        ],
    )?;

    // rows go in out of timestamp order, like the packets of the binary trace
    for (row_id, index) in [0usize, 2, 1, 3].into_iter().enumerate() {
        let event = &motions[index];
        let arg_set_id = writer.arg_set(&[
            ("event_id", Value::UInt(i64::from(event.event_id))),
            ("event_time_nanos", Value::Int(event.elapsed_ns)),
            ("source", Value::Int(i64::from(SOURCE_TOUCHSCREEN))),
            ("action", Value::Int(i64::from(event.action))),
            ("device_id", Value::Int(i64::from(DEVICE_ID))),
            ("display_id", Value::Int(0)),
            ("classification", Value::Int(0)),
            ("flags", Value::UInt(i64::from(MOTION_FLAGS))),
            ("meta_state", Value::Int(0)),
            ("down_time_nanos", Value::Int(event.down_time_ns)),
            ("pointer[0].pointer_id", Value::Int(0)),
            ("pointer[0].tool_type", Value::Int(1)),
            ("pointer[0].axis_value[0].axis", Value::Int(0)),
            ("pointer[0].axis_value[0].value", Value::Real(event.x)),
            ("pointer[0].axis_value[1].axis", Value::Int(1)),
            ("pointer[0].axis_value[1].value", Value::Real(event.y)),
        ])?;
        conn.execute(
            "INSERT INTO android_motion_events (id, event_id, ts, arg_set_id) VALUES (?1, ?2, ?3, ?4)",
            params![row_id as i64, event.event_id, event.elapsed_ns, arg_set_id],
        )?;
        for dispatch in &event.dispatches {
            writer.dispatch(event.event_id, dispatch)?;
        }
    }

    for (row_id, event) in key_scenario().iter().enumerate() {
        let arg_set_id = writer.arg_set(&[
            ("event_id", Value::UInt(i64::from(event.event_id))),
            ("event_time_nanos", Value::Int(event.elapsed_ns)),
            ("source", Value::Int(0x101)),
            ("action", Value::Int(i64::from(event.action))),
            ("device_id", Value::Int(1)),
            ("key_code", Value::Int(i64::from(event.key_code))),
            ("meta_state", Value::Int(0)),
        ])?;
        conn.execute(
            "INSERT INTO android_key_events (id, event_id, ts, arg_set_id) VALUES (?1, ?2, ?3, ?4)",
            params![row_id as i64, event.event_id, event.elapsed_ns, arg_set_id],
        )?;
        for dispatch in &event.dispatches {
            writer.dispatch(event.event_id, dispatch)?;
        }
    }
    Ok(())
}

/// The scenario in an in-memory trace processor.
pub fn scenario_processor() -> Arc<SqliteTraceProcessor> {
    let tp = SqliteTraceProcessor::open_in_memory().unwrap();
    tp.with_connection(|conn| Ok(populate(conn)?)).unwrap();
    Arc::new(tp)
}

/// The scenario written to an SQLite file at `path`.
pub fn scenario_database(path: &Path) {
    let conn = Connection::open(path).unwrap();
    create_schema(&conn).unwrap();
    populate(&conn).unwrap();
}
