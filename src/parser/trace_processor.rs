//! Parser over a trace-processor dataset.
//!
//! Opening runs one query for the ordered event rows and one for the clock
//! snapshot. Arg sets and window dispatch rows are only fetched when an
//! entry is first requested.

use std::sync::Arc;

use anyhow::Context;
use perfetto_protos::builtin_clock::BuiltinClock;

use crate::config::ParserConfig;
use crate::decode::{Arg, ArgSet, ArgValue, ArgsDecoder, ArgsRecord, RecordDecoder};
use crate::entry::Entry;
use crate::error::{Result, TraceError};
use crate::processor::{QueryResult, TraceProcessor};
use crate::schema::SchemaRegistry;
use crate::timestamp::{Timestamp, TimestampConverter};
use crate::trace_type::{CoarseVersion, TraceType};

use super::{check_index, target_clock, EntryCache, Parser};

const CLOCK_REALTIME: i64 = BuiltinClock::BUILTIN_CLOCK_REALTIME as i64;
const CLOCK_BOOTTIME: i64 = BuiltinClock::BUILTIN_CLOCK_BOOTTIME as i64;

fn events_table(trace_type: TraceType) -> &'static str {
    match trace_type {
        TraceType::InputMotionEvent => "android_motion_events",
        TraceType::InputKeyEvent => "android_key_events",
    }
}

/// One indexed event row.
#[derive(Debug, Clone, Copy)]
struct EventRow {
    event_id: i64,
    arg_set_id: i64,
}

/// Random access to the input events stored in a trace processor.
pub struct TraceProcessorParser {
    trace_type: TraceType,
    tp: Arc<dyn TraceProcessor>,
    decoder: ArgsDecoder,
    rows: Vec<EventRow>,
    timestamps: Vec<Timestamp>,
    converter: TimestampConverter,
    skipped: usize,
    cache: EntryCache,
}

impl TraceProcessorParser {
    pub fn open(
        tp: Arc<dyn TraceProcessor>,
        trace_type: TraceType,
        config: &ParserConfig,
    ) -> Result<Self> {
        Self::open_with_schemas(tp, trace_type, config, SchemaRegistry::default())
    }

    pub fn open_with_schemas(
        tp: Arc<dyn TraceProcessor>,
        trace_type: TraceType,
        config: &ParserConfig,
        schemas: SchemaRegistry,
    ) -> Result<Self> {
        let table = events_table(trace_type);
        let result = tp
            .query(&format!(
                "SELECT id, event_id, ts, arg_set_id FROM {table} ORDER BY ts, id"
            ))
            .with_context(|| format!("Failed to index {table}"))
            .map_err(TraceError::query)?;

        let offset = match config.real_to_elapsed_offset_ns {
            Some(offset) => Some(offset),
            None => query_clock_offset(tp.as_ref())?,
        };
        let converter = TimestampConverter::new(offset);
        let target = target_clock(config, &converter);

        let mut rows = Vec::with_capacity(result.len());
        let mut timestamps = Vec::with_capacity(result.len());
        let mut skipped = 0;
        for (row_index, row) in result.iter().enumerate() {
            let (Some(event_id), Some(ts), Some(arg_set_id)) = (
                row.get_i64("event_id"),
                row.get_i64("ts"),
                row.get_i64("arg_set_id"),
            ) else {
                let reason = format!("row id {:?} has a NULL column", row.get("id"));
                if config.skip_malformed_records {
                    tracing::warn!("Skipping {table} row {row_index}: {reason}");
                    skipped += 1;
                    continue;
                }
                return Err(TraceError::MalformedRecord {
                    index: row_index,
                    reason,
                });
            };
            rows.push(EventRow {
                event_id,
                arg_set_id,
            });
            timestamps.push(converter.convert(Timestamp::elapsed(ts), target)?);
        }

        Ok(Self {
            trace_type,
            tp,
            decoder: ArgsDecoder::new(trace_type, schemas),
            rows,
            timestamps,
            converter,
            skipped,
            cache: EntryCache::new(),
        })
    }

    fn query(&self, sql: &str, what: impl FnOnce() -> String) -> Result<QueryResult> {
        self.tp
            .query(sql)
            .with_context(what)
            .map_err(TraceError::query)
    }

    /// Rows of one arg set. A row without a key fails entry `index`.
    fn arg_set(&self, index: usize, arg_set_id: i64) -> Result<ArgSet> {
        let result = self.query(
            &format!(
                "SELECT key, int_value, string_value, real_value, value_type \
                 FROM args WHERE arg_set_id = {arg_set_id} ORDER BY id"
            ),
            || format!("Failed to read arg set {arg_set_id}"),
        )?;
        result
            .iter()
            .map(|row| -> Result<Arg> {
                let key = row.get_string("key").ok_or_else(|| TraceError::MalformedRecord {
                    index,
                    reason: format!("arg set {arg_set_id} has a row without a key"),
                })?;
                let value_type = row.get_string("value_type");
                let value = ArgValue::from_columns(
                    value_type.as_deref(),
                    row.get_i64("int_value"),
                    row.get_string("string_value"),
                    row.get_f64("real_value"),
                );
                Ok(Arg::new(key, value))
            })
            .collect()
    }

    fn record(&self, index: usize, row: EventRow) -> Result<ArgsRecord> {
        let event_id = row.event_id;
        let dispatches = self.query(
            &format!(
                "SELECT id, arg_set_id FROM android_input_event_dispatch \
                 WHERE event_id = {event_id} ORDER BY id"
            ),
            || format!("Failed to read window dispatch events of event {event_id}"),
        )?;
        let dependents = dispatches
            .iter()
            .map(|d| -> Result<ArgSet> {
                let arg_set_id = d.get_i64("arg_set_id").ok_or_else(|| {
                    TraceError::MalformedRecord {
                        index,
                        reason: format!(
                            "window dispatch row id {:?} of event {event_id} has no arg set",
                            d.get("id")
                        ),
                    }
                })?;
                self.arg_set(index, arg_set_id)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ArgsRecord {
            primary: self.arg_set(index, row.arg_set_id)?,
            dependents,
        })
    }
}

impl Parser for TraceProcessorParser {
    fn trace_type(&self) -> TraceType {
        self.trace_type
    }

    fn coarse_version(&self) -> CoarseVersion {
        CoarseVersion::Latest
    }

    fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    fn entry(&self, index: usize) -> Result<Arc<Entry>> {
        check_index(index, self.rows.len())?;
        self.cache.get_or_try_insert_with(index, || {
            let record = self.record(index, self.rows[index])?;
            let tree = self
                .decoder
                .decode(&record)
                .map_err(|e| TraceError::MalformedRecord {
                    index,
                    reason: e.to_string(),
                })?;
            Ok(Entry::new(self.trace_type, index, self.timestamps[index], tree))
        })
    }

    fn skipped_records(&self) -> usize {
        self.skipped
    }

    fn timestamp_converter(&self) -> TimestampConverter {
        self.converter
    }
}

/// `REALTIME - BOOTTIME` from the first snapshot that has both clocks.
fn query_clock_offset(tp: &dyn TraceProcessor) -> Result<Option<i64>> {
    let result = tp
        .query(&format!(
            "SELECT snapshot_id, clock_id, clock_value FROM clock_snapshot \
             WHERE clock_id IN ({CLOCK_REALTIME}, {CLOCK_BOOTTIME}) \
             ORDER BY snapshot_id, clock_id"
        ))
        .context("Failed to read clock snapshots")
        .map_err(TraceError::query)?;

    let mut current = None;
    let mut real = None;
    let mut boot = None;
    for row in result.iter() {
        let snapshot = row.get_i64("snapshot_id");
        if snapshot != current {
            current = snapshot;
            real = None;
            boot = None;
        }
        match row.get_i64("clock_id") {
            Some(CLOCK_REALTIME) => real = row.get_i64("clock_value"),
            Some(CLOCK_BOOTTIME) => boot = row.get_i64("clock_value"),
            _ => {}
        }
        if let (Some(real), Some(boot)) = (real, boot) {
            tracing::debug!("Using clock snapshot {:?} for REALTIME offset", current);
            return Ok(Some(real.wrapping_sub(boot)));
        }
    }
    Ok(None)
}
