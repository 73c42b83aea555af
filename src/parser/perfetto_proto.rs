//! Parser over raw Perfetto trace bytes.
//!
//! The trace is a stream of `TracePacket`s (field 1 of `Trace`). Input events
//! travel inside `winscope_extensions.android_input_event`; packet metadata
//! (timestamp, clock id, clock snapshots) is read with `perfetto_protos`,
//! while event payloads are only located here and decoded lazily by the
//! schema-driven [`ProtoDecoder`].

use std::io::Read;
use std::ops::Range;
use std::sync::Arc;

use flate2::read::GzDecoder;
use perfetto_protos::builtin_clock::BuiltinClock;
use perfetto_protos::trace_packet::TracePacket;
use protobuf::Message;

use crate::config::ParserConfig;
use crate::decode::wire::{find_field, WireReader, WireValue};
use crate::decode::{DependentIndex, ProtoDecoder, ProtoRecord, RecordDecoder};
use crate::entry::Entry;
use crate::error::{Result, TraceError};
use crate::schema::SchemaRegistry;
use crate::timestamp::{ClockKind, Timestamp, TimestampConverter};
use crate::trace_type::{CoarseVersion, TraceType};

use super::{check_index, target_clock, EntryCache, Parser};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// `Trace.packet`
const TRACE_PACKET_FIELD: u32 = 1;
/// `TracePacket.winscope_extensions`
const WINSCOPE_EXTENSIONS_FIELD: u32 = 112;
/// `WinscopeExtensions.android_input_event`
const ANDROID_INPUT_EVENT_FIELD: u32 = 5;
/// `AndroidWindowInputDispatchEvent.event_id` and the primaries' `event_id`.
const EVENT_ID_FIELD: u32 = 1;

const BUILTIN_CLOCK_REALTIME: u32 = BuiltinClock::BUILTIN_CLOCK_REALTIME as u32;
const BUILTIN_CLOCK_BOOTTIME: u32 = BuiltinClock::BUILTIN_CLOCK_BOOTTIME as u32;

/// Which member of the `AndroidInputEvent` oneof a packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputEventKind {
    Motion,
    Key,
    WindowDispatch,
}

impl InputEventKind {
    /// Redacted variants share the layout of their full counterparts.
    fn from_field(number: u32) -> Option<Self> {
        match number {
            1 | 2 => Some(InputEventKind::Motion),
            3 | 4 => Some(InputEventKind::Key),
            5 | 6 => Some(InputEventKind::WindowDispatch),
            _ => None,
        }
    }

    fn primary_for(trace_type: TraceType) -> Self {
        match trace_type {
            TraceType::InputMotionEvent => InputEventKind::Motion,
            TraceType::InputKeyEvent => InputEventKind::Key,
        }
    }
}

/// What one packet contributes to the index.
#[derive(Debug, Default)]
struct ScannedPacket {
    timestamp: Option<Timestamp>,
    /// `REALTIME - BOOTTIME` from a clock snapshot in this packet.
    clock_offset_ns: Option<i64>,
    event: Option<(InputEventKind, Range<usize>, Option<u64>)>,
}

#[derive(Debug, Clone)]
struct IndexedEvent {
    packet_index: usize,
    timestamp: Timestamp,
    payload: Range<usize>,
    event_id: Option<u64>,
}

/// Random access to the input events of one Perfetto trace.
pub struct PerfettoProtoParser {
    trace_type: TraceType,
    decoder: ProtoDecoder,
    buf: Arc<[u8]>,
    records: Vec<ProtoRecord>,
    timestamps: Vec<Timestamp>,
    converter: TimestampConverter,
    skipped: usize,
    cache: EntryCache,
}

impl PerfettoProtoParser {
    /// Scan `bytes` and index every event of `trace_type`.
    pub fn open(bytes: Arc<[u8]>, trace_type: TraceType, config: &ParserConfig) -> Result<Self> {
        Self::open_with_schemas(bytes, trace_type, config, SchemaRegistry::default())
    }

    pub fn open_with_schemas(
        bytes: Arc<[u8]>,
        trace_type: TraceType,
        config: &ParserConfig,
        schemas: SchemaRegistry,
    ) -> Result<Self> {
        let buf = inflate(bytes)?;
        let primary_kind = InputEventKind::primary_for(trace_type);

        let mut primaries = Vec::new();
        let mut dependents = DependentIndex::new();
        let mut snapshot_offset = None;
        let mut skipped = 0;

        for (packet_index, field) in WireReader::new(&buf).enumerate() {
            let field = field
                .map_err(|e| TraceError::MalformedTrace(format!("packet framing: {e}")))?;
            if field.number != TRACE_PACKET_FIELD {
                continue;
            }
            let WireValue::Bytes(packet) = field.value else {
                return Err(TraceError::MalformedTrace(format!(
                    "packet {packet_index} is not length-delimited"
                )));
            };

            let scanned = match scan_packet(&buf, packet) {
                Ok(scanned) => scanned,
                Err(reason) if config.skip_malformed_records => {
                    tracing::warn!("Skipping malformed packet {packet_index}: {reason}");
                    skipped += 1;
                    continue;
                }
                Err(reason) => {
                    return Err(TraceError::MalformedRecord {
                        index: packet_index,
                        reason,
                    })
                }
            };

            if snapshot_offset.is_none() {
                snapshot_offset = scanned.clock_offset_ns;
            }
            let Some((kind, payload, event_id)) = scanned.event else {
                continue;
            };
            match (kind, scanned.timestamp, event_id) {
                (InputEventKind::WindowDispatch, _, Some(event_id)) => {
                    dependents.push(event_id, payload);
                }
                (InputEventKind::WindowDispatch, _, None) => {
                    tracing::warn!("Dropping window dispatch event without event id in packet {packet_index}");
                    skipped += 1;
                }
                (kind, Some(timestamp), event_id) if kind == primary_kind => {
                    primaries.push(IndexedEvent {
                        packet_index,
                        timestamp,
                        payload,
                        event_id,
                    });
                }
                (kind, None, _) if kind == primary_kind => {
                    tracing::warn!("Skipping input event without timestamp in packet {packet_index}");
                    skipped += 1;
                }
                _ => {}
            }
        }

        let converter =
            TimestampConverter::new(config.real_to_elapsed_offset_ns.or(snapshot_offset));
        let target = target_clock(config, &converter);
        let mut primaries = {
            let mut on_target = Vec::with_capacity(primaries.len());
            for mut event in primaries {
                match converter.convert(event.timestamp, target) {
                    Ok(timestamp) => {
                        event.timestamp = timestamp;
                        on_target.push(event);
                    }
                    Err(err) if config.skip_malformed_records => {
                        tracing::warn!(
                            "Skipping input event in packet {}: {err}",
                            event.packet_index
                        );
                        skipped += 1;
                    }
                    Err(err) => return Err(err),
                }
            }
            on_target
        };
        // every timestamp is on `target` now, so raw values are comparable
        primaries.sort_by_key(|event| event.timestamp.value_ns());

        let mut claimed = 0;
        let (timestamps, records): (Vec<_>, Vec<_>) = primaries
            .into_iter()
            .map(|event| {
                let deps = event
                    .event_id
                    .map(|id| dependents.get(id).to_vec())
                    .unwrap_or_default();
                claimed += deps.len();
                let record = ProtoRecord {
                    buf: buf.clone(),
                    primary: event.payload,
                    dependents: deps,
                };
                (event.timestamp, record)
            })
            .unzip();
        if claimed < dependents.len() {
            tracing::debug!(
                "{} window dispatch events reference no indexed {} entry",
                dependents.len() - claimed,
                trace_type
            );
        }

        Ok(Self {
            trace_type,
            decoder: ProtoDecoder::new(trace_type, schemas),
            buf,
            records,
            timestamps,
            converter,
            skipped,
            cache: EntryCache::new(),
        })
    }

    /// Size in bytes of the (inflated) trace being served.
    pub fn trace_size(&self) -> usize {
        self.buf.len()
    }
}

impl Parser for PerfettoProtoParser {
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
        check_index(index, self.records.len())?;
        self.cache.get_or_try_insert_with(index, || {
            let tree = self
                .decoder
                .decode(&self.records[index])
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

/// Inflate gzip input; anything else is served as is.
fn inflate(bytes: Arc<[u8]>) -> Result<Arc<[u8]>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }
    let mut out = Vec::new();
    GzDecoder::new(&bytes[..]).read_to_end(&mut out)?;
    tracing::debug!("Inflated gzip trace from {} to {} bytes", bytes.len(), out.len());
    Ok(out.into())
}

fn scan_packet(buf: &[u8], packet: &[u8]) -> std::result::Result<ScannedPacket, String> {
    let parsed = TracePacket::parse_from_bytes(packet).map_err(|e| e.to_string())?;

    let timestamp = if parsed.has_timestamp() {
        let kind = if parsed.timestamp_clock_id() == BUILTIN_CLOCK_REALTIME {
            ClockKind::Real
        } else {
            ClockKind::Elapsed
        };
        Some(Timestamp::new(kind, clock_ns(parsed.timestamp())?))
    } else {
        None
    };

    let clock_offset_ns = if parsed.has_clock_snapshot() {
        let clocks = &parsed.clock_snapshot().clocks;
        let find = |id: u32| {
            clocks
                .iter()
                .find(|c| c.clock_id() == id && c.has_timestamp())
                .map(|c| clock_ns(c.timestamp()))
                .transpose()
        };
        match (find(BUILTIN_CLOCK_REALTIME)?, find(BUILTIN_CLOCK_BOOTTIME)?) {
            (Some(real), Some(boot)) => Some(real.wrapping_sub(boot)),
            _ => None,
        }
    } else {
        None
    };

    Ok(ScannedPacket {
        timestamp,
        clock_offset_ns,
        event: locate_input_event(buf, packet)?,
    })
}

/// Clock values are unsigned on the wire; anything past `i64::MAX` is corrupt.
fn clock_ns(value: u64) -> std::result::Result<i64, String> {
    i64::try_from(value).map_err(|_| format!("clock value {value} overflows i64 nanoseconds"))
}

/// Find the input event payload of a packet and its absolute range in `buf`.
fn locate_input_event(
    buf: &[u8],
    packet: &[u8],
) -> std::result::Result<Option<(InputEventKind, Range<usize>, Option<u64>)>, String> {
    let Some(WireValue::Bytes(extensions)) =
        find_field(packet, WINSCOPE_EXTENSIONS_FIELD).map_err(|e| e.to_string())?
    else {
        return Ok(None);
    };
    let Some(WireValue::Bytes(input_event)) =
        find_field(extensions, ANDROID_INPUT_EVENT_FIELD).map_err(|e| e.to_string())?
    else {
        return Ok(None);
    };

    let mut found = None;
    for field in WireReader::new(input_event) {
        let field = field.map_err(|e| e.to_string())?;
        if let (Some(kind), WireValue::Bytes(payload)) =
            (InputEventKind::from_field(field.number), field.value)
        {
            found = Some((kind, payload));
        }
    }
    let Some((kind, payload)) = found else {
        return Ok(None);
    };

    let event_id = find_field(payload, EVENT_ID_FIELD)
        .map_err(|e| format!("input event payload: {e}"))?
        .and_then(|v| v.as_u64());
    Ok(Some((kind, range_within(buf, payload), event_id)))
}

/// Byte range that `inner` occupies inside `outer`.
fn range_within(outer: &[u8], inner: &[u8]) -> Range<usize> {
    let start = inner.as_ptr() as usize - outer.as_ptr() as usize;
    start..start + inner.len()
}
