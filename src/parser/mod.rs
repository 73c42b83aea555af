//! Random-access parsers over input-event traces.
//!
//! A parser is built in two phases. Opening it scans the whole source once
//! and fixes the ordered timestamp list; [`Parser::entry`] then decodes
//! individual entries on demand and caches them. Every implementation
//! satisfies `timestamps()[i] == entry(i)?.timestamp`.

pub mod loader;
mod perfetto_proto;
mod trace_processor;

pub use loader::{spawn_parser, PendingParser};
pub use perfetto_proto::PerfettoProtoParser;
pub use trace_processor::TraceProcessorParser;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;

use crate::config::ParserConfig;
use crate::entry::Entry;
use crate::error::{Result, TraceError};
use crate::processor::TraceProcessor;
use crate::timestamp::{ClockKind, Timestamp, TimestampConverter};
use crate::trace_type::{CoarseVersion, TraceType};

/// Read access to one trace's entries.
pub trait Parser: Send + Sync {
    fn trace_type(&self) -> TraceType;

    fn coarse_version(&self) -> CoarseVersion;

    /// Entry timestamps in entry order.
    fn timestamps(&self) -> &[Timestamp];

    fn len(&self) -> usize {
        self.timestamps().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry at `index`, decoding it on first access.
    fn entry(&self, index: usize) -> Result<Arc<Entry>>;

    /// Records dropped while indexing because they could not be framed.
    fn skipped_records(&self) -> usize;

    /// Clock offset the parser resolved for this trace.
    fn timestamp_converter(&self) -> TimestampConverter;
}

/// Where a parser reads its records from.
#[derive(Clone)]
pub enum TraceSource {
    /// Raw Perfetto trace bytes, optionally gzip compressed.
    PerfettoProto(Arc<[u8]>),
    /// An ingested trace-processor dataset.
    TraceProcessor(Arc<dyn TraceProcessor>),
}

impl TraceSource {
    /// Load a Perfetto trace file into memory.
    pub fn read_perfetto(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(TraceSource::PerfettoProto(bytes.into()))
    }

    fn kind(&self) -> &'static str {
        match self {
            TraceSource::PerfettoProto(_) => "perfetto",
            TraceSource::TraceProcessor(_) => "trace processor",
        }
    }
}

impl std::fmt::Debug for TraceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceSource::PerfettoProto(bytes) => {
                write!(f, "PerfettoProto({} bytes)", bytes.len())
            }
            TraceSource::TraceProcessor(_) => write!(f, "TraceProcessor(..)"),
        }
    }
}

/// Build a ready parser for `trace_type` from `source`.
pub fn open_parser(
    source: TraceSource,
    trace_type: TraceType,
    config: &ParserConfig,
) -> Result<Arc<dyn Parser>> {
    tracing::debug!("Opening {} parser from {} source", trace_type, source.kind());
    let parser: Arc<dyn Parser> = match source {
        TraceSource::PerfettoProto(bytes) => {
            Arc::new(PerfettoProtoParser::open(bytes, trace_type, config)?)
        }
        TraceSource::TraceProcessor(tp) => {
            Arc::new(TraceProcessorParser::open(tp, trace_type, config)?)
        }
    };
    tracing::info!(
        "Indexed {} {} entries ({} records skipped)",
        parser.len(),
        trace_type,
        parser.skipped_records()
    );
    Ok(parser)
}

/// Decoded entries keyed by index.
///
/// Decoding runs outside the map's locks, so two threads may decode the same
/// index concurrently; the first insert wins and both observe equal entries.
#[derive(Debug, Default)]
pub(crate) struct EntryCache {
    entries: DashMap<usize, Arc<Entry>>,
}

impl EntryCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get_or_try_insert_with(
        &self,
        index: usize,
        decode: impl FnOnce() -> Result<Entry>,
    ) -> Result<Arc<Entry>> {
        if let Some(entry) = self.entries.get(&index) {
            return Ok(entry.value().clone());
        }
        let entry = Arc::new(decode()?);
        Ok(self.entries.entry(index).or_insert(entry).value().clone())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(TraceError::IndexOutOfRange { index, len });
    }
    Ok(())
}

/// Clock that reported timestamps use, given the resolved offset.
pub(crate) fn target_clock(config: &ParserConfig, converter: &TimestampConverter) -> ClockKind {
    if config.prefer_real_time && converter.has_real_offset() {
        ClockKind::Real
    } else {
        ClockKind::Elapsed
    }
}
