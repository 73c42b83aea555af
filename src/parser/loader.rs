//! Background parser construction.
//!
//! Indexing a large trace takes a full pass over it. [`spawn_parser`] runs
//! that pass on its own thread so callers can keep working; the parser only
//! becomes visible through [`PendingParser::wait`] once it is complete.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::config::ParserConfig;
use crate::error::{Result, TraceError};
use crate::trace_type::TraceType;

use super::{open_parser, Parser, TraceSource};

/// Handle to a parser being built on a background thread.
///
/// Dropping the handle detaches the thread; its result is discarded.
#[derive(Debug)]
pub struct PendingParser {
    trace_type: TraceType,
    handle: JoinHandle<Result<Arc<dyn Parser>>>,
}

impl PendingParser {
    pub fn trace_type(&self) -> TraceType {
        self.trace_type
    }

    /// True once construction has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the parser is ready.
    pub fn wait(self) -> Result<Arc<dyn Parser>> {
        self.handle.join().map_err(|_| TraceError::LoaderPanicked)?
    }
}

/// Start building a parser for `trace_type` from `source` in the background.
pub fn spawn_parser(
    source: TraceSource,
    trace_type: TraceType,
    config: ParserConfig,
) -> Result<PendingParser> {
    let handle = thread::Builder::new()
        .name(format!("load-{trace_type}").to_lowercase())
        .spawn(move || {
            let start = Instant::now();
            let parser = open_parser(source, trace_type, &config);
            match &parser {
                Ok(parser) => tracing::debug!(
                    "Loaded {} entries of {} in {:?}",
                    parser.len(),
                    trace_type,
                    start.elapsed()
                ),
                Err(e) => tracing::warn!("Failed to load {} trace: {}", trace_type, e),
            }
            parser
        })?;
    Ok(PendingParser { trace_type, handle })
}
