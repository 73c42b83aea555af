//! winscope-trace - random access to Android input traces as property trees.
//!
//! Parses input motion and key events captured by the Android input
//! dispatcher, either from a raw Perfetto trace or from a trace-processor
//! dataset, and exposes each event as an [`Entry`]: a timestamp plus a typed
//! [`PropertyTreeNode`] that also carries every window dispatch event of the
//! input event.
//!
//! # Modules
//!
//! - [`parser`] - Two-phase parsers and background loading
//! - [`decode`] - Protobuf and arg-set decoders, event merging
//! - [`schema`] - Message schemas and symbolic names for enum/flag fields
//! - [`tree`] - Property tree nodes, values and formatters
//! - [`processor`] - The trace-processor query seam and its SQLite backing
//! - [`timestamp`] - Clock-tagged timestamps and clock conversion
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use winscope_trace::{open_parser, ParserConfig, TraceSource, TraceType};
//!
//! let source = TraceSource::read_perfetto(Path::new("input.perfetto-trace"))?;
//! let parser = open_parser(source, TraceType::InputMotionEvent, &ParserConfig::default())?;
//! for index in 0..parser.len() {
//!     let entry = parser.entry(index)?;
//!     let action = entry.path("motionEvent.action").map(|n| n.formatted_value());
//!     println!("{} {:?}", entry.timestamp, action);
//! }
//! # Ok::<(), winscope_trace::TraceError>(())
//! ```

pub mod config;
pub mod decode;
pub mod entry;
pub mod error;
pub mod parser;
pub mod processor;
pub mod schema;
pub mod timestamp;
pub mod trace_type;
pub mod tree;

// Re-export for convenience
pub use config::ParserConfig;
pub use entry::Entry;
pub use error::{Result, TraceError};
pub use parser::{open_parser, spawn_parser, Parser, PendingParser, TraceSource};
pub use processor::{SqliteTraceProcessor, TraceProcessor};
pub use schema::SchemaRegistry;
pub use timestamp::{ClockKind, Timestamp, TimestampConverter};
pub use trace_type::{CoarseVersion, TraceType};
pub use tree::{Formatter, PropertyTreeNode, PropertyValue};
