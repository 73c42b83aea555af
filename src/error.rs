//! Error types for trace parsing.
//!
//! Library entry points return [`TraceError`]. Seams that talk to external
//! collaborators (the trace-processor handle, file loading) use `anyhow` and
//! are folded into [`TraceError::Query`] at the parser boundary.

use thiserror::Error;

use crate::timestamp::ClockKind;

/// Errors surfaced by parsers, decoders, trees and timestamps.
#[derive(Error, Debug)]
pub enum TraceError {
    /// A single record does not match its schema framing.
    #[error("malformed record {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// The trace framing or header is corrupt; the whole parser is unusable.
    #[error("malformed trace: {0}")]
    MalformedTrace(String),

    /// An entry index outside `[0, len)`.
    #[error("entry index {index} out of range (trace has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    /// `value()` was called on a container node.
    #[error("property '{name}' is a container, not a terminal value")]
    NotATerminal { name: String },

    /// A child was pushed into a terminal node.
    #[error("property '{name}' is a terminal value, not a container")]
    NotAContainer { name: String },

    /// Timestamps from different clocks without a registered offset.
    #[error("cannot compare {left} timestamp with {right} timestamp without a clock offset")]
    IncomparableClocks { left: ClockKind, right: ClockKind },

    /// The trace source does not provide the requested trace type.
    #[error("trace type {0} is not supported by this source")]
    UnsupportedTraceType(String),

    /// The trace-processor handle failed to answer a query.
    #[error("trace processor query failed: {0}")]
    Query(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Background parser construction panicked before producing a result.
    #[error("parser construction thread panicked")]
    LoaderPanicked,
}

impl TraceError {
    /// Build a [`TraceError::Query`] from an `anyhow` chain, keeping all context.
    pub fn query(err: anyhow::Error) -> Self {
        TraceError::Query(format!("{err:#}"))
    }

    /// Returns true for errors that only affect a single record.
    #[must_use]
    pub fn is_record_local(&self) -> bool {
        matches!(self, TraceError::MalformedRecord { .. })
    }
}

pub type Result<T, E = TraceError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_keeps_context_chain() {
        let err = anyhow::anyhow!("no such table: args").context("Failed to read arg set 3");
        let err = TraceError::query(err);
        let message = err.to_string();
        assert!(message.contains("Failed to read arg set 3"));
        assert!(message.contains("no such table: args"));
    }

    #[test]
    fn test_record_local_errors() {
        let malformed = TraceError::MalformedRecord {
            index: 2,
            reason: "truncated varint".to_string(),
        };
        assert!(malformed.is_record_local());
        assert!(!TraceError::MalformedTrace("bad header".to_string()).is_record_local());
    }

    #[test]
    fn test_index_out_of_range_display() {
        let err = TraceError::IndexOutOfRange { index: 4, len: 4 };
        assert_eq!(
            err.to_string(),
            "entry index 4 out of range (trace has 4 entries)"
        );
    }
}
