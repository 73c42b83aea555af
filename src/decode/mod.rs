//! Format-specific decoders.
//!
//! Each supported wire format has one [`RecordDecoder`] implementation that
//! turns a logical record (a primary message plus the dependent messages that
//! reference it) into the entry's [`PropertyTreeNode`]:
//!
//! - [`ProtoDecoder`]: serialized protobuf messages from a Perfetto trace
//! - [`ArgsDecoder`]: flattened arg sets from a trace-processor dataset
//!
//! Both apply the same [`MessageSchema`](crate::schema::MessageSchema) so the
//! resulting trees are indistinguishable.

pub mod args;
pub mod merge;
pub mod proto;
pub mod wire;

use thiserror::Error;

use crate::schema::WireType;
use crate::trace_type::TraceType;
use crate::tree::PropertyTreeNode;

pub use args::{Arg, ArgSet, ArgValue, ArgsDecoder, ArgsRecord};
pub use merge::{merge_entry, DependentIndex};
pub use proto::{decode_message, ProtoDecoder, ProtoRecord};
pub use wire::{WireError, WireReader, WireValue};

/// Why a single record could not be decoded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("field '{field}': expected {expected:?} encoding, found {found:?}")]
    WireTypeMismatch {
        field: String,
        expected: WireType,
        found: WireType,
    },

    #[error("field '{field}': invalid UTF-8")]
    InvalidUtf8 { field: String },

    #[error("arg '{key}': expected {expected}")]
    ArgTypeMismatch { key: String, expected: &'static str },

    #[error("malformed arg key '{0}'")]
    InvalidArgKey(String),

    #[error("record range {start}..{end} outside trace buffer of {len} bytes")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

/// Capability shared by every wire-format decoder.
pub trait RecordDecoder: Send + Sync {
    /// One logical record in this decoder's wire format.
    type Record;

    fn trace_type(&self) -> TraceType;

    /// Decode `record` into the entry's root tree. Pure: the same record
    /// always yields an equal tree.
    fn decode(&self, record: &Self::Record) -> Result<PropertyTreeNode, DecodeError>;
}
