//! Addressable trace entries.

use crate::timestamp::Timestamp;
use crate::trace_type::TraceType;
use crate::tree::PropertyTreeNode;

/// One decoded record of a trace: a timestamp paired with its property tree.
///
/// Entries are immutable; parsers hand them out behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub trace_type: TraceType,
    pub index: usize,
    pub timestamp: Timestamp,
    /// Display identifier, e.g. `AndroidMotionEvent entry`.
    pub id: String,
    pub tree: PropertyTreeNode,
}

impl Entry {
    pub fn new(
        trace_type: TraceType,
        index: usize,
        timestamp: Timestamp,
        tree: PropertyTreeNode,
    ) -> Self {
        let id = entry_id(trace_type);
        Self {
            trace_type,
            index,
            timestamp,
            tree: tree.renamed(id.clone()),
            id,
        }
    }

    /// Shorthand for `self.tree.child_by_name(name)`.
    pub fn child_by_name(&self, name: &str) -> Option<&PropertyTreeNode> {
        self.tree.child_by_name(name)
    }

    /// Shorthand for `self.tree.path(path)`.
    pub fn path(&self, path: &str) -> Option<&PropertyTreeNode> {
        self.tree.path(path)
    }
}

/// Identifier shared by every entry of a trace type.
pub fn entry_id(trace_type: TraceType) -> String {
    format!("{} entry", trace_type.message_name())
}
