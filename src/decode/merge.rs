//! Folding dependent records into their primary entry.
//!
//! Window dispatch events reference the input event they deliver through the
//! event id. They never become entries themselves; instead every primary
//! entry carries all of its dispatch events, in source order, under
//! `windowDispatchEvents`.

use std::collections::HashMap;

use crate::schema::android_input::WINDOW_DISPATCH_EVENTS;
use crate::trace_type::TraceType;
use crate::tree::PropertyTreeNode;

/// Build an entry root `{ <primary field>: primary, windowDispatchEvents: [...] }`.
///
/// `dependents` keep the order they are given in. An empty list still
/// produces an (empty) container.
pub fn merge_entry(
    trace_type: TraceType,
    primary: PropertyTreeNode,
    dependents: Vec<PropertyTreeNode>,
) -> PropertyTreeNode {
    PropertyTreeNode::object(
        "",
        vec![
            primary.renamed(trace_type.primary_field()),
            PropertyTreeNode::array(WINDOW_DISPATCH_EVENTS, dependents),
        ],
    )
}

/// Dependents grouped by the event id they reference, in arrival order.
#[derive(Debug, Clone)]
pub struct DependentIndex<T> {
    by_event: HashMap<u64, Vec<T>>,
}

impl<T> Default for DependentIndex<T> {
    fn default() -> Self {
        Self {
            by_event: HashMap::new(),
        }
    }
}

impl<T> DependentIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_id: u64, dependent: T) {
        self.by_event.entry(event_id).or_default().push(dependent);
    }

    /// Dependents of `event_id`, or an empty slice.
    pub fn get(&self, event_id: u64) -> &[T] {
        self.by_event
            .get(&event_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of dependents held.
    pub fn len(&self) -> usize {
        self.by_event.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_event.is_empty()
    }
}
