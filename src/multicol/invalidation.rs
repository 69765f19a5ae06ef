//! Layout invalidation for column boxes
//!
//! Structural changes and height changes mark column boxes (or content
//! boxes) as needing layout. The flow thread records them here; the embedder
//! drains them into whatever layout scheduler it runs:
//! - Dirty targets: deduplicated set of boxes needing layout
//! - Pending invalidations: every mark in order, with its reason

use std::collections::{HashSet, VecDeque};

use indextree::NodeId;

use super::flow_thread::ColumnBoxId;

/// What needs layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidationTarget {
    /// The flow thread as a whole
    FlowThread,
    /// A column set or spanner placeholder
    ColumnBox(ColumnBoxId),
    /// A box in the content tree
    Content(NodeId),
}

/// Why it needs layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    /// Column boxes were created, destroyed or merged
    ColumnBoxesChanged,
    /// A column set changed its column height
    ColumnHeightChanged,
    /// A box became or stopped being a spanner
    SpannerChanged,
}

/// A single invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidation {
    pub target: InvalidationTarget,
    pub reason: InvalidationReason,
}

/// Receives invalidations from the flow thread
#[cfg_attr(test, mockall::automock)]
pub trait InvalidationSink {
    fn set_needs_layout(&mut self, invalidation: Invalidation);
}

impl InvalidationSink for Vec<Invalidation> {
    fn set_needs_layout(&mut self, invalidation: Invalidation) {
        self.push(invalidation);
    }
}

/// Dirty tracking for column boxes
#[derive(Debug, Default)]
pub struct InvalidationTracker {
    dirty: HashSet<InvalidationTarget>,
    pending: VecDeque<Invalidation>,
    /// The column box list changed since the last layout
    column_sets_invalidated: bool,
}

impl InvalidationTracker {
    pub fn new() -> Self {
        Self {
            dirty: HashSet::new(),
            pending: VecDeque::new(),
            column_sets_invalidated: false,
        }
    }

    /// Mark a target as needing layout
    pub fn mark(&mut self, target: InvalidationTarget, reason: InvalidationReason) {
        self.dirty.insert(target);
        self.pending.push_back(Invalidation { target, reason });
    }

    /// The column box list changed; the whole flow thread needs layout
    pub fn invalidate_column_sets(&mut self) {
        self.column_sets_invalidated = true;
        self.mark(
            InvalidationTarget::FlowThread,
            InvalidationReason::ColumnBoxesChanged,
        );
    }

    pub fn column_sets_invalidated(&self) -> bool {
        self.column_sets_invalidated
    }

    /// Acknowledge a column box list change once layout has seen it
    pub fn validate_column_sets(&mut self) {
        self.column_sets_invalidated = false;
    }

    pub fn is_dirty(&self, target: InvalidationTarget) -> bool {
        self.dirty.contains(&target)
    }

    pub fn has_dirty_targets(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn pending(&self) -> &VecDeque<Invalidation> {
        &self.pending
    }

    /// Hand every pending invalidation to `sink` and clear the dirty state.
    /// Returns how many were delivered.
    pub fn drain_into(&mut self, sink: &mut dyn InvalidationSink) -> usize {
        let count = self.pending.len();
        for invalidation in self.pending.drain(..) {
            sink.set_needs_layout(invalidation);
        }
        self.dirty.clear();
        count
    }

    pub fn clear(&mut self) {
        self.dirty.clear();
        self.pending.clear();
        self.column_sets_invalidated = false;
    }
}
