//! Multi-column fragmentation
//!
//! A multicol container's in-flow content forms a single flow thread: one
//! tall strip, laid out once per pass, then sliced into columns. The flow
//! thread keeps an ordered list of column boxes alongside the content:
//!
//! - **Column sets** hold consecutive stretches of content with no spanner
//!   in between, and own the fragmentainer groups (rows of columns) that
//!   carry the balancing state.
//! - **Spanner placeholders** stand in for `column-span: all` boxes, which
//!   interrupt the columns and take the full width of the container.
//!
//! Structural reconciliation keeps that list in step with the box tree as
//! content is inserted, removed or restyled. The balancing driver runs
//! layout passes until every column set settles on a height.

pub mod column_set;
pub mod content_run;
pub mod driver;
pub mod flow_thread;
pub mod fragmentainer_group;
pub mod invalidation;
pub mod paged;
pub mod reconcile;
pub mod spanner_placeholder;

pub use column_set::{ColumnSet, ColumnSetContext};
pub use content_run::{ContentRun, ContentRuns};
pub use driver::{BalanceConfig, BalanceStats, FlowContentLayouter, LayoutOutcome, MulticolLayout};
pub use flow_thread::{ColumnBox, ColumnBoxId, ColumnBoxKind, FlowThread, FlowThreadConfig};
pub use fragmentainer_group::FragmentainerGroup;
pub use invalidation::{Invalidation, InvalidationReason, InvalidationSink, InvalidationTarget, InvalidationTracker};
pub use reconcile::PendingStyleChange;
pub use spanner_placeholder::SpannerPlaceholder;

/// How a column height is derived after a layout pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnHeightCalculation {
    /// Initial balancing: spread the content evenly, honouring forced breaks
    GuessFromFlowThreadPortion,
    /// Later passes: grow by the smallest space shortage seen during layout
    StretchBySpaceShortage,
}

/// Whether offsets past the end of a group count as new columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnIndexMode {
    ClampToExistingColumns,
    AssumeNewColumns,
}

/// Which fragmentainer an offset exactly on a boundary belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageBoundaryRule {
    AssociateWithFormerPage,
    AssociateWithLatterPage,
}

/// Direction in which columns (or pages) advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnProgression {
    /// Side by side along the inline axis
    #[default]
    Inline,
    /// Stacked along the block axis
    Block,
}

/// The fragmentation context a multicol container is itself nested in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnclosingFragmentation {
    /// Block size of each outer fragmentainer; 0 while unknown
    pub fragmentainer_block_size: f32,
    /// Offset of the multicol content box from the start of the first outer
    /// fragmentainer
    pub block_offset: f32,
}

impl EnclosingFragmentation {
    pub fn new(fragmentainer_block_size: f32, block_offset: f32) -> Self {
        Self {
            fragmentainer_block_size,
            block_offset,
        }
    }

    pub fn is_fragmentainer_logical_height_known(&self) -> bool {
        self.fragmentainer_block_size > 0.0
    }

    /// Space left in the outer fragmentainer at a block offset from the
    /// multicol content box. A boundary starts a fresh fragmentainer.
    pub fn remaining_logical_height_at(&self, offset: f32) -> f32 {
        if !self.is_fragmentainer_logical_height_known() {
            return f32::INFINITY;
        }
        let size = self.fragmentainer_block_size;
        size - (self.block_offset + offset).rem_euclid(size)
    }
}
