//! Stand-in for a `column-span: all` box in the column box list

use indextree::NodeId;

use super::flow_thread::ColumnBoxId;

/// Marks where a spanner interrupts the columns.
///
/// Holds no columns of its own. The container stacks it between the column
/// sets around it, sized by the spanner's block size.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannerPlaceholder {
    id: ColumnBoxId,
    spanner: NodeId,
    logical_top: f32,
    block_size: f32,
}

impl SpannerPlaceholder {
    pub fn new(id: ColumnBoxId, spanner: NodeId) -> Self {
        Self {
            id,
            spanner,
            logical_top: 0.0,
            block_size: 0.0,
        }
    }

    pub fn id(&self) -> ColumnBoxId {
        self.id
    }

    /// The spanning box this placeholder represents
    pub fn spanner(&self) -> NodeId {
        self.spanner
    }

    /// Block offset from the multicol content box
    pub fn logical_top(&self) -> f32 {
        self.logical_top
    }

    pub fn set_logical_top(&mut self, logical_top: f32) {
        self.logical_top = logical_top;
    }

    /// Block size of the spanner, as last reported by layout
    pub fn logical_height(&self) -> f32 {
        self.block_size
    }

    pub fn set_logical_height(&mut self, block_size: f32) {
        self.block_size = block_size.max(0.0);
    }
}
