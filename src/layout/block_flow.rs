//! Block flow layout of multicol content
//!
//! A deliberately simple block layouter: blocks stack in the block
//! direction, text contributes whole lines, monolithic boxes are
//! unbreakable. It lays content out into the flow thread and reports every
//! fragmentation event through the flow thread's hooks, which is all the
//! balancing machinery needs.

use indextree::NodeId;

use crate::multicol::{FlowContentLayouter, FlowThread, PageBoundaryRule};
use crate::tree::{BoxTree, NodeKind};
use crate::utils::error::Result;

/// Default line metrics for text without an explicit line height
#[derive(Debug, Clone, Copy)]
pub struct LineMetrics {
    /// Font size in pixels
    pub size: f32,
    /// Line height multiplier
    pub line_height: f32,
}

impl LineMetrics {
    /// Block size of one line box
    pub fn line_box_height(&self) -> f32 {
        self.size * self.line_height
    }
}

impl Default for LineMetrics {
    fn default() -> Self {
        Self {
            size: 16.0,
            line_height: 1.2,
        }
    }
}

/// Where a box ended up in the flow thread during the last pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub node: NodeId,
    pub logical_top: f32,
    pub logical_height: f32,
}

/// Lays out block flow content into a flow thread
#[derive(Debug, Default)]
pub struct BlockFlowLayouter {
    metrics: LineMetrics,
    placements: Vec<Placement>,
}

impl BlockFlowLayouter {
    /// Create a new block flow layouter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set line metrics
    pub fn set_line_metrics(&mut self, metrics: LineMetrics) {
        self.metrics = metrics;
    }

    /// Boxes placed in the last pass
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Flow thread offset of `node` in the last pass
    pub fn placement_of(&self, node: NodeId) -> Option<&Placement> {
        self.placements.iter().find(|placement| placement.node == node)
    }

    /// Block size of a subtree laid out without any fragmentation
    pub fn intrinsic_block_size(&self, tree: &BoxTree, node: NodeId) -> f32 {
        let style = tree.style(node);
        if !style.display.generates_box() || style.is_out_of_flow() {
            return 0.0;
        }
        if let NodeKind::Text { lines, line_height } = tree.node(node).kind {
            return lines as f32 * self.text_line_height(line_height);
        }
        let children: f32 = tree
            .children(node)
            .map(|child| self.intrinsic_block_size(tree, child))
            .sum();
        style.block_size.map_or(children, |size| size.max(children))
    }

    fn text_line_height(&self, line_height: f32) -> f32 {
        if line_height > 0.0 {
            line_height
        } else {
            self.metrics.line_box_height()
        }
    }

    /// Lay out `node` starting at flow thread `offset`; returns the offset
    /// after it
    fn layout_box(&mut self, tree: &BoxTree, flow_thread: &mut FlowThread, node: NodeId, offset: f32) -> Result<f32> {
        let style = tree.style(node);
        if !style.display.generates_box() || style.is_out_of_flow() {
            return Ok(offset);
        }

        if flow_thread.spanner_placeholder(node).is_some() {
            // Spanners take no room in the flow thread; they split it.
            let block_size = self.intrinsic_block_size(tree, node);
            flow_thread.skip_column_spanner(node, offset, block_size)?;
            self.placements.push(Placement {
                node,
                logical_top: offset,
                logical_height: 0.0,
            });
            return Ok(offset);
        }

        if let NodeKind::Text { lines, line_height } = tree.node(node).kind {
            let line_height = self.text_line_height(line_height);
            let mut line_offset = offset;
            let mut first_line_top = None;
            for _ in 0..lines {
                let line_top = self.place_unbreakable(flow_thread, line_offset, line_height);
                first_line_top.get_or_insert(line_top);
                line_offset = line_top + line_height;
            }
            let top = first_line_top.unwrap_or(offset);
            self.placements.push(Placement {
                node,
                logical_top: top,
                logical_height: line_offset - top,
            });
            return Ok(line_offset);
        }

        let mut offset = offset;
        if style.break_before.is_forced() {
            offset = self.force_break(flow_thread, offset);
        }

        let has_children = tree.first_child(node).is_some();
        let (top, bottom) = if style.monolithic || (!has_children && style.block_size.is_some()) {
            let size = self.intrinsic_block_size(tree, node);
            let top = self.place_unbreakable(flow_thread, offset, size);
            (top, top + size)
        } else {
            let top = offset;
            let mut child_offset = offset;
            let children: Vec<NodeId> = tree.children(node).collect();
            for child in children {
                child_offset = self.layout_box(tree, flow_thread, child, child_offset)?;
            }
            let bottom = style
                .block_size
                .map_or(child_offset, |size| child_offset.max(top + size));
            (top, bottom)
        };
        self.placements.push(Placement {
            node,
            logical_top: top,
            logical_height: bottom - top,
        });

        let mut offset = bottom;
        if style.break_after.is_forced() {
            offset = self.force_break(flow_thread, offset);
        }
        Ok(offset)
    }

    /// Move `offset` to the start of the next column
    fn force_break(&mut self, flow_thread: &mut FlowThread, offset: f32) -> f32 {
        if flow_thread.is_at_column_set_start(offset) {
            // Nothing before it in this set to break away from.
            return offset;
        }
        match flow_thread.add_forced_column_break(offset) {
            Some(adjustment) => offset + adjustment,
            None => offset,
        }
    }

    /// Place an unbreakable piece of content of block size `size` at or
    /// after `offset`. Returns where it starts.
    fn place_unbreakable(&mut self, flow_thread: &mut FlowThread, offset: f32, size: f32) -> f32 {
        flow_thread.append_new_fragmentainer_group_if_needed(offset);
        flow_thread.update_minimum_page_height(offset, size);

        let page_logical_height = flow_thread.page_logical_height_for_offset(offset);
        if page_logical_height <= 0.0 {
            return offset;
        }
        let remaining = flow_thread.page_remaining_logical_height_for_offset(
            offset,
            PageBoundaryRule::AssociateWithLatterPage,
        );
        if size <= remaining {
            return offset;
        }
        flow_thread.set_page_break(offset, size - remaining);
        if remaining < page_logical_height {
            // Push to the top of the next column.
            offset + remaining
        } else {
            // Taller than a whole column; it has to overflow.
            offset
        }
    }
}

impl FlowContentLayouter for BlockFlowLayouter {
    fn layout_flow_content(&mut self, tree: &BoxTree, flow_thread: &mut FlowThread) -> Result<f32> {
        self.placements.clear();
        let mut offset = 0.0;
        let children: Vec<NodeId> = tree.children(flow_thread.root()).collect();
        for child in children {
            offset = self.layout_box(tree, flow_thread, child, offset)?;
        }
        log::trace!(
            "Laid out {} boxes, flow height {}",
            self.placements.len(),
            offset
        );
        Ok(offset)
    }
}
