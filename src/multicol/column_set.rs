//! Column sets: stretches of flow content between spanners
//!
//! A column set covers a contiguous range of the flow thread and owns the
//! fragmentainer groups that lay that range out in columns. Everything a set
//! needs to know about its container (column count and width, gap, height
//! constraints, writing mode) arrives as a [`ColumnSetContext`] built by the
//! flow thread, so sets never hold a reference back to their owner.

use crate::geometry::{LayoutSize, Point, Rect};
use crate::style::{Direction, WritingMode};

use super::flow_thread::ColumnBoxId;
use super::fragmentainer_group::FragmentainerGroup;
use super::{ColumnHeightCalculation, EnclosingFragmentation, PageBoundaryRule};

/// Container-derived parameters for one column set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSetContext {
    pub used_column_count: u32,
    /// The column height is derived from content (balanced)
    pub height_is_auto: bool,
    /// Block size available per column; 0 when auto
    pub column_height_available: f32,
    pub max_column_logical_height: f32,
    /// Inline size of one column (the page width in the paged variant)
    pub column_logical_width: f32,
    pub column_gap: f32,
    /// Inline size of the whole set
    pub set_logical_width: f32,
    pub writing_mode: WritingMode,
    pub direction: Direction,
    pub progression_is_inline: bool,
    /// Block offset of the set from the multicol content box
    pub set_logical_top: f32,
    pub enclosing: Option<EnclosingFragmentation>,
}

impl ColumnSetContext {
    pub fn is_horizontal(&self) -> bool {
        self.writing_mode.is_horizontal()
    }

    pub fn is_left_to_right(&self) -> bool {
        self.direction == Direction::Ltr
    }
}

/// A run of columns holding the flow content between two spanners
#[derive(Debug, Clone)]
pub struct ColumnSet {
    id: ColumnBoxId,
    /// Never empty
    groups: Vec<FragmentainerGroup>,
    /// Block offset from the multicol content box
    logical_top: f32,
    initial_height_calculated: bool,
}

impl ColumnSet {
    pub fn new(id: ColumnBoxId) -> Self {
        Self {
            id,
            groups: vec![FragmentainerGroup::new()],
            logical_top: 0.0,
            initial_height_calculated: false,
        }
    }

    pub fn id(&self) -> ColumnBoxId {
        self.id
    }

    pub fn fragmentainer_groups(&self) -> &[FragmentainerGroup] {
        &self.groups
    }

    pub fn first_fragmentainer_group(&self) -> &FragmentainerGroup {
        &self.groups[0]
    }

    pub fn last_fragmentainer_group(&self) -> &FragmentainerGroup {
        &self.groups[self.groups.len() - 1]
    }

    pub fn logical_top(&self) -> f32 {
        self.logical_top
    }

    pub fn set_logical_top(&mut self, logical_top: f32) {
        self.logical_top = logical_top;
    }

    /// Block size of the set in the container: the sum of its rows
    pub fn logical_height(&self) -> f32 {
        self.groups.iter().map(FragmentainerGroup::logical_height).sum()
    }

    /// Physical offset of the set from the multicol content box
    pub fn location(&self, ctx: &ColumnSetContext) -> Point {
        if ctx.is_horizontal() {
            Point::new(0.0, self.logical_top)
        } else {
            Point::new(self.logical_top, 0.0)
        }
    }

    pub fn logical_top_in_flow_thread(&self) -> f32 {
        self.first_fragmentainer_group().logical_top_in_flow_thread()
    }

    pub fn logical_bottom_in_flow_thread(&self) -> f32 {
        self.last_fragmentainer_group().logical_bottom_in_flow_thread()
    }

    pub fn logical_height_in_flow_thread(&self) -> f32 {
        (self.logical_bottom_in_flow_thread() - self.logical_top_in_flow_thread()).max(0.0)
    }

    /// Whether `offset` lies in `[top, bottom)` of this set's flow range
    pub fn contains_flow_thread_offset(&self, offset: f32) -> bool {
        offset >= self.logical_top_in_flow_thread() && offset < self.logical_bottom_in_flow_thread()
    }

    pub fn is_initial_height_calculated(&self) -> bool {
        self.initial_height_calculated
    }

    /// Layout of this set's content starts at `offset`
    pub fn begin_flow(&mut self, offset: f32) {
        self.groups[0].set_logical_top_in_flow_thread(offset);
    }

    /// Layout of this set's content ended at `offset`
    pub fn end_flow(&mut self, offset: f32) {
        let last = self.groups.len() - 1;
        self.groups[last].set_logical_bottom_in_flow_thread(offset);
    }

    pub fn fragmentainer_group_index_at_flow_thread_offset(&self, offset: f32) -> usize {
        (1..self.groups.len())
            .find(|&index| self.groups[index].logical_top_in_flow_thread() > offset)
            .map_or(self.groups.len() - 1, |index| index - 1)
    }

    pub fn fragmentainer_group_at_flow_thread_offset(&self, offset: f32) -> &FragmentainerGroup {
        &self.groups[self.fragmentainer_group_index_at_flow_thread_offset(offset)]
    }

    fn fragmentainer_group_at_flow_thread_offset_mut(&mut self, offset: f32) -> &mut FragmentainerGroup {
        let index = self.fragmentainer_group_index_at_flow_thread_offset(offset);
        &mut self.groups[index]
    }

    /// Row under a point given relative to the set
    pub fn fragmentainer_group_index_at_visual_point(&self, point: Point, ctx: &ColumnSetContext) -> usize {
        let block_offset = if ctx.is_horizontal() { point.y } else { point.x };
        (1..self.groups.len())
            .find(|&index| self.groups[index].logical_top() > block_offset)
            .map_or(self.groups.len() - 1, |index| index - 1)
    }

    /// Prepare for a fresh layout pass. Extra rows from an earlier pass are dropped.
    pub fn reset_column_height(&mut self, ctx: &ColumnSetContext) -> bool {
        let had_extra_groups = self.groups.len() > 1;
        self.groups.truncate(1);
        self.initial_height_calculated = false;
        let changed = self.groups[0].reset_column_height(ctx);
        changed || had_extra_groups
    }

    /// Rebalance every row; `true` if any row changed height
    pub fn recalculate_column_height(&mut self, mode: ColumnHeightCalculation, ctx: &ColumnSetContext) -> bool {
        let mut changed = false;
        for group in &mut self.groups {
            changed |= group.recalculate_column_height(mode, ctx);
        }
        self.initial_height_calculated = true;
        changed
    }

    pub fn clear_content_runs(&mut self) {
        for group in &mut self.groups {
            group.clear_content_runs();
        }
    }

    /// Record an explicit break. Only balanced sets care.
    pub fn add_content_run(&mut self, end_offset: f32, ctx: &ColumnSetContext) {
        if !ctx.height_is_auto {
            return;
        }
        self.fragmentainer_group_at_flow_thread_offset_mut(end_offset)
            .add_content_run(end_offset, ctx);
    }

    pub fn record_space_shortage(&mut self, offset: f32, shortage: f32) {
        self.fragmentainer_group_at_flow_thread_offset_mut(offset)
            .record_space_shortage(shortage);
    }

    pub fn update_minimum_column_height(&mut self, offset: f32, height: f32) {
        self.fragmentainer_group_at_flow_thread_offset_mut(offset)
            .update_minimum_column_height(height);
    }

    /// Column height at `offset`; 0 while unknown
    pub fn page_logical_height_for_offset(&self, offset: f32) -> f32 {
        self.fragmentainer_group_at_flow_thread_offset(offset).column_height()
    }

    /// Space left in the column holding `offset`
    pub fn page_remaining_logical_height_for_offset(&self, offset: f32, rule: PageBoundaryRule) -> f32 {
        let group = self.fragmentainer_group_at_flow_thread_offset(offset);
        let page_logical_height = group.column_height();
        if page_logical_height <= 0.0 {
            return 0.0;
        }
        let page_logical_bottom = group.column_logical_top_for_offset(offset) + page_logical_height;
        let remaining = page_logical_bottom - offset;
        match rule {
            // An offset exactly on a boundary belongs to the former column,
            // which has nothing left.
            PageBoundaryRule::AssociateWithFormerPage => remaining.rem_euclid(page_logical_height),
            PageBoundaryRule::AssociateWithLatterPage => remaining,
        }
    }

    /// Whether the existing rows have a column for `offset`
    pub fn has_fragmentainer_group_for_column_at(&self, offset: f32, ctx: &ColumnSetContext) -> bool {
        let last = self.last_fragmentainer_group();
        if last.logical_top_in_flow_thread() > offset {
            return true;
        }
        offset - last.logical_top_in_flow_thread()
            < last.logical_height() * ctx.used_column_count as f32
    }

    /// Start a new row below the last one, taking over the flow thread where
    /// the last row's columns end
    pub fn append_new_fragmentainer_group(&mut self, ctx: &ColumnSetContext) -> &FragmentainerGroup {
        let mut group = FragmentainerGroup::new();
        let last = self.groups.len() - 1;
        {
            let previous = &mut self.groups[last];
            let block_offset_in_flow_thread = previous.logical_top_in_flow_thread()
                + previous.logical_height() * ctx.used_column_count as f32;
            previous.set_logical_bottom_in_flow_thread(block_offset_in_flow_thread);
            group.set_logical_top_in_flow_thread(block_offset_in_flow_thread);
            group.set_logical_bottom_in_flow_thread(block_offset_in_flow_thread);
            group.set_logical_top(previous.logical_top() + previous.logical_height());
        }
        group.reset_column_height(ctx);
        log::debug!(
            "Column set {} got fragmentainer group #{} at flow offset {}",
            self.id,
            self.groups.len(),
            group.logical_top_in_flow_thread()
        );
        self.groups.push(group);
        &self.groups[self.groups.len() - 1]
    }

    /// Total number of columns across all rows
    pub fn actual_column_count(&self) -> u32 {
        self.groups.iter().map(FragmentainerGroup::actual_column_count).sum()
    }

    /// Translation from flow thread coordinates to multicol container
    /// coordinates for content at `offset`
    pub fn flow_thread_translation_at_offset(&self, offset: f32, ctx: &ColumnSetContext) -> LayoutSize {
        let group = self.fragmentainer_group_at_flow_thread_offset(offset);
        let location = self.location(ctx);
        group.flow_thread_translation_at_offset(offset, ctx)
            + group.offset_from_column_set(ctx)
            + LayoutSize::new(location.x, location.y)
    }

    /// Map a point relative to the set into the flow thread
    pub fn visual_point_to_flow_thread_point(&self, point: Point, ctx: &ColumnSetContext) -> Point {
        let group = &self.groups[self.fragmentainer_group_index_at_visual_point(point, ctx)];
        group.visual_point_to_flow_thread_point(point - group.offset_from_column_set(ctx), ctx)
    }

    /// Physical boxes of every column, relative to the multicol content box
    pub fn column_rects(&self, ctx: &ColumnSetContext) -> Vec<Rect> {
        let location = self.location(ctx);
        let set_offset = LayoutSize::new(location.x, location.y);
        self.groups
            .iter()
            .flat_map(|group| {
                let offset = group.offset_from_column_set(ctx) + set_offset;
                (0..group.actual_column_count())
                    .map(move |index| group.column_rect_at(index, ctx).moved_by(offset))
            })
            .collect()
    }
}
