//! Fragmentainer groups: one row of columns
//!
//! A group owns a contiguous slice of the flow thread and the height of its
//! columns. Column sets normally have a single group; a set gets more groups
//! when the multicol container is itself fragmented by an outer
//! fragmentation context, one group per outer fragmentainer.
//!
//! Balancing happens here. The first pass of a balanced layout guesses a
//! height from the content runs collected during layout
//! ([`ColumnHeightCalculation::GuessFromFlowThreadPortion`]); later passes
//! stretch the height by the smallest space shortage reported by the content
//! layouter until the content fits in the used column count
//! ([`ColumnHeightCalculation::StretchBySpaceShortage`]).

use crate::geometry::{LayoutSize, Point, Rect};

use super::column_set::ColumnSetContext;
use super::content_run::ContentRuns;
use super::{ColumnHeightCalculation, ColumnIndexMode};

/// A row of columns within a column set
#[derive(Debug, Clone)]
pub struct FragmentainerGroup {
    /// Block offset from the top of the column set
    logical_top: f32,
    logical_top_in_flow_thread: f32,
    logical_bottom_in_flow_thread: f32,
    column_height: f32,
    max_column_height: f32,
    /// Smallest amount of space any piece of content lacked in this pass
    min_space_shortage: f32,
    /// Tallest unbreakable piece of content seen in this pass
    minimum_column_height: f32,
    content_runs: ContentRuns,
}

impl FragmentainerGroup {
    pub fn new() -> Self {
        Self {
            logical_top: 0.0,
            logical_top_in_flow_thread: 0.0,
            logical_bottom_in_flow_thread: 0.0,
            column_height: 0.0,
            max_column_height: f32::INFINITY,
            min_space_shortage: f32::INFINITY,
            minimum_column_height: 0.0,
            content_runs: ContentRuns::new(),
        }
    }

    pub fn logical_top(&self) -> f32 {
        self.logical_top
    }

    pub fn set_logical_top(&mut self, logical_top: f32) {
        self.logical_top = logical_top;
    }

    /// Block size of the group in the column set
    pub fn logical_height(&self) -> f32 {
        self.column_height
    }

    pub fn logical_top_in_flow_thread(&self) -> f32 {
        self.logical_top_in_flow_thread
    }

    pub fn set_logical_top_in_flow_thread(&mut self, offset: f32) {
        self.logical_top_in_flow_thread = offset;
    }

    pub fn logical_bottom_in_flow_thread(&self) -> f32 {
        self.logical_bottom_in_flow_thread
    }

    pub fn set_logical_bottom_in_flow_thread(&mut self, offset: f32) {
        self.logical_bottom_in_flow_thread = offset;
    }

    pub fn logical_height_in_flow_thread(&self) -> f32 {
        (self.logical_bottom_in_flow_thread - self.logical_top_in_flow_thread).max(0.0)
    }

    pub fn column_height(&self) -> f32 {
        self.column_height
    }

    pub fn max_column_height(&self) -> f32 {
        self.max_column_height
    }

    pub fn min_space_shortage(&self) -> f32 {
        self.min_space_shortage
    }

    pub fn minimum_column_height(&self) -> f32 {
        self.minimum_column_height
    }

    pub fn content_runs(&self) -> &ContentRuns {
        &self.content_runs
    }

    /// Offset of this group from the column set's top-left corner
    pub fn offset_from_column_set(&self, ctx: &ColumnSetContext) -> LayoutSize {
        if ctx.is_horizontal() {
            LayoutSize::new(0.0, self.logical_top)
        } else {
            LayoutSize::new(self.logical_top, 0.0)
        }
    }

    /// Set up the column height for a fresh (non-balancing) layout pass.
    ///
    /// Returns whether the height changed.
    pub fn reset_column_height(&mut self, ctx: &ColumnSetContext) -> bool {
        let old_column_height = self.column_height;

        self.max_column_height = self.calculate_max_column_height(ctx);
        self.minimum_column_height = 0.0;
        self.min_space_shortage = f32::INFINITY;
        self.content_runs.clear();

        let outer_height_known = ctx
            .enclosing
            .is_some_and(|outer| outer.is_fragmentainer_logical_height_known());
        if outer_height_known {
            // Nested inside a fragmentation context with known fragmentainer
            // sizes: start out filling the outer fragmentainer.
            let height = if ctx.height_is_auto {
                self.max_column_height
            } else {
                self.height_adjusted_for_row_offset(ctx.column_height_available, ctx)
            };
            self.set_and_constrain_column_height(height);
        } else if ctx.height_is_auto {
            self.column_height = 0.0;
        } else {
            let height = self.height_adjusted_for_row_offset(ctx.column_height_available, ctx);
            self.set_and_constrain_column_height(height);
        }

        self.column_height != old_column_height
    }

    /// Record an explicit break at `end_offset` for the next height guess
    pub fn add_content_run(&mut self, end_offset: f32, ctx: &ColumnSetContext) {
        if !ctx.height_is_auto {
            return;
        }
        self.content_runs
            .add(end_offset, ctx.used_column_count as usize);
    }

    /// Keep track of the tallest unbreakable content
    pub fn update_minimum_column_height(&mut self, height: f32) {
        if height > self.minimum_column_height {
            self.minimum_column_height = height;
        }
    }

    /// Keep track of the smallest positive space shortage
    pub fn record_space_shortage(&mut self, shortage: f32) {
        if shortage <= 0.0 {
            return;
        }
        self.min_space_shortage = self.min_space_shortage.min(shortage);
    }

    /// Compute a new column height after a layout pass.
    ///
    /// Returns `true` when the height changed and another pass is needed.
    /// Content runs and the space shortage are always discarded.
    pub fn recalculate_column_height(
        &mut self,
        mode: ColumnHeightCalculation,
        ctx: &ColumnSetContext,
    ) -> bool {
        let old_column_height = self.column_height;

        self.max_column_height = self.calculate_max_column_height(ctx);

        if ctx.height_is_auto {
            if mode == ColumnHeightCalculation::GuessFromFlowThreadPortion {
                self.distribute_implicit_breaks(ctx);
            }
            let new_height = self.calculate_column_height(mode, ctx);
            self.set_and_constrain_column_height(new_height);
        } else {
            // Fixed height, but the maximum may have changed.
            let height = self.column_height;
            self.set_and_constrain_column_height(height);
        }

        self.content_runs.clear();
        self.min_space_shortage = f32::INFINITY;

        self.column_height != old_column_height
    }

    /// Drop the content runs collected in this pass
    pub fn clear_content_runs(&mut self) {
        self.content_runs.clear();
        self.min_space_shortage = f32::INFINITY;
    }

    /// Close the final run at the end of the group, then hand implicit breaks
    /// to the runs until every column is accounted for.
    pub fn distribute_implicit_breaks(&mut self, ctx: &ColumnSetContext) {
        let column_count = ctx.used_column_count as usize;
        self.content_runs
            .add(self.logical_bottom_in_flow_thread, column_count);
        self.content_runs
            .distribute_implicit_breaks(self.logical_top_in_flow_thread, column_count);
    }

    /// Column height suggested by `mode`, before constraining
    pub fn calculate_column_height(
        &self,
        mode: ColumnHeightCalculation,
        ctx: &ColumnSetContext,
    ) -> f32 {
        match mode {
            ColumnHeightCalculation::GuessFromFlowThreadPortion => {
                let tallest = self
                    .content_runs
                    .tallest_column_height(self.logical_top_in_flow_thread)
                    .unwrap_or(0.0);
                tallest.max(self.minimum_column_height)
            }
            ColumnHeightCalculation::StretchBySpaceShortage => {
                if self.actual_column_count() <= ctx.used_column_count {
                    // Everything fits.
                    return self.column_height;
                }
                if self.content_runs.len() >= ctx.used_column_count as usize {
                    // Forced breaks alone fill every column; stretching
                    // cannot reduce the column count.
                    return self.column_height;
                }
                if self.column_height >= self.max_column_height {
                    return self.column_height;
                }
                if !self.min_space_shortage.is_finite() {
                    log::warn!(
                        "Column balancing got no space shortage at height {}; keeping it",
                        self.column_height
                    );
                    return self.column_height;
                }
                log::trace!(
                    "Stretching column height {} by {}",
                    self.column_height,
                    self.min_space_shortage
                );
                self.column_height + self.min_space_shortage
            }
        }
    }

    /// Number of columns needed to hold this group's flow thread portion
    pub fn actual_column_count(&self) -> u32 {
        let flow_height = self.logical_height_in_flow_thread();
        if flow_height <= 0.0 || self.column_height <= 0.0 {
            return 1;
        }
        ((flow_height / self.column_height).ceil() as u32).max(1)
    }

    /// Index of the column holding `offset`
    pub fn column_index_at_offset(&self, offset: f32, mode: ColumnIndexMode) -> u32 {
        if offset < self.logical_top_in_flow_thread {
            return 0;
        }
        if mode == ColumnIndexMode::ClampToExistingColumns
            && offset >= self.logical_bottom_in_flow_thread
        {
            return self.actual_column_count() - 1;
        }
        if self.column_height > 0.0 {
            ((offset - self.logical_top_in_flow_thread) / self.column_height).floor() as u32
        } else {
            0
        }
    }

    /// Flow thread offset where column `index` starts
    pub fn logical_top_in_flow_thread_at(&self, index: u32) -> f32 {
        self.logical_top_in_flow_thread + index as f32 * self.column_height
    }

    /// Flow thread offset where the column holding `offset` starts, counting
    /// columns past the end of the group
    pub fn column_logical_top_for_offset(&self, offset: f32) -> f32 {
        let index = self.column_index_at_offset(offset, ColumnIndexMode::AssumeNewColumns);
        self.logical_top_in_flow_thread_at(index)
    }

    /// The physical box of column `index`, relative to the group
    pub fn column_rect_at(&self, index: u32, ctx: &ColumnSetContext) -> Rect {
        let column_logical_width = ctx.column_logical_width;
        let mut column_logical_height = self.column_height;
        let mut column_logical_top = 0.0;
        let mut column_logical_left = 0.0;
        let column_gap = ctx.column_gap;

        let portion_outside_flow_thread = self.logical_top_in_flow_thread
            + (index + 1) as f32 * self.column_height
            - self.logical_bottom_in_flow_thread;
        if portion_outside_flow_thread > 0.0 {
            // The last column may not use all of its space.
            column_logical_height = (column_logical_height - portion_outside_flow_thread).max(0.0);
        }

        if ctx.progression_is_inline {
            let stride = index as f32 * (column_logical_width + column_gap);
            if ctx.is_left_to_right() {
                column_logical_left += stride;
            } else {
                column_logical_left += ctx.set_logical_width - column_logical_width - stride;
            }
        } else {
            column_logical_top += index as f32 * (self.column_height + column_gap);
        }

        let rect = Rect::new(
            column_logical_left,
            column_logical_top,
            column_logical_width,
            column_logical_height,
        );
        if ctx.is_horizontal() {
            rect
        } else {
            rect.transposed()
        }
    }

    /// The physical box of column `index`'s slice of the flow thread, in
    /// flow thread coordinates
    pub fn flow_thread_portion_rect_at(&self, index: u32, ctx: &ColumnSetContext) -> Rect {
        let logical_top = self.logical_top_in_flow_thread_at(index);
        let logical_bottom = (logical_top + self.column_height)
            .min(self.logical_bottom_in_flow_thread)
            .max(logical_top);
        let rect = Rect::new(
            0.0,
            logical_top,
            ctx.column_logical_width,
            logical_bottom - logical_top,
        );
        if ctx.is_horizontal() {
            rect
        } else {
            rect.transposed()
        }
    }

    /// Translation from flow thread coordinates to group coordinates for
    /// content at `offset`
    pub fn flow_thread_translation_at_offset(&self, offset: f32, ctx: &ColumnSetContext) -> LayoutSize {
        let index = self.column_index_at_offset(offset, ColumnIndexMode::ClampToExistingColumns);
        let portion_rect = self.flow_thread_portion_rect_at(index, ctx);
        let column_rect = self.column_rect_at(index, ctx);
        column_rect.location() - portion_rect.location()
    }

    /// Column under a point given relative to the group. Column boundaries
    /// lie in the middle of the gaps.
    pub fn column_index_at_visual_point(&self, point: Point, ctx: &ColumnSetContext) -> u32 {
        let progression_is_inline = ctx.progression_is_inline;
        let column_length = if progression_is_inline {
            ctx.column_logical_width
        } else {
            self.column_height
        };
        let mut offset = if ctx.is_horizontal() == progression_is_inline {
            point.x
        } else {
            point.y
        };
        if progression_is_inline && !ctx.is_left_to_right() {
            offset = ctx.set_logical_width - offset;
        }
        let column_gap = ctx.column_gap;
        let stride = (column_length + column_gap).max(1.0);
        let index = ((offset + column_gap / 2.0) / stride).floor();
        if index < 0.0 {
            return 0;
        }
        (index as u32).min(self.actual_column_count() - 1)
    }

    /// Map a point relative to the group into the flow thread.
    ///
    /// Points above or below a column snap to the start or end of that column.
    pub fn visual_point_to_flow_thread_point(&self, point: Point, ctx: &ColumnSetContext) -> Point {
        let index = self.column_index_at_visual_point(point, ctx);
        let column_rect = self.column_rect_at(index, ctx);
        let local = point - column_rect.location();
        let column_top = self.logical_top_in_flow_thread_at(index);
        let height = self.column_height;

        if ctx.is_horizontal() {
            let local = if local.height < 0.0 {
                Point::new(0.0, 0.0)
            } else if local.height > height {
                Point::new(0.0, height)
            } else {
                Point::new(local.width, local.height)
            };
            Point::new(local.x, local.y + column_top)
        } else {
            let local = if local.width < 0.0 {
                Point::new(0.0, 0.0)
            } else if local.width > height {
                Point::new(height, 0.0)
            } else {
                Point::new(local.width, local.height)
            };
            Point::new(local.x + column_top, local.y)
        }
    }

    /// Whether `offset` falls in a column this group can hold
    pub fn has_column_at(&self, offset: f32, ctx: &ColumnSetContext) -> bool {
        if self.column_height <= 0.0 {
            return true;
        }
        let index = self.column_index_at_offset(offset, ColumnIndexMode::AssumeNewColumns);
        index < ctx.used_column_count
    }

    fn height_adjusted_for_row_offset(&self, height: f32, ctx: &ColumnSetContext) -> f32 {
        (height - self.logical_top - ctx.set_logical_top).max(1.0)
    }

    fn calculate_max_column_height(&self, ctx: &ColumnSetContext) -> f32 {
        let mut max_height = self.height_adjusted_for_row_offset(ctx.max_column_logical_height, ctx);
        if let Some(outer) = ctx.enclosing {
            if outer.is_fragmentainer_logical_height_known() {
                let remaining =
                    outer.remaining_logical_height_at(ctx.set_logical_top + self.logical_top);
                max_height = max_height.min(remaining);
            }
        }
        max_height
    }

    fn set_and_constrain_column_height(&mut self, height: f32) {
        self.column_height = height.min(self.max_column_height);
    }
}

impl Default for FragmentainerGroup {
    fn default() -> Self {
        Self::new()
    }
}
