//! The flow thread: a multicol container's content as one continuous strip
//!
//! Content is laid out into the flow thread as if it were a single column of
//! unlimited height. The flow thread owns the ordered list of column boxes
//! (column sets and spanner placeholders) that slice that strip into
//! columns, answers the pagination queries the content layouter asks while
//! laying out, and drives column height recalculation between passes.
//!
//! Structural reconciliation (keeping the column box list in step with the
//! box tree) lives in [`super::reconcile`].

use std::collections::HashMap;
use std::fmt;

use indextree::NodeId;

use crate::geometry::{LayoutSize, Point, Rect};
use crate::style::MulticolStyle;
use crate::utils::error::{MulticolError, Result};

use super::column_set::{ColumnSet, ColumnSetContext};
use super::invalidation::{
    InvalidationReason, InvalidationSink, InvalidationTarget, InvalidationTracker,
};
use super::spanner_placeholder::SpannerPlaceholder;
use super::{ColumnHeightCalculation, ColumnProgression, EnclosingFragmentation, PageBoundaryRule};

/// Stable identity of a column box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnBoxId(pub u32);

impl fmt::Display for ColumnBoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A child of the multicol container
#[derive(Debug, Clone)]
pub enum ColumnBox {
    Set(ColumnSet),
    Spanner(SpannerPlaceholder),
}

/// Kind of a column box, for comparing box sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnBoxKind {
    ColumnSet,
    SpannerPlaceholder,
}

impl ColumnBox {
    pub fn id(&self) -> ColumnBoxId {
        match self {
            ColumnBox::Set(set) => set.id(),
            ColumnBox::Spanner(placeholder) => placeholder.id(),
        }
    }

    pub fn kind(&self) -> ColumnBoxKind {
        match self {
            ColumnBox::Set(_) => ColumnBoxKind::ColumnSet,
            ColumnBox::Spanner(_) => ColumnBoxKind::SpannerPlaceholder,
        }
    }

    pub fn is_column_set(&self) -> bool {
        matches!(self, ColumnBox::Set(_))
    }

    pub fn is_spanner_placeholder(&self) -> bool {
        matches!(self, ColumnBox::Spanner(_))
    }

    pub fn as_column_set(&self) -> Option<&ColumnSet> {
        match self {
            ColumnBox::Set(set) => Some(set),
            ColumnBox::Spanner(_) => None,
        }
    }

    pub fn as_column_set_mut(&mut self) -> Option<&mut ColumnSet> {
        match self {
            ColumnBox::Set(set) => Some(set),
            ColumnBox::Spanner(_) => None,
        }
    }

    pub fn as_spanner_placeholder(&self) -> Option<&SpannerPlaceholder> {
        match self {
            ColumnBox::Spanner(placeholder) => Some(placeholder),
            ColumnBox::Set(_) => None,
        }
    }

    /// Block offset from the multicol content box
    pub fn logical_top(&self) -> f32 {
        match self {
            ColumnBox::Set(set) => set.logical_top(),
            ColumnBox::Spanner(placeholder) => placeholder.logical_top(),
        }
    }

    pub fn logical_height(&self) -> f32 {
        match self {
            ColumnBox::Set(set) => set.logical_height(),
            ColumnBox::Spanner(placeholder) => placeholder.logical_height(),
        }
    }
}

/// Behaviour switches distinguishing multicol containers from paginated roots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowThreadConfig {
    /// Paginated root: one column per page, page width is the available width
    pub paged: bool,
    /// `column-span: all` descendants become spanners
    pub allows_spanners: bool,
    /// Pad the flow thread so the last page is as tall as the others
    pub enforce_uniform_page_height: bool,
    pub progression: ColumnProgression,
}

impl FlowThreadConfig {
    /// A regular multi-column container
    pub fn multicol() -> Self {
        Self {
            paged: false,
            allows_spanners: true,
            enforce_uniform_page_height: false,
            progression: ColumnProgression::Inline,
        }
    }
}

impl Default for FlowThreadConfig {
    fn default() -> Self {
        Self::multicol()
    }
}

/// The flow thread of one multicol container (or paginated root)
#[derive(Debug)]
pub struct FlowThread {
    /// The multicol container whose children form the flow thread's content
    pub(crate) root: NodeId,
    pub(crate) config: FlowThreadConfig,
    pub(crate) column_boxes: Vec<ColumnBox>,
    /// Spanner box to its placeholder
    pub(crate) spanner_placeholders: HashMap<NodeId, ColumnBoxId>,
    next_column_box_id: u32,
    style: MulticolStyle,
    available_logical_width: f32,
    column_count: u32,
    column_logical_width: f32,
    enclosing: Option<EnclosingFragmentation>,
    /// Set receiving content during layout
    last_set_worked_on: Option<ColumnBoxId>,
    in_balancing_pass: bool,
    needs_column_heights_recalculation: bool,
    pub(crate) being_evacuated: bool,
    /// Block size of the laid out content
    logical_height: f32,
    /// Block size of the stacked column boxes
    container_logical_height: f32,
    pub(crate) invalidations: InvalidationTracker,
}

impl FlowThread {
    pub fn new(root: NodeId, config: FlowThreadConfig) -> Self {
        Self {
            root,
            config,
            column_boxes: Vec::new(),
            spanner_placeholders: HashMap::new(),
            next_column_box_id: 1,
            style: MulticolStyle::default(),
            available_logical_width: 0.0,
            column_count: 1,
            column_logical_width: 0.0,
            enclosing: None,
            last_set_worked_on: None,
            in_balancing_pass: false,
            needs_column_heights_recalculation: false,
            being_evacuated: false,
            logical_height: 0.0,
            container_logical_height: 0.0,
            invalidations: InvalidationTracker::new(),
        }
    }

    /// Flow thread of a regular multi-column container
    pub fn multicol(root: NodeId) -> Self {
        Self::new(root, FlowThreadConfig::multicol())
    }

    /// The multicol container
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn config(&self) -> &FlowThreadConfig {
        &self.config
    }

    pub fn is_paged(&self) -> bool {
        self.config.paged
    }

    pub fn style(&self) -> &MulticolStyle {
        &self.style
    }

    pub fn progression_is_inline(&self) -> bool {
        self.config.progression == ColumnProgression::Inline
    }

    pub fn column_boxes(&self) -> &[ColumnBox] {
        &self.column_boxes
    }

    /// Column box kinds in order
    pub fn signature(&self) -> Vec<ColumnBoxKind> {
        self.column_boxes.iter().map(ColumnBox::kind).collect()
    }

    pub fn column_box(&self, id: ColumnBoxId) -> Option<&ColumnBox> {
        self.column_boxes.iter().find(|column_box| column_box.id() == id)
    }

    pub fn column_set(&self, id: ColumnBoxId) -> Option<&ColumnSet> {
        self.column_box(id).and_then(ColumnBox::as_column_set)
    }

    pub fn column_sets(&self) -> impl Iterator<Item = &ColumnSet> {
        self.column_boxes.iter().filter_map(ColumnBox::as_column_set)
    }

    pub fn first_column_set(&self) -> Option<&ColumnSet> {
        self.column_sets().next()
    }

    pub fn last_column_set(&self) -> Option<&ColumnSet> {
        self.column_sets().last()
    }

    /// The placeholder standing in for `spanner`, if it is one
    pub fn spanner_placeholder(&self, spanner: NodeId) -> Option<&SpannerPlaceholder> {
        let id = *self.spanner_placeholders.get(&spanner)?;
        self.column_box(id).and_then(ColumnBox::as_spanner_placeholder)
    }

    pub fn has_any_column_spanners(&self) -> bool {
        !self.spanner_placeholders.is_empty()
    }

    pub(crate) fn index_of(&self, id: ColumnBoxId) -> Option<usize> {
        self.column_boxes.iter().position(|column_box| column_box.id() == id)
    }

    pub(crate) fn allocate_column_box_id(&mut self) -> ColumnBoxId {
        let id = ColumnBoxId(self.next_column_box_id);
        self.next_column_box_id += 1;
        id
    }

    pub fn invalidations(&self) -> &InvalidationTracker {
        &self.invalidations
    }

    /// Deliver pending invalidations to the embedder
    pub fn drain_invalidations(&mut self, sink: &mut dyn InvalidationSink) -> usize {
        self.invalidations.drain_into(sink)
    }

    // Geometry

    /// Used column count
    pub fn column_count(&self) -> u32 {
        self.column_count
    }

    /// Inline size of each column
    pub fn column_logical_width(&self) -> f32 {
        self.column_logical_width
    }

    pub fn column_gap(&self) -> f32 {
        if self.config.paged {
            0.0
        } else {
            self.style.column_gap.max(0.0)
        }
    }

    /// Block size available to columns; 0 when it depends on content
    pub fn column_height_available(&self) -> f32 {
        self.style.column_height_available()
    }

    pub fn max_column_logical_height(&self) -> f32 {
        self.style.max_column_logical_height()
    }

    pub fn enclosing_fragmentation(&self) -> Option<EnclosingFragmentation> {
        self.enclosing
    }

    /// Nest this multicol container in an outer fragmentation context
    pub fn set_enclosing_fragmentation(&mut self, enclosing: Option<EnclosingFragmentation>) {
        self.enclosing = enclosing;
    }

    /// Resolve used column count and width from the column properties and
    /// the available inline size.
    ///
    /// Returns `(column_width, column_count)`.
    pub fn calculate_column_count_and_width(&self, style: &MulticolStyle, available_width: f32) -> (f32, u32) {
        let available_width = available_width.max(0.0);
        if self.config.paged {
            return (available_width.max(1.0), 1);
        }
        let column_gap = style.column_gap.max(0.0);
        let computed_column_width = style.column_width.unwrap_or(1.0).max(1.0);
        let computed_column_count = style.column_count.unwrap_or(1).max(1);
        let columns_that_fit =
            ((available_width + column_gap) / (computed_column_width + column_gap)).floor() as u32;

        let count = match (style.column_width, style.column_count) {
            (None, Some(_)) => computed_column_count,
            (Some(_), None) => columns_that_fit.max(1),
            (Some(_), Some(_)) => computed_column_count.min(columns_that_fit).max(1),
            (None, None) => 1,
        };
        let width = match (style.column_width, style.column_count) {
            (None, _) => (available_width - (count - 1) as f32 * column_gap) / count as f32,
            (Some(_), _) => (available_width + column_gap) / count as f32 - column_gap,
        };
        (width.max(1.0), count)
    }

    /// Whether the column width would change for this style and available size
    pub fn needs_new_width(&self, style: &MulticolStyle, available_width: f32) -> bool {
        let (width, count) = self.calculate_column_count_and_width(style, available_width);
        width != self.column_logical_width || count != self.column_count
    }

    /// Store the style and recompute column count and width
    pub fn update_logical_width(&mut self, style: &MulticolStyle, available_width: f32) {
        let (width, count) = self.calculate_column_count_and_width(style, available_width);
        if width != self.column_logical_width || count != self.column_count {
            log::debug!(
                "Flow thread {} uses {} columns of width {}",
                self.root,
                count,
                width
            );
        }
        self.style = style.clone();
        self.available_logical_width = available_width.max(0.0);
        self.column_logical_width = width;
        self.column_count = count;
    }

    /// Whether the column set at `index` derives its height from content
    pub fn height_is_auto_at(&self, index: usize) -> bool {
        if !self.config.paged {
            let followed_by_spanner = self
                .column_boxes
                .get(index + 1)
                .is_some_and(ColumnBox::is_spanner_placeholder);
            if followed_by_spanner {
                // Content after the spanner continues in another set, so this one must balance.
                return true;
            }
        }
        self.column_height_available() == 0.0
    }

    /// Container-derived parameters for the column set at `index`
    pub fn column_set_context(&self, index: usize) -> ColumnSetContext {
        let set_logical_top = self
            .column_boxes
            .get(index)
            .map_or(0.0, ColumnBox::logical_top);
        ColumnSetContext {
            used_column_count: self.column_count,
            height_is_auto: self.height_is_auto_at(index),
            column_height_available: self.column_height_available(),
            max_column_logical_height: self.max_column_logical_height(),
            column_logical_width: self.column_logical_width,
            column_gap: self.column_gap(),
            set_logical_width: self.available_logical_width,
            writing_mode: self.style.writing_mode,
            direction: self.style.direction,
            progression_is_inline: self.progression_is_inline(),
            set_logical_top,
            enclosing: self.enclosing,
        }
    }

    fn column_set_index_by_id(&self, id: ColumnBoxId) -> Option<usize> {
        self.index_of(id)
            .filter(|&index| self.column_boxes[index].is_column_set())
    }

    fn column_set_mut_at(&mut self, index: usize) -> Option<&mut ColumnSet> {
        self.column_boxes
            .get_mut(index)
            .and_then(ColumnBox::as_column_set_mut)
    }

    // Layout passes

    pub fn is_in_balancing_pass(&self) -> bool {
        self.in_balancing_pass
    }

    pub fn needs_column_heights_recalculation(&self) -> bool {
        self.needs_column_heights_recalculation
    }

    /// Start a layout pass over the flow thread.
    ///
    /// Outside a balancing pass every column set starts from scratch.
    pub fn layout_columns(&mut self, style: &MulticolStyle, available_width: f32) {
        self.update_logical_width(style, available_width);
        self.needs_column_heights_recalculation = false;

        for index in 0..self.column_boxes.len() {
            if self.column_boxes[index].is_spanner_placeholder() {
                // Sets after a spanner move when their predecessors change height.
                self.needs_column_heights_recalculation = true;
                continue;
            }
            let ctx = self.column_set_context(index);
            let in_balancing_pass = self.in_balancing_pass;
            if let Some(set) = self.column_set_mut_at(index) {
                let id = set.id();
                if !in_balancing_pass && set.reset_column_height(&ctx) {
                    self.invalidations.mark(
                        InvalidationTarget::ColumnBox(id),
                        InvalidationReason::ColumnHeightChanged,
                    );
                }
            }
            if ctx.height_is_auto {
                self.needs_column_heights_recalculation = true;
            }
        }

        self.logical_height = 0.0;
        self.last_set_worked_on = self.first_column_set().map(ColumnSet::id);
        if let Some(index) = self.last_set_worked_on.and_then(|id| self.index_of(id)) {
            if let Some(set) = self.column_set_mut_at(index) {
                set.begin_flow(0.0);
            }
        }
    }

    /// Content layout reached a spanner at `logical_top_in_flow_thread`: the
    /// set before it ends there and the set after it begins there.
    pub fn skip_column_spanner(
        &mut self,
        spanner: NodeId,
        logical_top_in_flow_thread: f32,
        spanner_block_size: f32,
    ) -> Result<()> {
        let id = *self
            .spanner_placeholders
            .get(&spanner)
            .ok_or(MulticolError::NotInFlowThread(spanner))?;
        let index = self
            .index_of(id)
            .ok_or_else(|| MulticolError::Invariant(format!("placeholder {} is not in the column box list", id)))?;

        if let ColumnBox::Spanner(placeholder) = &mut self.column_boxes[index] {
            placeholder.set_logical_height(spanner_block_size);
        }

        let mut offset = logical_top_in_flow_thread;
        if index > 0 {
            if let Some(previous) = self.column_set_mut_at(index - 1) {
                // Negative margins may pull the spanner above the set's start.
                offset = offset.max(previous.logical_top_in_flow_thread());
                previous.end_flow(offset);
            }
        }
        if let Some(next) = self.column_set_mut_at(index + 1) {
            next.begin_flow(offset);
            let next_id = next.id();
            self.last_set_worked_on = Some(next_id);
        }
        Ok(())
    }

    /// Content layout finished with `flow_logical_height` of content
    pub fn finish_layout(&mut self, flow_logical_height: f32) {
        self.logical_height = flow_logical_height.max(0.0);
        let last_box_index = self.column_boxes.len().checked_sub(1);
        if let Some(last_set) = last_box_index.and_then(|index| self.column_set_mut_at(index)) {
            // Trailing content belongs to the last set.
            last_set.end_flow(flow_logical_height.max(0.0));
        }
        if self.config.enforce_uniform_page_height {
            self.pad_to_uniform_page_height();
        }
        self.last_set_worked_on = None;
        self.place_column_boxes();
        self.invalidations.validate_column_sets();
    }

    /// Block size of the laid out content
    pub fn logical_height(&self) -> f32 {
        self.logical_height
    }

    /// Block size of the container's content: the stacked column boxes
    pub fn container_logical_height(&self) -> f32 {
        self.container_logical_height
    }

    /// Stack column sets and spanner placeholders in the container
    pub fn place_column_boxes(&mut self) -> f32 {
        let mut logical_top = 0.0;
        for column_box in &mut self.column_boxes {
            match column_box {
                ColumnBox::Set(set) => {
                    set.set_logical_top(logical_top);
                    logical_top += set.logical_height();
                }
                ColumnBox::Spanner(placeholder) => {
                    placeholder.set_logical_top(logical_top);
                    logical_top += placeholder.logical_height();
                }
            }
        }
        self.container_logical_height = logical_top;
        logical_top
    }

    /// Recompute column heights after a pass. Returns `true` when another
    /// pass is required.
    pub fn recalculate_column_heights(&mut self) -> bool {
        if !self.needs_column_heights_recalculation {
            for column_box in &mut self.column_boxes {
                if let ColumnBox::Set(set) = column_box {
                    set.clear_content_runs();
                }
            }
            self.in_balancing_pass = false;
            return false;
        }

        let mode = if self.in_balancing_pass {
            ColumnHeightCalculation::StretchBySpaceShortage
        } else {
            ColumnHeightCalculation::GuessFromFlowThreadPortion
        };

        let mut needs_relayout = false;
        for index in 0..self.column_boxes.len() {
            let ctx = self.column_set_context(index);
            let Some(set) = self.column_set_mut_at(index) else {
                continue;
            };
            needs_relayout |= set.recalculate_column_height(mode, &ctx);
            if needs_relayout {
                // This set and every set after it may move.
                let id = set.id();
                self.invalidations.mark(
                    InvalidationTarget::ColumnBox(id),
                    InvalidationReason::ColumnHeightChanged,
                );
            }
        }
        if needs_relayout {
            self.invalidations.mark(
                InvalidationTarget::FlowThread,
                InvalidationReason::ColumnHeightChanged,
            );
        }
        log::trace!(
            "Recalculated column heights ({:?}), relayout needed: {}",
            mode,
            needs_relayout
        );
        self.in_balancing_pass = needs_relayout;
        needs_relayout
    }

    /// Stop balancing and accept the current heights
    pub fn abandon_balancing(&mut self) {
        self.in_balancing_pass = false;
        for column_box in &mut self.column_boxes {
            if let ColumnBox::Set(set) = column_box {
                set.clear_content_runs();
            }
        }
    }

    // Pagination hooks used by the content layouter

    /// The column set holding flow thread `offset`
    pub fn column_set_at_block_offset(&self, offset: f32) -> Option<ColumnBoxId> {
        if let Some(id) = self.last_set_worked_on {
            // Layout in progress; the flow ranges of later sets are stale.
            return Some(id);
        }
        let first = self.first_column_set()?;
        if offset <= 0.0 {
            return Some(first.id());
        }
        if let Some(set) = self
            .column_sets()
            .find(|set| set.contains_flow_thread_offset(offset))
        {
            return Some(set.id());
        }
        self.column_sets()
            .filter(|set| set.logical_top_in_flow_thread() <= offset)
            .last()
            .or(Some(first))
            .map(ColumnSet::id)
    }

    fn column_set_index_at_block_offset(&self, offset: f32) -> Option<usize> {
        self.column_set_at_block_offset(offset)
            .and_then(|id| self.column_set_index_by_id(id))
    }

    /// Whether `offset` is where the set receiving content starts
    pub fn is_at_column_set_start(&self, offset: f32) -> bool {
        self.column_set_index_at_block_offset(offset)
            .and_then(|index| self.column_boxes[index].as_column_set())
            .is_none_or(|set| offset <= set.logical_top_in_flow_thread())
    }

    /// Report that content at `offset` needed `space_shortage` more room
    /// than its column had left
    pub fn set_page_break(&mut self, offset: f32, space_shortage: f32) {
        if space_shortage <= 0.0 {
            return;
        }
        if let Some(index) = self.column_set_index_at_block_offset(offset) {
            if let Some(set) = self.column_set_mut_at(index) {
                set.record_space_shortage(offset, space_shortage);
            }
        }
    }

    /// Report unbreakable content of `min_height` at `offset`
    pub fn update_minimum_page_height(&mut self, offset: f32, min_height: f32) {
        if let Some(index) = self.column_set_index_at_block_offset(offset) {
            if let Some(set) = self.column_set_mut_at(index) {
                set.update_minimum_column_height(offset, min_height);
            }
        }
    }

    /// Report a forced break at `offset`.
    ///
    /// Returns how far content must move down to reach the next column, or
    /// `None` when there is no column set to take the break.
    pub fn add_forced_column_break(&mut self, offset: f32) -> Option<f32> {
        let index = self.column_set_index_at_block_offset(offset)?;
        let ctx = self.column_set_context(index);
        let set = self.column_set_mut_at(index)?;
        set.add_content_run(offset, &ctx);
        let adjustment = if set.page_logical_height_for_offset(offset) > 0.0 {
            set.page_remaining_logical_height_for_offset(offset, PageBoundaryRule::AssociateWithFormerPage)
        } else {
            0.0
        };
        Some(adjustment)
    }

    /// Whether columns have a usable height yet
    pub fn is_page_logical_height_known(&self) -> bool {
        self.last_column_set()
            .is_some_and(|set| set.page_logical_height_for_offset(0.0) > 0.0)
    }

    /// Column height at `offset`; 0 while unknown
    pub fn page_logical_height_for_offset(&self, offset: f32) -> f32 {
        self.column_set_index_at_block_offset(offset)
            .and_then(|index| self.column_boxes[index].as_column_set())
            .map_or(0.0, |set| set.page_logical_height_for_offset(offset))
    }

    /// Space left in the column holding `offset`
    pub fn page_remaining_logical_height_for_offset(&self, offset: f32, rule: PageBoundaryRule) -> f32 {
        self.column_set_index_at_block_offset(offset)
            .and_then(|index| self.column_boxes[index].as_column_set())
            .map_or(0.0, |set| set.page_remaining_logical_height_for_offset(offset, rule))
    }

    /// When nested in an outer fragmentation context, add rows of columns
    /// until there is a column for `offset`
    pub fn append_new_fragmentainer_group_if_needed(&mut self, offset: f32) {
        if !self.is_page_logical_height_known() {
            // An auto-height container nested in another: nothing to go on yet.
            return;
        }
        let Some(index) = self.column_set_index_at_block_offset(offset) else {
            return;
        };
        let ctx = self.column_set_context(index);
        let has_enclosing = self.enclosing.is_some();
        let Some(set) = self.column_set_mut_at(index) else {
            return;
        };
        if set.is_initial_height_calculated() {
            // Rows are only added in the initial pass, so the last row stays
            // the same one through balancing.
            return;
        }
        if !has_enclosing {
            return;
        }
        while !set.has_fragmentainer_group_for_column_at(offset, &ctx) {
            let new_group = set.append_new_fragmentainer_group(&ctx);
            if new_group.logical_height() <= 0.0 {
                log::warn!("Zero-height fragmentainer group at flow offset {}", offset);
                break;
            }
        }
    }

    // Coordinate mapping

    /// Translation from flow thread coordinates to multicol container
    /// coordinates for content at `offset`
    pub fn flow_thread_translation_at_offset(&self, offset: f32) -> LayoutSize {
        self.column_set_index_at_block_offset(offset)
            .and_then(|index| {
                let ctx = self.column_set_context(index);
                self.column_boxes[index]
                    .as_column_set()
                    .map(|set| set.flow_thread_translation_at_offset(offset, &ctx))
            })
            .unwrap_or_default()
    }

    /// Map a point in the multicol container into the flow thread
    pub fn visual_point_to_flow_thread_point(&self, point: Point) -> Point {
        let block_offset = if self.style.writing_mode.is_horizontal() {
            point.y
        } else {
            point.x
        };
        let mut chosen = None;
        for (index, column_box) in self.column_boxes.iter().enumerate() {
            if let ColumnBox::Set(set) = column_box {
                if chosen.is_none() || set.logical_top() <= block_offset {
                    chosen = Some(index);
                }
            }
        }
        let Some(index) = chosen else {
            return point;
        };
        let ctx = self.column_set_context(index);
        match self.column_boxes[index].as_column_set() {
            Some(set) => {
                let location = set.location(&ctx);
                set.visual_point_to_flow_thread_point(point - LayoutSize::new(location.x, location.y), &ctx)
            }
            None => point,
        }
    }

    /// Physical column boxes of every set, relative to the multicol content box
    pub fn column_rects(&self) -> Vec<(ColumnBoxId, Rect)> {
        self.column_boxes
            .iter()
            .enumerate()
            .filter_map(|(index, column_box)| {
                let set = column_box.as_column_set()?;
                let ctx = self.column_set_context(index);
                Some(set.column_rects(&ctx).into_iter().map(move |rect| (set.id(), rect)))
            })
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ColumnFill, Direction};
    use crate::tree::BoxTree;
    use crate::style::BoxStyle;

    fn flow_thread_with_sets(sets: usize) -> (BoxTree, FlowThread) {
        let mut tree = BoxTree::new();
        let root = tree.root();
        let mut flow_thread = FlowThread::multicol(root);
        for index in 0..sets {
            if index > 0 {
                let spanner = tree.append_element(root, "h1", BoxStyle::spanner()).unwrap();
                let id = flow_thread.allocate_column_box_id();
                flow_thread
                    .column_boxes
                    .push(ColumnBox::Spanner(SpannerPlaceholder::new(id, spanner)));
                flow_thread.spanner_placeholders.insert(spanner, id);
            }
            let id = flow_thread.allocate_column_box_id();
            flow_thread.column_boxes.push(ColumnBox::Set(ColumnSet::new(id)));
        }
        (tree, flow_thread)
    }

    #[test]
    fn test_column_count_and_width_from_count() {
        let (_, flow_thread) = flow_thread_with_sets(1);
        let style = MulticolStyle {
            column_gap: 20.0,
            ..MulticolStyle::with_count(3)
        };
        assert_eq!(flow_thread.calculate_column_count_and_width(&style, 640.0), (200.0, 3));
    }

    #[test]
    fn test_column_count_and_width_from_width() {
        let (_, flow_thread) = flow_thread_with_sets(1);
        let style = MulticolStyle {
            column_width: Some(150.0),
            column_gap: 10.0,
            ..Default::default()
        };
        // (650 + 10) / (150 + 10) = 4.125 columns fit.
        assert_eq!(flow_thread.calculate_column_count_and_width(&style, 650.0), (155.0, 4));
        // Never fewer than one column.
        assert_eq!(flow_thread.calculate_column_count_and_width(&style, 50.0).1, 1);

        let both = MulticolStyle {
            column_count: Some(2),
            ..style
        };
        assert_eq!(flow_thread.calculate_column_count_and_width(&both, 650.0), (325.0, 2));
    }

    #[test]
    fn test_needs_new_width() {
        let (_, mut flow_thread) = flow_thread_with_sets(1);
        let style = MulticolStyle::with_count(2);
        assert!(flow_thread.needs_new_width(&style, 400.0));
        flow_thread.update_logical_width(&style, 400.0);
        assert!(!flow_thread.needs_new_width(&style, 400.0));
        assert!(flow_thread.needs_new_width(&style, 500.0));
    }

    #[test]
    fn test_height_is_auto() {
        let (_, mut flow_thread) = flow_thread_with_sets(2);
        let fixed = MulticolStyle {
            height: Some(300.0),
            ..MulticolStyle::with_count(2)
        };
        flow_thread.update_logical_width(&fixed, 400.0);
        // The set before the spanner balances anyway; the last one does not.
        assert!(flow_thread.height_is_auto_at(0));
        assert!(!flow_thread.height_is_auto_at(2));

        let sequential = MulticolStyle {
            max_height: Some(300.0),
            column_fill: ColumnFill::Auto,
            ..MulticolStyle::with_count(2)
        };
        flow_thread.update_logical_width(&sequential, 400.0);
        assert!(!flow_thread.height_is_auto_at(2));

        flow_thread.update_logical_width(&MulticolStyle::with_count(2), 400.0);
        assert!(flow_thread.height_is_auto_at(2));
    }

    #[test]
    fn test_layout_pass_over_spanner() {
        let (tree, mut flow_thread) = flow_thread_with_sets(2);
        let spanner = tree.children(tree.root()).next().unwrap();
        let style = MulticolStyle::with_count(2);

        flow_thread.layout_columns(&style, 400.0);
        assert!(flow_thread.needs_column_heights_recalculation());
        assert!(!flow_thread.is_page_logical_height_known());
        assert_eq!(flow_thread.add_forced_column_break(100.0), Some(0.0));

        flow_thread.skip_column_spanner(spanner, 300.0, 50.0).unwrap();
        flow_thread.finish_layout(500.0);

        let sets: Vec<(f32, f32)> = flow_thread
            .column_sets()
            .map(|set| (set.logical_top_in_flow_thread(), set.logical_bottom_in_flow_thread()))
            .collect();
        assert_eq!(sets, vec![(0.0, 300.0), (300.0, 500.0)]);
        assert_eq!(flow_thread.column_set_at_block_offset(350.0), flow_thread.last_column_set().map(ColumnSet::id));

        assert!(flow_thread.recalculate_column_heights());
        let heights: Vec<f32> = flow_thread
            .column_sets()
            .map(|set| set.first_fragmentainer_group().column_height())
            .collect();
        // First set: forced break at 100 then 200 more; the taller run wins.
        assert_eq!(heights, vec![200.0, 100.0]);
        assert!(flow_thread.is_in_balancing_pass());
    }

    #[test]
    fn test_skip_unknown_spanner_is_an_error() {
        let (mut tree, mut flow_thread) = flow_thread_with_sets(1);
        let stranger = tree.append_element(tree.root(), "div", BoxStyle::block()).unwrap();
        let err = flow_thread.skip_column_spanner(stranger, 0.0, 10.0).unwrap_err();
        assert!(matches!(err, MulticolError::NotInFlowThread(_)));
    }

    #[test]
    fn test_place_column_boxes() {
        let (tree, mut flow_thread) = flow_thread_with_sets(2);
        let spanner = tree.children(tree.root()).next().unwrap();
        let style = MulticolStyle {
            height: Some(120.0),
            ..MulticolStyle::with_count(2)
        };
        flow_thread.layout_columns(&style, 400.0);
        flow_thread.skip_column_spanner(spanner, 0.0, 40.0).unwrap();
        flow_thread.finish_layout(0.0);
        // First set balances (followed by a spanner) and is still 0 tall; the
        // last set takes the fixed height.
        assert_eq!(flow_thread.container_logical_height(), 160.0);
        let tops: Vec<f32> = flow_thread.column_boxes().iter().map(ColumnBox::logical_top).collect();
        assert_eq!(tops, vec![0.0, 0.0, 40.0]);
    }

    #[test]
    fn test_page_break_ignores_non_positive_shortage() {
        let (_, mut flow_thread) = flow_thread_with_sets(1);
        flow_thread.layout_columns(&MulticolStyle::with_count(2), 400.0);
        flow_thread.set_page_break(10.0, 0.0);
        flow_thread.set_page_break(10.0, -3.0);
        flow_thread.set_page_break(10.0, 7.0);
        let shortage = flow_thread
            .first_column_set()
            .map(|set| set.first_fragmentainer_group().min_space_shortage());
        assert_eq!(shortage, Some(7.0));
    }

    #[test]
    fn test_visual_point_mapping_rtl() {
        let (_, mut flow_thread) = flow_thread_with_sets(1);
        let style = MulticolStyle {
            direction: Direction::Rtl,
            column_gap: 10.0,
            ..MulticolStyle::with_count(2)
        };
        flow_thread.layout_columns(&style, 210.0);
        flow_thread.finish_layout(400.0);
        flow_thread.recalculate_column_heights();
        flow_thread.place_column_boxes();

        // Two 100px columns, 200px tall; the first one sits on the right.
        let translation = flow_thread.flow_thread_translation_at_offset(250.0);
        assert_eq!(translation, LayoutSize::new(0.0, -200.0));
        let visual = Point::new(30.0, 250.0) + translation;
        assert_eq!(flow_thread.visual_point_to_flow_thread_point(visual), Point::new(30.0, 250.0));

        let rects: Vec<Rect> = flow_thread.column_rects().into_iter().map(|(_, rect)| rect).collect();
        assert_eq!(
            rects,
            vec![Rect::new(110.0, 0.0, 100.0, 200.0), Rect::new(0.0, 0.0, 100.0, 200.0)]
        );
    }
}
