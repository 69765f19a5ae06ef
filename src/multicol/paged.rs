//! Paginated roots
//!
//! A paged flow thread reuses the column machinery with one column per page:
//! the page width is the available width, there are no column gaps and no
//! spanners, and pages advance either along the inline axis (side by side)
//! or along the block axis (stacked). The flow thread is padded so that the
//! last page is as tall as the others.

use indextree::NodeId;

use super::flow_thread::{FlowThread, FlowThreadConfig};
use super::ColumnProgression;

impl FlowThreadConfig {
    /// A paginated root advancing pages in `progression`
    pub fn paged(progression: ColumnProgression) -> Self {
        Self {
            paged: true,
            allows_spanners: false,
            enforce_uniform_page_height: true,
            progression,
        }
    }
}

impl FlowThread {
    /// Flow thread of a paginated root
    pub fn paged(root: NodeId, progression: ColumnProgression) -> Self {
        Self::new(root, FlowThreadConfig::paged(progression))
    }

    /// Number of pages the content occupies
    pub fn page_count(&self) -> u32 {
        self.first_column_set()
            .map_or(0, |set| set.actual_column_count())
    }

    /// Extend the last set to a whole number of pages
    pub(crate) fn pad_to_uniform_page_height(&mut self) {
        let page_count = self.page_count();
        let Some(set) = self
            .column_boxes
            .iter_mut()
            .find_map(|column_box| column_box.as_column_set_mut())
        else {
            return;
        };
        let page_logical_height = set.page_logical_height_for_offset(0.0);
        if page_logical_height <= 0.0 {
            // Not known yet; happens in the first pass of an auto-height root.
            return;
        }
        let padded_bottom = page_logical_height * page_count as f32;
        if padded_bottom > set.logical_bottom_in_flow_thread() {
            log::trace!("Padding paged flow thread to {}", padded_bottom);
        }
        set.end_flow(padded_bottom.max(set.logical_bottom_in_flow_thread()));
    }
}
