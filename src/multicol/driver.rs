//! Balancing driver
//!
//! Runs layout passes over a flow thread until the column heights settle:
//! - Initial pass: column heights reset, content laid out, heights guessed
//! - Balancing passes: content laid out again, heights stretched by the
//!   smallest space shortage, until nothing changes
//!
//! Converging normally takes one or two extra passes. The number of extra
//! passes is capped (by default one more than the column count) so a
//! misbehaving content layouter cannot loop forever.

use crate::style::MulticolStyle;
use crate::tree::BoxTree;
use crate::utils::error::Result;

use super::flow_thread::FlowThread;

/// Lays out the content of a flow thread for one pass.
///
/// Implementations walk the content in flow order and report what they
/// find through the flow thread's pagination hooks: spanners, forced breaks,
/// unbreakable content and space shortages.
#[cfg_attr(test, mockall::automock)]
pub trait FlowContentLayouter {
    /// Lay out the content once. Returns the block size of the content in
    /// the flow thread.
    fn layout_flow_content(&mut self, tree: &BoxTree, flow_thread: &mut FlowThread) -> Result<f32>;
}

/// Balancing configuration
#[derive(Debug, Clone, Default)]
pub struct BalanceConfig {
    /// Maximum balancing passes after the initial one. `None` allows one
    /// more than the used column count.
    pub max_passes: Option<usize>,
}

/// Balancing statistics
#[derive(Debug, Clone, Default)]
pub struct BalanceStats {
    /// Layout passes run, over all layouts
    pub passes: usize,
    /// Passes that ended with a column height change
    pub height_changes: usize,
    /// Column height of every row after the last layout, in order
    pub column_heights: Vec<f32>,
    /// Layouts that hit the pass cap
    pub bailouts: usize,
}

/// Result of one multicol layout
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOutcome {
    /// Layout passes run
    pub passes: usize,
    /// Whether the heights settled within the pass cap
    pub converged: bool,
    /// Block size of the flow content
    pub flow_logical_height: f32,
    /// Block size of the multicol container's content box
    pub content_logical_height: f32,
    pub column_count: u32,
}

/// Drives layout passes for multicol containers
pub struct MulticolLayout {
    config: BalanceConfig,
    stats: BalanceStats,
}

impl MulticolLayout {
    pub fn new(config: BalanceConfig) -> Self {
        Self {
            config,
            stats: BalanceStats::default(),
        }
    }

    pub fn config(&self) -> &BalanceConfig {
        &self.config
    }

    pub fn stats(&self) -> &BalanceStats {
        &self.stats
    }

    /// Lay out `flow_thread` for a container `available_width` wide,
    /// re-running `layouter` until column heights settle
    pub fn run(
        &mut self,
        flow_thread: &mut FlowThread,
        tree: &BoxTree,
        style: &MulticolStyle,
        available_width: f32,
        layouter: &mut dyn FlowContentLayouter,
    ) -> Result<LayoutOutcome> {
        style.validate()?;

        let mut passes = 0;
        let mut balancing_passes = 0;
        let converged = loop {
            flow_thread.layout_columns(style, available_width);
            let flow_logical_height = layouter.layout_flow_content(tree, flow_thread)?;
            flow_thread.finish_layout(flow_logical_height);
            passes += 1;

            if !flow_thread.recalculate_column_heights() {
                break true;
            }
            self.stats.height_changes += 1;

            let max_passes = self
                .config
                .max_passes
                .unwrap_or(flow_thread.column_count() as usize + 1);
            if balancing_passes >= max_passes {
                log::warn!(
                    "Column balancing for {} did not settle after {} passes; keeping current heights",
                    flow_thread.root(),
                    passes
                );
                flow_thread.abandon_balancing();
                self.stats.bailouts += 1;
                break false;
            }
            balancing_passes += 1;
        };

        let content_logical_height = flow_thread.place_column_boxes();
        self.stats.passes += passes;
        self.stats.column_heights = flow_thread
            .column_sets()
            .flat_map(|set| set.fragmentainer_groups().iter().map(|group| group.column_height()))
            .collect();

        log::debug!(
            "Laid out flow thread {} in {} passes: {} columns, content height {}",
            flow_thread.root(),
            passes,
            flow_thread.column_count(),
            content_logical_height
        );

        Ok(LayoutOutcome {
            passes,
            converged,
            flow_logical_height: flow_thread.logical_height(),
            content_logical_height,
            column_count: flow_thread.column_count(),
        })
    }
}

impl Default for MulticolLayout {
    fn default() -> Self {
        Self::new(BalanceConfig::default())
    }
}
