//! Keeping the column box list in step with the box tree
//!
//! Column sets and spanner placeholders are derived from the content:
//!
//! - every maximal stretch of column content without a spanner in between
//!   gets exactly one column set, so two sets are never adjacent;
//! - every valid spanner gets exactly one placeholder, in document order.
//!
//! The box tree owner reports each mutation (subtree inserted, subtree about
//! to be removed, style change) and the flow thread creates, destroys,
//! splits or merges column boxes so both rules keep holding.

use std::iter;

use indextree::NodeId;

use crate::style::{BoxStyle, ColumnSpan};
use crate::tree::BoxTree;
use crate::utils::error::{MulticolError, Result};

use super::column_set::ColumnSet;
use super::flow_thread::{ColumnBox, ColumnBoxId, FlowThread};
use super::invalidation::{InvalidationReason, InvalidationTarget};
use super::spanner_placeholder::SpannerPlaceholder;

/// State carried from the start of a style change to its end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingStyleChange {
    reinsert_subtree: bool,
    toggle_spanners_if_needed: bool,
}

/// Whether the change decides which boxes of the subtree are column content,
/// so the subtree has to be taken out under the old style and put back under
/// the new one.
fn changes_column_content(old_style: &BoxStyle, new_style: &BoxStyle) -> bool {
    old_style.position != new_style.position
        || old_style.display.generates_box() != new_style.display.generates_box()
        || old_style.multicol != new_style.multicol
        || old_style.foreign != new_style.foreign
}

impl FlowThread {
    /// Build the column box list for the container's current content
    pub fn populate(&mut self, tree: &BoxTree) {
        self.being_evacuated = false;
        let children: Vec<NodeId> = tree.children(self.root).collect();
        for child in children {
            if self.is_column_content(tree, child) {
                // Siblings after `child` are not registered yet; append.
                self.insert_subtree(tree, child, None);
            }
        }
        log::debug!(
            "Populated flow thread {} with {} column boxes",
            self.root,
            self.column_boxes.len()
        );
    }

    /// Tear down every column box. Notifications are ignored until the flow
    /// thread is populated again.
    pub fn evacuate(&mut self) {
        self.being_evacuated = true;
        self.column_boxes.clear();
        self.spanner_placeholders.clear();
        self.invalidations.invalidate_column_sets();
        log::debug!("Evacuated flow thread {}", self.root);
    }

    pub fn is_being_evacuated(&self) -> bool {
        self.being_evacuated
    }

    /// A subtree rooted at `descendant` was inserted into the container
    pub fn descendant_was_inserted(&mut self, tree: &BoxTree, descendant: NodeId) {
        if self.being_evacuated || !self.is_column_content(tree, descendant) {
            return;
        }
        let object_after_subtree = self.next_column_content_after_children(tree, descendant);
        self.insert_subtree(tree, descendant, object_after_subtree);
        debug_assert!(self.has_no_adjacent_column_sets());
    }

    /// The subtree rooted at `descendant` is about to be removed. Call while
    /// it is still attached.
    pub fn descendant_will_be_removed(&mut self, tree: &BoxTree, descendant: NodeId) {
        if self.being_evacuated || !self.is_column_content(tree, descendant) {
            return;
        }
        let had_containing_placeholder = self.containing_column_spanner_placeholder(tree, descendant).is_some();

        let mut current = Some(descendant);
        while let Some(node) = current {
            if node != descendant && self.should_skip_child(tree, node) {
                current = tree.next_in_pre_order_after_children(node, Some(descendant));
                continue;
            }
            if let Some(&id) = self.spanner_placeholders.get(&node) {
                // A spanner's own descendants are of no interest.
                current = tree.next_in_pre_order_after_children(node, Some(descendant));
                self.destroy_spanner_placeholder(id);
                continue;
            }
            current = tree.next_in_pre_order(node, Some(descendant));
        }

        if had_containing_placeholder {
            // Content inside a spanner never had a column set.
            return;
        }

        let mut adjacent_previous_placeholder = None;
        if let Some(previous) = self.previous_column_content(tree, descendant) {
            adjacent_previous_placeholder = self.containing_column_spanner_placeholder(tree, previous);
            if adjacent_previous_placeholder.is_none() {
                // Preceded by column content; the set stays.
                return;
            }
        }
        let mut adjacent_next_placeholder = None;
        if let Some(next) = self.next_column_content_after_children(tree, descendant) {
            adjacent_next_placeholder = self.containing_column_spanner_placeholder(tree, next);
            if adjacent_next_placeholder.is_none() {
                return;
            }
        }

        // The removed content was all that kept a set alive. Find it from the
        // neighbouring placeholders.
        let set_index = match (adjacent_previous_placeholder, adjacent_next_placeholder) {
            (_, Some(next)) => self.index_of(next).and_then(|index| index.checked_sub(1)),
            (Some(previous), None) => self.index_of(previous).map(|index| index + 1),
            (None, None) => self.column_boxes.iter().position(ColumnBox::is_column_set),
        };
        let Some(index) = set_index.filter(|&index| {
            self.column_boxes
                .get(index)
                .is_some_and(ColumnBox::is_column_set)
        }) else {
            log::warn!("No column set to remove for {}", descendant);
            return;
        };
        let removed = self.column_boxes.remove(index);
        log::debug!("Removed empty column set {}", removed.id());
        self.invalidations.invalidate_column_sets();
    }

    /// Begin a style change on `node`. The style in `tree` must still be the
    /// old one.
    pub fn descendant_style_will_change(
        &mut self,
        tree: &BoxTree,
        node: NodeId,
        new_style: &BoxStyle,
    ) -> PendingStyleChange {
        let old_style = tree.style(node);
        if changes_column_content(old_style, new_style) {
            self.descendant_will_be_removed(tree, node);
            return PendingStyleChange {
                reinsert_subtree: true,
                ..Default::default()
            };
        }
        PendingStyleChange {
            reinsert_subtree: false,
            toggle_spanners_if_needed: true,
        }
    }

    /// Finish a style change on `node`. The style in `tree` is the new one.
    pub fn descendant_style_did_change(
        &mut self,
        tree: &BoxTree,
        node: NodeId,
        old_style: &BoxStyle,
        pending: PendingStyleChange,
    ) {
        if self.being_evacuated {
            return;
        }
        if pending.reinsert_subtree {
            // Whatever is column content under the new style gets its boxes
            // back. Nothing happens if the subtree left the flow thread.
            self.descendant_was_inserted(tree, node);
            return;
        }
        if self.spanner_placeholders.contains_key(&node) {
            self.remove_spanner_placeholder_if_no_longer_valid(tree, node);
            return;
        }
        if !self.is_column_content(tree, node)
            || self.containing_column_spanner_placeholder(tree, node).is_some()
        {
            return;
        }
        if self.descendant_is_valid_column_spanner(tree, node) {
            // Regular column content turned into a spanner.
            self.descendant_will_be_removed(tree, node);
            let insert_before = self.next_column_content_after_children(tree, node);
            self.create_and_insert_spanner_placeholder(tree, node, insert_before);
            return;
        }
        if pending.toggle_spanners_if_needed
            && old_style.can_contain_spanners() != tree.style(node).can_contain_spanners()
        {
            self.toggle_spanners_in_subtree(tree, node);
        }
    }

    /// Restyle `node` and reconcile the column boxes around the change
    pub fn update_descendant_style(&mut self, tree: &mut BoxTree, node: NodeId, style: BoxStyle) -> Result<()> {
        let pending = self.descendant_style_will_change(tree, node, &style);
        let old_style = tree.set_style(node, style)?;
        self.descendant_style_did_change(tree, node, &old_style, pending);
        Ok(())
    }

    /// The placeholder of the spanner containing `descendant` (or being it)
    pub fn containing_column_spanner_placeholder(&self, tree: &BoxTree, descendant: NodeId) -> Option<ColumnBoxId> {
        if !self.has_any_column_spanners() {
            return None;
        }
        iter::once(descendant)
            .chain(tree.ancestors(descendant))
            .take_while(|&node| node != self.root)
            .find_map(|node| self.spanner_placeholders.get(&node).copied())
    }

    /// The column set holding `descendant`. `None` for spanners, content
    /// inside spanners and anything that is not column content.
    pub fn map_descendant_to_column_set(&self, tree: &BoxTree, descendant: NodeId) -> Option<ColumnBoxId> {
        if !self.is_column_content(tree, descendant)
            || self.containing_column_spanner_placeholder(tree, descendant).is_some()
        {
            return None;
        }
        let mut sets = self.column_sets();
        let first = sets.next()?;
        if sets.next().is_none() {
            return Some(first.id());
        }

        // Walk each set's stretch of content. Only needed once spanners
        // split the content, which is uncommon.
        for (index, column_box) in self.column_boxes.iter().enumerate() {
            let ColumnBox::Set(set) = column_box else {
                continue;
            };
            let first_in_set = match index.checked_sub(1).map(|i| &self.column_boxes[i]) {
                Some(ColumnBox::Spanner(placeholder)) => {
                    tree.next_in_pre_order_after_children(placeholder.spanner(), Some(self.root))
                }
                _ => tree.first_child(self.root),
            };
            let last_in_set = match self.column_boxes.get(index + 1) {
                Some(ColumnBox::Spanner(placeholder)) => {
                    match tree.previous_in_pre_order(placeholder.spanner(), Some(self.root)) {
                        Some(last) if last == self.root => continue,
                        last => last,
                    }
                }
                _ => None,
            };
            let mut walker = first_in_set;
            while let Some(node) = walker {
                if node == descendant {
                    return Some(set.id());
                }
                if Some(node) == last_in_set {
                    break;
                }
                walker = tree.next_in_pre_order(node, Some(self.root));
            }
        }
        None
    }

    /// Whether `descendant` qualifies as a spanner of this flow thread
    pub fn descendant_is_valid_column_spanner(&self, tree: &BoxTree, descendant: NodeId) -> bool {
        if !self.config.allows_spanners || !self.is_column_content(tree, descendant) {
            return false;
        }
        let style = tree.style(descendant);
        if style.column_span != ColumnSpan::All
            || !tree.is_block_level_box(descendant)
            || style.is_floating_or_out_of_flow()
        {
            return false;
        }
        let Some(containing_block) = tree.containing_block(descendant) else {
            return false;
        };
        if !tree.style(containing_block).display.is_block_flow() {
            return false;
        }

        // Every box on the containing block chain up to the container must let
        // the spanner through.
        let mut ancestor = Some(containing_block);
        while let Some(current) = ancestor {
            if current == self.root {
                return true;
            }
            if self.spanner_placeholders.contains_key(&current) {
                // No spanners inside spanners.
                return false;
            }
            if !tree.style(current).can_contain_spanners() {
                return false;
            }
            ancestor = tree.containing_block(current);
        }
        false
    }

    /// Check the structural rules of the column box list against the tree
    pub fn check_invariants(&self, tree: &BoxTree) -> Result<()> {
        let violation = |message: String| Err(MulticolError::Invariant(message));

        for pair in self.column_boxes.windows(2) {
            if pair[0].is_column_set() && pair[1].is_column_set() {
                return violation(format!("column sets {} and {} are adjacent", pair[0].id(), pair[1].id()));
            }
        }

        let placeholders: Vec<&SpannerPlaceholder> = self
            .column_boxes
            .iter()
            .filter_map(ColumnBox::as_spanner_placeholder)
            .collect();
        if placeholders.len() != self.spanner_placeholders.len() {
            return violation(format!(
                "{} placeholders but {} registered spanners",
                placeholders.len(),
                self.spanner_placeholders.len()
            ));
        }
        for placeholder in &placeholders {
            if self.spanner_placeholders.get(&placeholder.spanner()) != Some(&placeholder.id()) {
                return violation(format!("placeholder {} is not registered", placeholder.id()));
            }
            if !self.descendant_is_valid_column_spanner(tree, placeholder.spanner()) {
                return violation(format!("placeholder {} stands for an invalid spanner", placeholder.id()));
            }
        }

        let mut spanners_in_order = Vec::new();
        let mut content_per_set = vec![0usize; self.column_boxes.len()];
        let mut has_content = false;
        let mut current = tree.first_child(self.root);
        while let Some(node) = current {
            if !self.is_column_content(tree, node) {
                current = tree.next_in_pre_order_after_children(node, Some(self.root));
                continue;
            }
            has_content = true;
            if self.spanner_placeholders.contains_key(&node) {
                spanners_in_order.push(node);
                current = tree.next_in_pre_order_after_children(node, Some(self.root));
                continue;
            }
            if self.descendant_is_valid_column_spanner(tree, node) {
                return violation(format!("spanner {} has no placeholder", node));
            }
            let Some(set) = self.map_descendant_to_column_set(tree, node) else {
                return violation(format!("column content {} has no column set", node));
            };
            if let Some(index) = self.index_of(set) {
                content_per_set[index] += 1;
            }
            current = tree.next_in_pre_order(node, Some(self.root));
        }

        let placeholder_order: Vec<NodeId> = placeholders.iter().map(|p| p.spanner()).collect();
        if placeholder_order != spanners_in_order {
            return violation("placeholders are out of document order".to_string());
        }
        if !has_content && !self.column_boxes.is_empty() {
            return violation("column boxes without any content".to_string());
        }
        // The single-set shortcut maps every node to the only set.
        if self.column_sets().count() > 1 {
            for (index, column_box) in self.column_boxes.iter().enumerate() {
                if column_box.is_column_set() && content_per_set[index] == 0 {
                    return violation(format!("column set {} is empty", column_box.id()));
                }
            }
        } else if let Some(index) = self.column_boxes.iter().position(ColumnBox::is_column_set) {
            if content_per_set[index] == 0 {
                return violation(format!("column set {} is empty", self.column_boxes[index].id()));
            }
        }
        Ok(())
    }

    /// Whether `node` takes part in this flow thread: a descendant of the
    /// container, not hidden, not inside a nested multicol container or
    /// foreign content, and not positioned against something outside.
    pub(crate) fn is_column_content(&self, tree: &BoxTree, node: NodeId) -> bool {
        if node == self.root || !tree.contains(node) || !tree.is_descendant_of(node, self.root) {
            return false;
        }
        iter::once(node)
            .chain(tree.ancestors(node))
            .take_while(|&current| current != self.root)
            .all(|current| !self.should_skip_child(tree, current))
    }

    /// Local exclusion test for a node whose ancestors are column content
    fn should_skip_child(&self, tree: &BoxTree, node: NodeId) -> bool {
        let style = tree.style(node);
        if !style.display.generates_box() {
            return true;
        }
        if let Some(parent) = tree.parent(node).filter(|&parent| parent != self.root) {
            let parent_style = tree.style(parent);
            if parent_style.foreign || parent_style.multicol {
                // Foreign content or an inner flow thread.
                return true;
            }
        }
        style.is_out_of_flow() && !self.contains_containing_block_of(tree, node)
    }

    fn contains_containing_block_of(&self, tree: &BoxTree, node: NodeId) -> bool {
        tree.containing_block(node)
            .is_some_and(|block| block == self.root || tree.is_descendant_of(block, self.root))
    }

    /// The first column content after the subtree at `node`. In-flow and
    /// out-of-flow content alike lives in column sets.
    fn next_column_content_after_children(&self, tree: &BoxTree, node: NodeId) -> Option<NodeId> {
        let mut current = tree.next_in_pre_order_after_children(node, Some(self.root));
        while let Some(candidate) = current {
            if self.is_column_content(tree, candidate) {
                return Some(candidate);
            }
            // Nothing below a box that is not column content is.
            current = tree.next_in_pre_order_after_children(candidate, Some(self.root));
        }
        None
    }

    fn previous_column_content(&self, tree: &BoxTree, node: NodeId) -> Option<NodeId> {
        let mut current = tree.previous_in_pre_order(node, Some(self.root));
        while let Some(candidate) = current {
            if candidate == self.root {
                return None;
            }
            if self.is_column_content(tree, candidate) {
                return Some(candidate);
            }
            current = tree.previous_in_pre_order(candidate, Some(self.root));
        }
        None
    }

    /// Create column sets and placeholders for the subtree at `descendant`,
    /// which sits right before `object_after_subtree` in the content.
    fn insert_subtree(&mut self, tree: &BoxTree, descendant: NodeId, object_after_subtree: Option<NodeId>) {
        let mut current = Some(descendant);
        while let Some(node) = current {
            if node != descendant && self.should_skip_child(tree, node) {
                current = tree.next_in_pre_order_after_children(node, Some(descendant));
                continue;
            }
            current = tree.next_in_pre_order(node, Some(descendant));

            if self.containing_column_spanner_placeholder(tree, node).is_some() {
                // Inside a spanner; nothing to do.
                continue;
            }
            if self.descendant_is_valid_column_spanner(tree, node) {
                self.create_and_insert_spanner_placeholder(tree, node, object_after_subtree);
                continue;
            }

            // Regular column content needs a set.
            match object_after_subtree {
                Some(after) => {
                    if let Some(&placeholder) = self.spanner_placeholders.get(&after) {
                        // Inserted right before a spanner: make sure there is
                        // a set in front of its placeholder.
                        let Some(index) = self.index_of(placeholder) else {
                            continue;
                        };
                        let has_set_before = index
                            .checked_sub(1)
                            .is_some_and(|previous| self.column_boxes[previous].is_column_set());
                        if !has_set_before {
                            self.create_and_insert_column_set(index);
                        }
                    }
                    // Otherwise the content after us already has a set, which
                    // this content shares.
                }
                None => {
                    let ends_with_set = self
                        .column_boxes
                        .last()
                        .is_some_and(ColumnBox::is_column_set);
                    if !ends_with_set {
                        let index = self.column_boxes.len();
                        self.create_and_insert_column_set(index);
                    }
                }
            }
        }
    }

    fn create_and_insert_column_set(&mut self, index: usize) -> ColumnBoxId {
        let id = self.allocate_column_box_id();
        self.column_boxes.insert(index, ColumnBox::Set(ColumnSet::new(id)));
        log::debug!("Created column set {} at position {}", id, index);
        self.invalidations
            .mark(InvalidationTarget::ColumnBox(id), InvalidationReason::ColumnBoxesChanged);
        self.invalidations.invalidate_column_sets();
        id
    }

    fn create_and_insert_spanner_placeholder(
        &mut self,
        tree: &BoxTree,
        spanner: NodeId,
        inserted_before: Option<NodeId>,
    ) {
        let mut insert_index = self.column_boxes.len();
        let mut split_set = false;

        if let Some(before) = inserted_before {
            if let Some(index) = self
                .spanner_placeholders
                .get(&before)
                .and_then(|&placeholder| self.index_of(placeholder))
            {
                // Right before another spanner.
                insert_index = index;
            } else {
                // Before regular content: look at what comes before us.
                match self.previous_column_content(tree, spanner) {
                    None => insert_index = 0,
                    Some(previous) => {
                        if let Some(index) = self
                            .containing_column_spanner_placeholder(tree, previous)
                            .and_then(|placeholder| self.index_of(placeholder))
                        {
                            insert_index = index + 1;
                        } else if let Some(index) = self
                            .map_descendant_to_column_set(tree, previous)
                            .and_then(|set| self.index_of(set))
                        {
                            // In the middle of a set: split it around us.
                            insert_index = index + 1;
                            split_set = true;
                        } else {
                            log::warn!("No column box found before spanner {}", spanner);
                        }
                    }
                }
            }
        }

        let id = self.allocate_column_box_id();
        self.column_boxes
            .insert(insert_index, ColumnBox::Spanner(SpannerPlaceholder::new(id, spanner)));
        self.spanner_placeholders.insert(spanner, id);
        log::debug!("Created spanner placeholder {} for {}", id, spanner);
        self.invalidations
            .mark(InvalidationTarget::Content(spanner), InvalidationReason::SpannerChanged);

        if split_set {
            self.create_and_insert_column_set(insert_index + 1);
        } else {
            self.invalidations.invalidate_column_sets();
        }
    }

    /// Remove a placeholder, merging the sets on either side of it
    fn destroy_spanner_placeholder(&mut self, id: ColumnBoxId) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        let merge = index > 0
            && self.column_boxes[index - 1].is_column_set()
            && self
                .column_boxes
                .get(index + 1)
                .is_some_and(ColumnBox::is_column_set);
        if merge {
            let removed = self.column_boxes.remove(index + 1);
            let previous = self.column_boxes[index - 1].id();
            log::debug!("Merged column set {} into {}", removed.id(), previous);
            self.invalidations
                .mark(InvalidationTarget::ColumnBox(previous), InvalidationReason::ColumnBoxesChanged);
        }
        let removed = self.column_boxes.remove(index);
        if let ColumnBox::Spanner(placeholder) = removed {
            self.spanner_placeholders.remove(&placeholder.spanner());
            log::debug!("Destroyed spanner placeholder {} for {}", id, placeholder.spanner());
            self.invalidations.mark(
                InvalidationTarget::Content(placeholder.spanner()),
                InvalidationReason::SpannerChanged,
            );
        }
        self.invalidations.invalidate_column_sets();
        debug_assert!(self.has_no_adjacent_column_sets());
    }

    fn has_no_adjacent_column_sets(&self) -> bool {
        self.column_boxes
            .windows(2)
            .all(|pair| !(pair[0].is_column_set() && pair[1].is_column_set()))
    }

    /// Returns `true` when `spanner` lost its placeholder
    fn remove_spanner_placeholder_if_no_longer_valid(&mut self, tree: &BoxTree, spanner: NodeId) -> bool {
        if self.descendant_is_valid_column_spanner(tree, spanner) {
            return false;
        }
        let Some(&id) = self.spanner_placeholders.get(&spanner) else {
            return false;
        };
        self.destroy_spanner_placeholder(id);
        // The former spanner is column content now.
        self.descendant_was_inserted(tree, spanner);
        true
    }

    /// `descendant` gained or lost the ability to contain spanners: promote
    /// or demote the `column-span: all` boxes below it.
    fn toggle_spanners_in_subtree(&mut self, tree: &BoxTree, descendant: NodeId) {
        let mut current = tree.next_in_pre_order(descendant, Some(descendant));
        while let Some(node) = current {
            if self.should_skip_child(tree, node) || tree.is_text(node) {
                current = tree.next_in_pre_order_after_children(node, Some(descendant));
                continue;
            }
            let mut walk_children = false;
            if self.descendant_is_valid_column_spanner(tree, node) {
                if !self.spanner_placeholders.contains_key(&node) {
                    self.descendant_will_be_removed(tree, node);
                    let insert_before = self.next_column_content_after_children(tree, node);
                    self.create_and_insert_spanner_placeholder(tree, node, insert_before);
                }
            } else if let Some(&id) = self.spanner_placeholders.get(&node) {
                self.destroy_spanner_placeholder(id);
                self.descendant_was_inserted(tree, node);
            } else {
                walk_children = tree.style(node).can_contain_spanners();
            }
            current = if walk_children {
                tree.next_in_pre_order(node, Some(descendant))
            } else {
                tree.next_in_pre_order_after_children(node, Some(descendant))
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multicol::flow_thread::ColumnBoxKind::{ColumnSet as S, SpannerPlaceholder as P};
    use crate::style::{DisplayType, Float, Position};
    use pretty_assertions::assert_eq;

    fn container() -> (BoxTree, FlowThread) {
        let tree = BoxTree::new();
        let flow_thread = FlowThread::multicol(tree.root());
        (tree, flow_thread)
    }

    fn block(tree: &mut BoxTree, parent: NodeId) -> NodeId {
        tree.append_element(parent, "div", BoxStyle::block()).unwrap()
    }

    fn spanner(tree: &mut BoxTree, parent: NodeId) -> NodeId {
        tree.append_element(parent, "h2", BoxStyle::spanner()).unwrap()
    }

    fn insert(tree: &BoxTree, flow_thread: &mut FlowThread, node: NodeId) {
        flow_thread.descendant_was_inserted(tree, node);
        flow_thread.check_invariants(tree).unwrap();
    }

    #[test]
    fn test_populate_content_and_spanner() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let first = block(&mut tree, root);
        let heading = spanner(&mut tree, root);
        let second = block(&mut tree, root);
        flow_thread.populate(&tree);

        assert_eq!(flow_thread.signature(), vec![S, P, S]);
        flow_thread.check_invariants(&tree).unwrap();
        let sets: Vec<ColumnBoxId> = flow_thread.column_sets().map(ColumnSet::id).collect();
        assert_eq!(flow_thread.map_descendant_to_column_set(&tree, first), Some(sets[0]));
        assert_eq!(flow_thread.map_descendant_to_column_set(&tree, second), Some(sets[1]));
        assert_eq!(flow_thread.map_descendant_to_column_set(&tree, heading), None);
        assert!(flow_thread.containing_column_spanner_placeholder(&tree, heading).is_some());
    }

    #[test]
    fn test_insert_spanner_splits_set() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let first = block(&mut tree, root);
        let last = block(&mut tree, root);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![S]);

        let heading = tree.create_element("h2", BoxStyle::spanner());
        tree.insert_before(last, heading).unwrap();
        insert(&tree, &mut flow_thread, heading);
        assert_eq!(flow_thread.signature(), vec![S, P, S]);
        assert_ne!(
            flow_thread.map_descendant_to_column_set(&tree, first),
            flow_thread.map_descendant_to_column_set(&tree, last)
        );
    }

    #[test]
    fn test_insert_before_and_after_spanner() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let heading = spanner(&mut tree, root);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![P]);

        let before = tree.create_element("div", BoxStyle::block());
        tree.insert_before(heading, before).unwrap();
        insert(&tree, &mut flow_thread, before);
        assert_eq!(flow_thread.signature(), vec![S, P]);

        let after = block(&mut tree, root);
        insert(&tree, &mut flow_thread, after);
        assert_eq!(flow_thread.signature(), vec![S, P, S]);

        // Idempotent.
        insert(&tree, &mut flow_thread, after);
        insert(&tree, &mut flow_thread, heading);
        assert_eq!(flow_thread.signature(), vec![S, P, S]);
    }

    #[test]
    fn test_adjacent_spanners() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        block(&mut tree, root);
        spanner(&mut tree, root);
        spanner(&mut tree, root);
        block(&mut tree, root);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![S, P, P, S]);
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_remove_spanner_merges_sets() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let first = block(&mut tree, root);
        let heading = spanner(&mut tree, root);
        let last = block(&mut tree, root);
        flow_thread.populate(&tree);
        flow_thread.invalidations.clear();

        flow_thread.descendant_will_be_removed(&tree, heading);
        tree.remove(heading).unwrap();
        flow_thread.check_invariants(&tree).unwrap();
        assert_eq!(flow_thread.signature(), vec![S]);
        assert_eq!(
            flow_thread.map_descendant_to_column_set(&tree, first),
            flow_thread.map_descendant_to_column_set(&tree, last)
        );
        assert!(flow_thread.invalidations().column_sets_invalidated());
        assert!(flow_thread
            .invalidations()
            .is_dirty(InvalidationTarget::Content(heading)));
    }

    #[test]
    fn test_remove_content_between_spanners() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        spanner(&mut tree, root);
        let middle = block(&mut tree, root);
        spanner(&mut tree, root);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![P, S, P]);

        flow_thread.descendant_will_be_removed(&tree, middle);
        tree.remove(middle).unwrap();
        assert_eq!(flow_thread.signature(), vec![P, P]);
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_remove_all_content() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let only = block(&mut tree, root);
        block(&mut tree, only);
        flow_thread.populate(&tree);
        flow_thread.descendant_will_be_removed(&tree, only);
        tree.remove(only).unwrap();
        assert!(flow_thread.column_boxes().is_empty());
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_nested_spanner_in_block() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let wrapper = block(&mut tree, root);
        block(&mut tree, wrapper);
        let heading = spanner(&mut tree, wrapper);
        block(&mut tree, wrapper);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![S, P, S]);
        assert!(flow_thread.spanner_placeholder(heading).is_some());
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_invalid_spanners_are_content() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let floating = tree
            .append_element(
                root,
                "div",
                BoxStyle {
                    float: Float::Left,
                    ..Default::default()
                },
            )
            .unwrap();
        spanner(&mut tree, floating);
        let inline_block = tree.append_element(root, "button", BoxStyle::for_tag("button")).unwrap();
        spanner(&mut tree, inline_block);
        let nested = tree
            .append_element(
                root,
                "div",
                BoxStyle {
                    multicol: true,
                    ..Default::default()
                },
            )
            .unwrap();
        let inner = spanner(&mut tree, nested);
        let positioned = tree
            .append_element(
                root,
                "h2",
                BoxStyle {
                    position: Position::Absolute,
                    ..BoxStyle::spanner()
                },
            )
            .unwrap();
        flow_thread.populate(&tree);

        assert_eq!(flow_thread.signature(), vec![S]);
        assert!(!flow_thread.descendant_is_valid_column_spanner(&tree, inner));
        assert!(!flow_thread.descendant_is_valid_column_spanner(&tree, positioned));
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_spanner_inside_spanner_is_not_a_spanner() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let outer = spanner(&mut tree, root);
        let inner = spanner(&mut tree, outer);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![P]);
        assert!(!flow_thread.descendant_is_valid_column_spanner(&tree, inner));
        assert_eq!(
            flow_thread.containing_column_spanner_placeholder(&tree, inner),
            flow_thread.spanner_placeholder(outer).map(SpannerPlaceholder::id)
        );
    }

    #[test]
    fn test_style_change_promotes_and_demotes_spanner() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        block(&mut tree, root);
        let middle = block(&mut tree, root);
        block(&mut tree, root);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![S]);

        flow_thread
            .update_descendant_style(&mut tree, middle, BoxStyle::spanner())
            .unwrap();
        assert_eq!(flow_thread.signature(), vec![S, P, S]);
        flow_thread.check_invariants(&tree).unwrap();

        flow_thread
            .update_descendant_style(&mut tree, middle, BoxStyle::block())
            .unwrap();
        assert_eq!(flow_thread.signature(), vec![S]);
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_spanner_going_out_of_flow() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        block(&mut tree, root);
        let heading = spanner(&mut tree, root);
        block(&mut tree, root);
        flow_thread.populate(&tree);

        let absolute = BoxStyle {
            position: Position::Absolute,
            ..BoxStyle::spanner()
        };
        flow_thread.update_descendant_style(&mut tree, heading, absolute).unwrap();
        assert_eq!(flow_thread.signature(), vec![S]);
        flow_thread.check_invariants(&tree).unwrap();

        flow_thread
            .update_descendant_style(&mut tree, heading, BoxStyle::spanner())
            .unwrap();
        assert_eq!(flow_thread.signature(), vec![S, P, S]);
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_display_none_removes_and_restores() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let only = block(&mut tree, root);
        flow_thread.populate(&tree);

        let hidden = BoxStyle {
            display: DisplayType::None,
            ..Default::default()
        };
        flow_thread.update_descendant_style(&mut tree, only, hidden).unwrap();
        assert!(flow_thread.column_boxes().is_empty());

        flow_thread.update_descendant_style(&mut tree, only, BoxStyle::block()).unwrap();
        assert_eq!(flow_thread.signature(), vec![S]);
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_ancestor_toggles_spanners() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        block(&mut tree, root);
        let wrapper = block(&mut tree, root);
        let heading = spanner(&mut tree, wrapper);
        block(&mut tree, root);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![S, P, S]);

        let floated = BoxStyle {
            float: Float::Right,
            ..Default::default()
        };
        flow_thread.update_descendant_style(&mut tree, wrapper, floated).unwrap();
        assert_eq!(flow_thread.signature(), vec![S]);
        assert!(flow_thread.spanner_placeholder(heading).is_none());
        flow_thread.check_invariants(&tree).unwrap();

        flow_thread.update_descendant_style(&mut tree, wrapper, BoxStyle::block()).unwrap();
        assert_eq!(flow_thread.signature(), vec![S, P, S]);
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_evacuate_ignores_notifications() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        block(&mut tree, root);
        flow_thread.populate(&tree);
        flow_thread.evacuate();
        assert!(flow_thread.is_being_evacuated());
        assert!(flow_thread.column_boxes().is_empty());

        let late = block(&mut tree, root);
        flow_thread.descendant_was_inserted(&tree, late);
        assert!(flow_thread.column_boxes().is_empty());

        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![S]);
    }

    #[test]
    fn test_foreign_content_is_skipped() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let svg = tree.append_element(root, "svg", BoxStyle::for_tag("svg")).unwrap();
        let inside = spanner(&mut tree, svg);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![S]);
        assert!(!flow_thread.is_column_content(&tree, inside));
        assert_eq!(flow_thread.map_descendant_to_column_set(&tree, inside), None);
    }

    #[test]
    fn test_wrapper_becoming_multicol_drops_inner_spanners() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        block(&mut tree, root);
        let wrapper = block(&mut tree, root);
        let heading = spanner(&mut tree, wrapper);
        block(&mut tree, root);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![S, P, S]);

        let nested = BoxStyle {
            multicol: true,
            ..BoxStyle::block()
        };
        flow_thread.update_descendant_style(&mut tree, wrapper, nested).unwrap();
        assert_eq!(flow_thread.signature(), vec![S]);
        assert!(flow_thread.spanner_placeholder(heading).is_none());
        flow_thread.check_invariants(&tree).unwrap();

        flow_thread.update_descendant_style(&mut tree, wrapper, BoxStyle::block()).unwrap();
        assert_eq!(flow_thread.signature(), vec![S, P, S]);
        assert!(flow_thread.spanner_placeholder(heading).is_some());
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_wrapper_becoming_foreign_drops_inner_spanners() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let wrapper = block(&mut tree, root);
        let heading = spanner(&mut tree, wrapper);
        block(&mut tree, root);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![S, P, S]);

        let foreign = BoxStyle {
            foreign: true,
            ..BoxStyle::block()
        };
        flow_thread.update_descendant_style(&mut tree, wrapper, foreign).unwrap();
        assert_eq!(flow_thread.signature(), vec![S]);
        assert!(!flow_thread.is_column_content(&tree, heading));
        flow_thread.check_invariants(&tree).unwrap();

        flow_thread.update_descendant_style(&mut tree, wrapper, BoxStyle::block()).unwrap();
        assert_eq!(flow_thread.signature(), vec![S, P, S]);
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_content_going_out_of_flow_keeps_its_set() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let only = block(&mut tree, root);
        flow_thread.populate(&tree);

        let absolute = BoxStyle {
            position: Position::Absolute,
            ..BoxStyle::block()
        };
        flow_thread.update_descendant_style(&mut tree, only, absolute).unwrap();
        assert_eq!(flow_thread.signature(), vec![S]);
        assert!(flow_thread.map_descendant_to_column_set(&tree, only).is_some());
        flow_thread.check_invariants(&tree).unwrap();

        let fixed = BoxStyle {
            position: Position::Fixed,
            ..BoxStyle::block()
        };
        flow_thread.update_descendant_style(&mut tree, only, fixed).unwrap();
        assert!(flow_thread.column_boxes().is_empty());
        flow_thread.check_invariants(&tree).unwrap();

        flow_thread.update_descendant_style(&mut tree, only, BoxStyle::block()).unwrap();
        assert_eq!(flow_thread.signature(), vec![S]);
        flow_thread.check_invariants(&tree).unwrap();
    }

    #[test]
    fn test_out_of_flow_content_is_a_neighbour() {
        let (mut tree, mut flow_thread) = container();
        let root = tree.root();
        let positioned = tree
            .append_element(
                root,
                "div",
                BoxStyle {
                    position: Position::Absolute,
                    ..BoxStyle::block()
                },
            )
            .unwrap();
        let last = block(&mut tree, root);
        flow_thread.populate(&tree);
        assert_eq!(flow_thread.signature(), vec![S]);

        flow_thread.descendant_will_be_removed(&tree, last);
        tree.remove(last).unwrap();
        assert_eq!(flow_thread.signature(), vec![S]);
        flow_thread.check_invariants(&tree).unwrap();

        let heading = spanner(&mut tree, root);
        insert(&tree, &mut flow_thread, heading);
        assert_eq!(flow_thread.signature(), vec![S, P]);

        flow_thread.descendant_will_be_removed(&tree, positioned);
        tree.remove(positioned).unwrap();
        assert_eq!(flow_thread.signature(), vec![P]);
        flow_thread.check_invariants(&tree).unwrap();
    }
}
