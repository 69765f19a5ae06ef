//! Arena-backed box tree
//!
//! The tree the flow thread observes: element boxes carrying a [`BoxStyle`]
//! and text runs made of unbreakable lines. Nodes live in an
//! [`indextree::Arena`], so ids stay valid across re-parenting and the flow
//! thread can refer to boxes by [`NodeId`] without borrowing the tree.

use indextree::{Arena, NodeId};

use crate::style::{BoxStyle, Position};
use crate::utils::error::{Result, TreeError};

/// What a node holds
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element { tag: String },
    /// A run of text laid out as `lines` unbreakable lines
    Text { lines: usize, line_height: f32 },
}

/// A node of the box tree
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub kind: NodeKind,
    pub style: BoxStyle,
}

/// The box tree
#[derive(Debug)]
pub struct BoxTree {
    arena: Arena<LayoutNode>,
    root: NodeId,
}

impl BoxTree {
    /// Create a tree with an empty block root
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(LayoutNode {
            kind: NodeKind::Element {
                tag: "#root".to_string(),
            },
            style: BoxStyle::block(),
        });
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str, style: BoxStyle) -> NodeId {
        self.arena.new_node(LayoutNode {
            kind: NodeKind::Element {
                tag: tag.to_string(),
            },
            style,
        })
    }

    /// Create a detached text run
    pub fn create_text(&mut self, lines: usize, line_height: f32) -> NodeId {
        self.arena.new_node(LayoutNode {
            kind: NodeKind::Text { lines, line_height },
            style: BoxStyle::inline(),
        })
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_can_have_children(parent)?;
        self.check_live(child)?;
        parent
            .checked_append(child, &mut self.arena)
            .map_err(|e| TreeError::Arena(e.to_string()))?;
        Ok(())
    }

    /// Insert `child` as the previous sibling of `reference`
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> Result<()> {
        self.check_live(reference)?;
        self.check_live(child)?;
        if let Some(parent) = self.parent(reference) {
            self.check_can_have_children(parent)?;
        }
        reference
            .checked_insert_before(child, &mut self.arena)
            .map_err(|e| TreeError::Arena(e.to_string()))?;
        Ok(())
    }

    /// Create an element and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str, style: BoxStyle) -> Result<NodeId> {
        let node = self.create_element(tag, style);
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Create a text run and append it to `parent`
    pub fn append_text(&mut self, parent: NodeId, lines: usize, line_height: f32) -> Result<NodeId> {
        let node = self.create_text(lines, line_height);
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Unlink a subtree from its parent, keeping it for re-insertion
    pub fn detach(&mut self, node: NodeId) -> Result<()> {
        self.check_live(node)?;
        node.detach(&mut self.arena);
        Ok(())
    }

    /// Remove a subtree from the arena
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        self.check_live(node)?;
        node.remove_subtree(&mut self.arena);
        Ok(())
    }

    /// Whether the id refers to a live node
    pub fn contains(&self, node: NodeId) -> bool {
        self.arena.get(node).is_some_and(|n| !n.is_removed())
    }

    pub fn node(&self, node: NodeId) -> &LayoutNode {
        self.arena[node].get()
    }

    pub fn style(&self, node: NodeId) -> &BoxStyle {
        &self.node(node).style
    }

    /// Replace a node's style, returning the old one
    pub fn set_style(&mut self, node: NodeId, style: BoxStyle) -> Result<BoxStyle> {
        self.check_live(node)?;
        let data = self.arena[node].get_mut();
        Ok(std::mem::replace(&mut data.style, style))
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Text { .. } => None,
        }
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.node(node).kind, NodeKind::Text { .. })
    }

    /// Element box that is not inline-level
    pub fn is_block_level_box(&self, node: NodeId) -> bool {
        let style = self.style(node);
        !self.is_text(node) && style.display.generates_box() && !style.display.is_inline()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].parent()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].first_child()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].last_child()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].next_sibling()
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].previous_sibling()
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.children(&self.arena)
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.ancestors(&self.arena).skip(1)
    }

    /// Strict descendant check
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Next node in pre-order, not leaving `stay_within`
    pub fn next_in_pre_order(&self, node: NodeId, stay_within: Option<NodeId>) -> Option<NodeId> {
        self.first_child(node)
            .or_else(|| self.next_in_pre_order_after_children(node, stay_within))
    }

    /// Next node in pre-order after `node`'s subtree, not leaving `stay_within`
    pub fn next_in_pre_order_after_children(
        &self,
        node: NodeId,
        stay_within: Option<NodeId>,
    ) -> Option<NodeId> {
        if Some(node) == stay_within {
            return None;
        }
        let mut current = node;
        loop {
            if let Some(next) = self.next_sibling(current) {
                return Some(next);
            }
            current = self.parent(current)?;
            if Some(current) == stay_within {
                return None;
            }
        }
    }

    /// Previous node in pre-order. May return `stay_within` itself, never
    /// anything outside it.
    pub fn previous_in_pre_order(&self, node: NodeId, stay_within: Option<NodeId>) -> Option<NodeId> {
        if Some(node) == stay_within {
            return None;
        }
        match self.previous_sibling(node) {
            Some(mut previous) => {
                while let Some(last) = self.last_child(previous) {
                    previous = last;
                }
                Some(previous)
            }
            None => self.parent(node),
        }
    }

    /// The box establishing the containing block of `node`.
    ///
    /// Fixed positioned boxes belong to the viewport, which is outside the
    /// tree, so they answer `None`.
    pub fn containing_block(&self, node: NodeId) -> Option<NodeId> {
        match self.style(node).position {
            Position::Fixed => None,
            Position::Absolute => self
                .ancestors(node)
                .find(|&a| self.style(a).position != Position::Static)
                .or_else(|| (node != self.root).then_some(self.root)),
            Position::Static | Position::Relative => self
                .ancestors(node)
                .find(|&a| !self.is_text(a) && !self.style(a).display.is_inline()),
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.arena.count() - self.arena.iter().filter(|n| n.is_removed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_live(&self, node: NodeId) -> Result<()> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(TreeError::Removed(node).into())
        }
    }

    fn check_can_have_children(&self, parent: NodeId) -> Result<()> {
        self.check_live(parent)?;
        if self.is_text(parent) {
            return Err(TreeError::TextHasChildren(parent).into());
        }
        Ok(())
    }
}

impl Default for BoxTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::DisplayType;
    use crate::utils::error::MulticolError;

    /// root > [a > [a1, a2], b > [b1], c]
    fn sample() -> (BoxTree, Vec<NodeId>) {
        let mut tree = BoxTree::new();
        let root = tree.root();
        let a = tree.append_element(root, "div", BoxStyle::block()).unwrap();
        let a1 = tree.append_text(a, 1, 20.0).unwrap();
        let a2 = tree.append_text(a, 1, 20.0).unwrap();
        let b = tree.append_element(root, "div", BoxStyle::block()).unwrap();
        let b1 = tree.append_text(b, 1, 20.0).unwrap();
        let c = tree.append_element(root, "div", BoxStyle::block()).unwrap();
        (tree, vec![root, a, a1, a2, b, b1, c])
    }

    #[test]
    fn test_pre_order_walk() {
        let (tree, nodes) = sample();
        let root = nodes[0];
        let mut walked = Vec::new();
        let mut current = tree.next_in_pre_order(root, Some(root));
        while let Some(node) = current {
            walked.push(node);
            current = tree.next_in_pre_order(node, Some(root));
        }
        assert_eq!(walked, nodes[1..].to_vec());
    }

    #[test]
    fn test_next_after_children_skips_subtree() {
        let (tree, nodes) = sample();
        let (root, a, b, c) = (nodes[0], nodes[1], nodes[4], nodes[6]);
        assert_eq!(tree.next_in_pre_order_after_children(a, Some(root)), Some(b));
        assert_eq!(tree.next_in_pre_order_after_children(c, Some(root)), None);
        assert_eq!(tree.next_in_pre_order_after_children(a, Some(a)), None);
    }

    #[test]
    fn test_previous_in_pre_order() {
        let (tree, nodes) = sample();
        let (root, a, a2, b, b1, c) = (nodes[0], nodes[1], nodes[3], nodes[4], nodes[5], nodes[6]);
        assert_eq!(tree.previous_in_pre_order(b, Some(root)), Some(a2));
        assert_eq!(tree.previous_in_pre_order(c, Some(root)), Some(b1));
        assert_eq!(tree.previous_in_pre_order(a, Some(root)), Some(root));
        assert_eq!(tree.previous_in_pre_order(root, Some(root)), None);
    }

    #[test]
    fn test_text_cannot_have_children() {
        let (mut tree, nodes) = sample();
        let text = nodes[2];
        let child = tree.create_element("div", BoxStyle::block());
        let err = tree.append_child(text, child).unwrap_err();
        assert!(matches!(err, MulticolError::Tree(TreeError::TextHasChildren(_))));
    }

    #[test]
    fn test_removed_node_is_rejected() {
        let (mut tree, nodes) = sample();
        let b = nodes[4];
        tree.remove(b).unwrap();
        assert!(!tree.contains(b));
        assert!(!tree.contains(nodes[5]));
        assert!(tree.detach(b).is_err());
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_containing_block() {
        let mut tree = BoxTree::new();
        let root = tree.root();
        let positioned = tree
            .append_element(
                root,
                "div",
                BoxStyle {
                    position: Position::Relative,
                    ..Default::default()
                },
            )
            .unwrap();
        let span = tree.append_element(positioned, "span", BoxStyle::inline()).unwrap();
        let block = tree.append_element(span, "div", BoxStyle::block()).unwrap();
        let abspos = tree
            .append_element(
                block,
                "div",
                BoxStyle {
                    position: Position::Absolute,
                    ..Default::default()
                },
            )
            .unwrap();
        let fixed = tree
            .append_element(
                block,
                "div",
                BoxStyle {
                    position: Position::Fixed,
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(tree.containing_block(block), Some(positioned));
        assert_eq!(tree.containing_block(abspos), Some(positioned));
        assert_eq!(tree.containing_block(fixed), None);
        assert_eq!(tree.containing_block(root), None);
    }

    #[test]
    fn test_set_style_returns_old() {
        let (mut tree, nodes) = sample();
        let old = tree
            .set_style(
                nodes[1],
                BoxStyle {
                    display: DisplayType::Flex,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(old.display, DisplayType::Block);
        assert_eq!(tree.style(nodes[1]).display, DisplayType::Flex);
    }
}
