//! Box tree observed by the flow thread

pub mod box_tree;

pub use box_tree::{BoxTree, LayoutNode, NodeKind};
pub use indextree::NodeId;
