//! Error types for the multicol engine

use indextree::NodeId;
use thiserror::Error;

/// Main error type for multicol operations
#[derive(Debug, Error)]
pub enum MulticolError {
    /// The multicol style cannot produce a column layout
    #[error("Invalid multicol style: {0}")]
    InvalidStyle(String),
    /// Box tree errors
    #[error("Box tree error: {0}")]
    Tree(#[from] TreeError),
    /// A structural invariant of the column box sequence does not hold
    #[error("Column box invariant violated: {0}")]
    Invariant(String),
    /// The node is not part of the flow thread
    #[error("Node {0} is not in the flow thread")]
    NotInFlowThread(NodeId),
}

/// Box tree specific errors
#[derive(Debug, Error)]
pub enum TreeError {
    /// The node was removed from the arena
    #[error("node {0} has been removed")]
    Removed(NodeId),
    /// Text nodes are leaves
    #[error("text node {0} cannot have children")]
    TextHasChildren(NodeId),
    /// Arena level failure (e.g. appending an ancestor to its descendant)
    #[error("{0}")]
    Arena(String),
}

/// Result type alias for multicol operations
pub type Result<T> = std::result::Result<T, MulticolError>;
