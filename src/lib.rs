//! # Binix Multicol - Multi-column Fragmentation Engine
//!
//! Lays out the content of CSS multi-column containers: a container's
//! in-flow content forms a single flow thread that is sliced into columns,
//! interrupted by `column-span: all` spanners, and balanced over repeated
//! layout passes. The same machinery drives paginated roots.
//!
//! ## Architecture
//!
//! The engine is organized into the following core modules:
//!
//! - **multicol**: Flow threads, column sets, fragmentainer groups, spanner
//!   placeholders, structural reconciliation and the balancing driver
//! - **layout**: Block flow content layouter feeding the flow thread
//! - **tree**: Arena-backed box tree the flow thread observes
//! - **style**: Computed box and column properties
//! - **geometry**: Points, sizes and rectangles
//! - **devtools**: Column inspector snapshots
//! - **utils**: Shared utilities, logging and error types

pub mod devtools;
pub mod geometry;
pub mod layout;
pub mod multicol;
pub mod style;
pub mod tree;
pub mod utils;

// Re-export main types for convenience
pub use layout::BlockFlowLayouter;
pub use multicol::{FlowThread, FlowThreadConfig, MulticolLayout};
pub use tree::BoxTree;
pub use utils::error::{MulticolError, Result};

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Binix Multicol";
