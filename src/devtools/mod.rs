//! Developer tools for multicol layout
//!
//! - Column inspector: JSON snapshots of column sets, spanner placeholders
//!   and their balancing state

mod inspector;

pub use inspector::ColumnInspector;
