//! Content layout into flow threads

pub mod block_flow;

pub use block_flow::{BlockFlowLayouter, LineMetrics, Placement};
