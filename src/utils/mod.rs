//! Shared utilities: error types and logger setup

pub mod error;
pub mod logging;

pub use error::{MulticolError, Result, TreeError};
