//! Output module for the offline tree
//!
//! This module handles:
//! - Writing rewritten resources below the output root
//! - Routing content through optional optimizers
//! - Reporting run statistics

pub mod optimize;
pub mod stats;
mod writer;

pub use optimize::{Capability, Optimizer, OptimizerRegistry};
pub use stats::{print_statistics, RunSummary};
pub use writer::OutputWriter;

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Optimizer failed: {0}")]
    Optimize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
