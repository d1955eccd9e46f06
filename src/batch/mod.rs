//! CSV-driven bulk generation.

mod mode;
mod runner;

pub use mode::BatchMode;
pub use runner::{
    BatchError, BatchItem, BatchLimits, BatchOutcome, BatchReportEntry, BatchRowError,
    BatchRunner, BatchStyle, RowStatus,
};
