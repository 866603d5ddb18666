//! Batch pricing on top of the `pricing` crate: run files, a sequential or
//! worker pool orchestrator and console/csv/text reports.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod report;

pub use config::{deadline_from_seconds, ContractTable, RunEntry, RunFile};
pub use error::{RunnerError, RunnerResult};
pub use orchestrator::{ExecutionMode, Orchestrator, RunOutcome};
pub use report::{publish, FileFormat, OutputFormat};
