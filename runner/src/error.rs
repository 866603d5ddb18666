use std::path::PathBuf;

use pricing::PricingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("run {index} is invalid: {source}")]
    InvalidRun {
        index: usize,
        #[source]
        source: PricingError,
    },
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("run file contains no runs")]
    NoRuns,
    #[error("max_seconds must be a positive number of seconds, got {0}")]
    InvalidDeadline(f64),
    #[error("could not access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid run file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("csv output failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not start the worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type RunnerResult<T> = Result<T, RunnerError>;

impl RunnerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunnerError::Io {
            path: path.into(),
            source,
        }
    }
}
