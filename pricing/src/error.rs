use thiserror::Error;

/// Invalid selections or counts, detected before a simulation starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("number of paths must be at least 1, got {0}")]
    InvalidPathCount(usize),
    #[error("scheme '{scheme}' discretizes time and needs a step count")]
    MissingStepCount { scheme: &'static str },
    #[error("scheme '{scheme}' needs at least one time step")]
    InvalidStepCount { scheme: &'static str },
    #[error("payoff '{payoff}' can not be evaluated with scheme '{scheme}'")]
    InvalidCombination { scheme: &'static str, payoff: String },
    #[error("{field} differs between contract ({contract}) and simulator ({simulator})")]
    ContractMismatch {
        field: &'static str,
        contract: usize,
        simulator: usize,
    },
    #[error("unknown {kind} '{value}'")]
    UnknownSelection { kind: &'static str, value: String },
}

/// Values outside the numeric domain of the model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericDomainError {
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("{name} is not a finite number ({value})")]
    NonFinite { name: &'static str, value: f64 },
    #[error("sample standard deviation needs at least 2 paths, got {nr_paths}")]
    DegenerateSample { nr_paths: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("numeric domain error: {0}")]
    NumericDomain(#[from] NumericDomainError),
    #[error("run exceeded its deadline of {limit:?} after {completed} paths")]
    DeadlineExceeded {
        completed: usize,
        limit: std::time::Duration,
    },
}

pub type PricingResult<T> = Result<T, PricingError>;

/// Fails with `NumericDomainError::Negative` or `NonFinite` for values outside `[0, inf)`.
pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> PricingResult<f64> {
    if !value.is_finite() {
        return Err(NumericDomainError::NonFinite { name, value }.into());
    }
    if value < 0.0 {
        return Err(NumericDomainError::Negative { name, value }.into());
    }
    Ok(value)
}

pub(crate) fn ensure_finite(name: &'static str, value: f64) -> PricingResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(NumericDomainError::NonFinite { name, value }.into())
    }
}
