//! Monte Carlo pricing of European and Asian options on a single asset, with the
//! Black-Scholes price as benchmark.

pub mod analytic;
pub mod common;
pub mod error;
pub mod simulation;
pub mod statistics;

pub use common::models::{
    DerivativeParameter, ExerciseType, OptionContract, PayoffSelection, PayoffStyle,
    PricingRequest, SchemeSelection,
};
pub use error::{ConfigurationError, NumericDomainError, PricingError, PricingResult};
pub use statistics::{value_request, Statistics, StatisticsRecord, Valuation};
