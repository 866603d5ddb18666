use std::time::{Duration, Instant};

use ndarray::Array1;

use crate::analytic::{BlackScholesMerton, OptionPrice};
use crate::common::models::PricingRequest;
use crate::error::{ensure_finite, NumericDomainError, PricingResult};
use crate::simulation::distributions::VariateSource;
use crate::simulation::monte_carlo::{simulate_request, SimulationResult};

/// Absolute price distance below which a simulated price is accepted.
/// A fixed policy, not derived from the sample.
pub const DECISION_TOLERANCE: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatisticsRecord {
    pub mean_asset_value: f64,
    pub max_asset_value: f64,
    pub min_asset_value: f64,
    /// discounted dispersion of the payoff sample, reported as the standard deviation of the simulation
    pub standard_deviation: f64,
    pub standard_error: f64,
    /// Black-Scholes price of the same contract
    pub exact_price: f64,
    pub decision: bool,
    pub elapsed_seconds: f64,
}

/// Accept iff `|exact - estimate| < DECISION_TOLERANCE`, strictly.
pub fn decide(exact_price: f64, estimated_price: f64) -> bool {
    (exact_price - estimated_price).abs() < DECISION_TOLERANCE
}

/// sqrt((sum(x^2) - sum(x)^2 / n) / (n - 1)), undefined for fewer than two samples.
pub fn sample_standard_deviation(samples: &Array1<f64>) -> PricingResult<f64> {
    let nr_samples = samples.len();
    if nr_samples < 2 {
        return Err(NumericDomainError::DegenerateSample {
            nr_paths: nr_samples,
        }
        .into());
    }
    let (sum, sum_sq) = samples
        .iter()
        .fold((0.0, 0.0), |(sum, sum_sq), x| (sum + x, sum_sq + x * x));
    let n = nr_samples as f64;
    // rounding can push a zero spread slightly below 0
    let spread = (sum_sq - sum.powi(2) / n).max(0.0);
    Ok((spread / (n - 1.0)).sqrt())
}

pub struct Statistics;

impl Statistics {
    /// Pure function of its inputs: the same result and elapsed time give the same record.
    pub fn compute(result: &SimulationResult, elapsed: Duration) -> PricingResult<StatisticsRecord> {
        let asset_values = &result.asset_values;
        let nr_paths = asset_values.len();
        if nr_paths < 2 {
            return Err(NumericDomainError::DegenerateSample { nr_paths }.into());
        }

        let mean_asset_value = asset_values.sum() / nr_paths as f64;
        let max_asset_value = asset_values.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let min_asset_value = asset_values.fold(f64::INFINITY, |acc, &v| acc.min(v));

        let standard_deviation =
            sample_standard_deviation(&result.payoffs)? * result.contract.discount_factor();
        let standard_error = standard_deviation / (result.payoffs.len() as f64).sqrt();

        let exact_price = ensure_finite(
            "exact price",
            BlackScholesMerton::price(result.exercise, result.contract.params()),
        )?;

        Ok(StatisticsRecord {
            mean_asset_value,
            max_asset_value,
            min_asset_value,
            standard_deviation,
            standard_error,
            exact_price,
            decision: decide(exact_price, result.price),
            elapsed_seconds: elapsed.as_secs_f64(),
        })
    }
}

/// A finished run: the simulation and its statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct Valuation {
    pub result: SimulationResult,
    pub statistics: StatisticsRecord,
}

/// Times the simulation of `request` and aggregates its samples.
pub fn value_request<V: VariateSource>(
    request: &PricingRequest,
    source: &mut V,
    deadline: Option<Duration>,
) -> PricingResult<Valuation> {
    let start = Instant::now();
    let result = simulate_request(request, source, deadline)?;
    let elapsed = start.elapsed();

    let statistics = Statistics::compute(&result, elapsed)?;
    Ok(Valuation { result, statistics })
}
