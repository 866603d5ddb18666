use std::time::{Duration, Instant};

use ndarray::Array1;
use tracing::{debug, info, trace};

use crate::common::models::{ExerciseType, OptionContract, PricingRequest};
use crate::error::{ensure_finite, ConfigurationError, PricingError, PricingResult};
use crate::simulation::distributions::VariateSource;
use crate::simulation::payoff::EvaluatePayoff;
use crate::simulation::sde::{AdvanceStep, Discretization, StochasticProcess};

/// Paths between progress messages.
const PROGRESS_INTERVAL: usize = 10_000;

/// Asset updates (paths times updates per path) between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 100_000;

/// The outcome of one simulated path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSample {
    /// asset value at expiry
    pub asset_value: f64,
    /// undiscounted payoff of the terminal or averaged value
    pub payoff: f64,
}

/// Price estimate and the retained per-path samples of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationResult {
    pub price: f64,
    pub asset_values: Array1<f64>,
    pub payoffs: Array1<f64>,
    pub contract: OptionContract,
    pub exercise: ExerciseType,
    pub scheme_name: &'static str,
    pub payoff_name: String,
    pub engine_name: &'static str,
    /// 0 for the closed form scheme
    pub nr_steps: usize,
    pub upper_cap: f64,
    pub lower_cap: f64,
}

impl SimulationResult {
    pub fn nr_paths(&self) -> usize {
        self.payoffs.len()
    }

    pub fn samples(&self) -> impl Iterator<Item = PathSample> + '_ {
        self.asset_values
            .iter()
            .zip(self.payoffs.iter())
            .map(|(&asset_value, &payoff)| PathSample {
                asset_value,
                payoff,
            })
    }
}

pub struct MonteCarloPathSimulator {
    pub nr_paths: usize,
    deadline: Option<Duration>,
}

impl MonteCarloPathSimulator {
    pub fn new(nr_paths: usize) -> Self {
        Self {
            nr_paths,
            deadline: None,
        }
    }

    pub fn for_contract(contract: &OptionContract) -> Self {
        Self::new(contract.nr_paths())
    }

    /// Abort runs that take longer than `limit`, checked every
    /// `DEADLINE_CHECK_INTERVAL` asset updates.
    pub fn with_deadline(mut self, limit: Duration) -> Self {
        self.deadline = Some(limit);
        self
    }

    /// Draws `nr_paths` paths of `process`, evaluates `payoff` on each and discounts the average.
    pub fn simulate<M, P, V>(
        &self,
        contract: &OptionContract,
        process: &M,
        payoff: &P,
        source: &mut V,
    ) -> PricingResult<SimulationResult>
    where
        M: AdvanceStep,
        P: EvaluatePayoff,
        V: VariateSource,
    {
        if self.nr_paths < 1 {
            return Err(ConfigurationError::InvalidPathCount(self.nr_paths).into());
        }
        let discretization = process.discretization();
        match discretization {
            Discretization::TimeSteps { nr_steps: 0 } => {
                return Err(ConfigurationError::InvalidStepCount {
                    scheme: process.name(),
                }
                .into())
            }
            Discretization::ClosedForm if payoff.is_path_average() => {
                return Err(ConfigurationError::InvalidCombination {
                    scheme: process.name(),
                    payoff: payoff.name(),
                }
                .into())
            }
            _ => {}
        }
        if contract.nr_paths() != self.nr_paths {
            return Err(ConfigurationError::ContractMismatch {
                field: "number of paths",
                contract: contract.nr_paths(),
                simulator: self.nr_paths,
            }
            .into());
        }
        if let Discretization::TimeSteps { nr_steps } = discretization {
            if contract.nr_steps() != Some(nr_steps) {
                return Err(ConfigurationError::ContractMismatch {
                    field: "number of steps",
                    contract: contract.nr_steps().unwrap_or(0),
                    simulator: nr_steps,
                }
                .into());
            }
        }

        let dp = contract.params();
        debug!(
            scheme = process.name(),
            payoff = %payoff.name(),
            engine = source.engine_name(),
            nr_paths = self.nr_paths,
            spot = dp.asset_price,
            strike = dp.strike,
            "starting simulation"
        );

        let (asset_values, payoffs, nr_steps) = match discretization {
            Discretization::ClosedForm => {
                let (asset_values, payoffs) = self.simulate_closed_form(
                    dp.asset_price,
                    dp.strike,
                    process,
                    payoff,
                    source,
                )?;
                (asset_values, payoffs, 0)
            }
            Discretization::TimeSteps { nr_steps } => {
                let (asset_values, payoffs) = self.simulate_time_steps(
                    dp.asset_price,
                    dp.strike,
                    nr_steps,
                    process,
                    payoff,
                    source,
                )?;
                (asset_values, payoffs, nr_steps)
            }
        };

        let price = payoffs.sum() / self.nr_paths as f64 * contract.discount_factor();
        ensure_finite("estimated price", price)?;
        info!(scheme = process.name(), price, "simulation complete");

        let (upper_cap, lower_cap) = payoff.caps();
        Ok(SimulationResult {
            price,
            asset_values,
            payoffs,
            contract: *contract,
            exercise: payoff.exercise(),
            scheme_name: process.name(),
            payoff_name: payoff.name(),
            engine_name: source.engine_name(),
            nr_steps,
            upper_cap,
            lower_cap,
        })
    }

    fn check_deadline(&self, started: Instant, completed: usize) -> PricingResult<()> {
        match self.deadline {
            Some(limit) if started.elapsed() > limit => {
                Err(PricingError::DeadlineExceeded { completed, limit })
            }
            _ => Ok(()),
        }
    }

    /// One vectorized step from spot to expiry, drawn in chunks of
    /// `DEADLINE_CHECK_INTERVAL` paths. The chunking does not change the draws.
    fn simulate_closed_form<M, P, V>(
        &self,
        spot: f64,
        strike: f64,
        process: &M,
        payoff: &P,
        source: &mut V,
    ) -> PricingResult<(Array1<f64>, Array1<f64>)>
    where
        M: AdvanceStep,
        P: EvaluatePayoff,
        V: VariateSource,
    {
        let started = Instant::now();
        let mut asset_values = Vec::with_capacity(self.nr_paths);
        loop {
            let chunk = (self.nr_paths - asset_values.len()).min(DEADLINE_CHECK_INTERVAL);
            let draws = source.standard_normals(chunk);
            asset_values.extend(draws.iter().map(|&z| process.advance(spot, z)));
            if asset_values.len() == self.nr_paths {
                break;
            }
            self.check_deadline(started, asset_values.len())?;
        }

        let asset_values = Array1::from(asset_values);
        let payoffs = asset_values.mapv(|value| payoff.payoff(strike, value));
        Ok((asset_values, payoffs))
    }

    fn simulate_time_steps<M, P, V>(
        &self,
        spot: f64,
        strike: f64,
        nr_steps: usize,
        process: &M,
        payoff: &P,
        source: &mut V,
    ) -> PricingResult<(Array1<f64>, Array1<f64>)>
    where
        M: AdvanceStep,
        P: EvaluatePayoff,
        V: VariateSource,
    {
        let started = Instant::now();
        let updates_per_path = nr_steps + 1;
        let mut updates_since_check = 0;
        let mut asset_values = Vec::with_capacity(self.nr_paths);
        let mut payoffs = Vec::with_capacity(self.nr_paths);

        for idx in 1..=self.nr_paths {
            let sample = sample_path(spot, strike, nr_steps, process, payoff, source);
            asset_values.push(sample.asset_value);
            payoffs.push(sample.payoff);

            if idx % PROGRESS_INTERVAL == 0 {
                trace!(paths = idx, "simulation progress");
            }
            updates_since_check += updates_per_path;
            if updates_since_check >= DEADLINE_CHECK_INTERVAL && idx < self.nr_paths {
                updates_since_check = 0;
                self.check_deadline(started, idx)?;
            }
        }

        Ok((Array1::from(asset_values), Array1::from(payoffs)))
    }
}

/// Walks one path through `nr_steps + 1` updates of `process`, one draw per update.
pub fn sample_path<M, P, V>(
    spot: f64,
    strike: f64,
    nr_steps: usize,
    process: &M,
    payoff: &P,
    source: &mut V,
) -> PathSample
where
    M: AdvanceStep,
    P: EvaluatePayoff,
    V: VariateSource,
{
    let mut st = spot;
    let mut path_sum = 0.0;
    for _ in 0..=nr_steps {
        st = process.advance(st, source.next_standard_normal());
        path_sum += st;
    }

    let observed = if payoff.is_path_average() {
        path_sum / (nr_steps + 1) as f64
    } else {
        st
    };
    PathSample {
        asset_value: st,
        payoff: payoff.payoff(strike, observed),
    }
}

/// Runs `request` with the scheme and payoff it selects.
pub fn simulate_request<V: VariateSource>(
    request: &PricingRequest,
    source: &mut V,
    deadline: Option<Duration>,
) -> PricingResult<SimulationResult> {
    let process = StochasticProcess::from(request);
    let mut simulator = MonteCarloPathSimulator::for_contract(request.contract());
    if let Some(limit) = deadline {
        simulator = simulator.with_deadline(limit);
    }
    simulator.simulate(request.contract(), &process, request.payoff(), source)
}
