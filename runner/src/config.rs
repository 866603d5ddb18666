//! TOML run files.
//!
//! ```toml
//! engine = "mersenne-twister"
//! seed = 42
//! parallel = true
//!
//! [contract]
//! vola = 0.3
//! rate = 0.08
//! expiry = 0.25
//! spot = 60.0
//! strike = 65.0
//! paths = 100000
//! steps = 50
//!
//! [[runs]]
//! scheme = "explicit-euler"
//! exercise = "put"
//!
//! [[runs]]
//! scheme = "milstein"
//! exercise = "call"
//! style = "asian"
//! overrides = { strike = 55.0 }
//! ```

use std::path::Path;
use std::time::Duration;

use pricing::simulation::RngEngine;
use pricing::{
    DerivativeParameter, ExerciseType, OptionContract, PayoffSelection, PayoffStyle,
    PricingRequest, PricingResult, SchemeSelection,
};
use serde::Deserialize;

use crate::error::{RunnerError, RunnerResult};
use crate::orchestrator::ExecutionMode;

pub const DEFAULT_VOLA: f64 = 0.1;
pub const DEFAULT_RATE: f64 = 0.1;
pub const DEFAULT_EXPIRY: f64 = 0.25;
pub const DEFAULT_SPOT: f64 = 100.0;
pub const DEFAULT_STRIKE: f64 = 120.0;
pub const DEFAULT_NR_PATHS: usize = 100_000;

/// Contract fields, each optional. Missing fields take the defaults above.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractTable {
    pub vola: Option<f64>,
    pub rate: Option<f64>,
    pub expiry: Option<f64>,
    pub spot: Option<f64>,
    pub strike: Option<f64>,
    pub paths: Option<usize>,
    pub steps: Option<usize>,
}

impl ContractTable {
    /// Fields set in `overrides` win over the ones of `self`.
    pub fn merged(&self, overrides: &ContractTable) -> ContractTable {
        ContractTable {
            vola: overrides.vola.or(self.vola),
            rate: overrides.rate.or(self.rate),
            expiry: overrides.expiry.or(self.expiry),
            spot: overrides.spot.or(self.spot),
            strike: overrides.strike.or(self.strike),
            paths: overrides.paths.or(self.paths),
            steps: overrides.steps.or(self.steps),
        }
    }

    pub fn contract(&self) -> PricingResult<OptionContract> {
        let params = DerivativeParameter::new(
            self.spot.unwrap_or(DEFAULT_SPOT),
            self.strike.unwrap_or(DEFAULT_STRIKE),
            self.expiry.unwrap_or(DEFAULT_EXPIRY),
            self.rate.unwrap_or(DEFAULT_RATE),
            self.vola.unwrap_or(DEFAULT_VOLA),
        );
        OptionContract::new(params, self.paths.unwrap_or(DEFAULT_NR_PATHS), self.steps)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunEntry {
    pub scheme: SchemeSelection,
    pub exercise: ExerciseType,
    #[serde(default)]
    pub style: PayoffStyle,
    pub upper_cap: Option<f64>,
    pub lower_cap: Option<f64>,
    #[serde(default)]
    pub overrides: ContractTable,
}

impl RunEntry {
    pub fn payoff(&self) -> PayoffSelection {
        PayoffSelection::new(self.exercise, self.style).with_caps(
            self.upper_cap.unwrap_or_default(),
            self.lower_cap.unwrap_or_default(),
        )
    }

    pub fn request(&self, base: &ContractTable) -> PricingResult<PricingRequest> {
        let contract = base.merged(&self.overrides).contract()?;
        PricingRequest::new(contract, self.scheme, self.payoff())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    #[serde(default)]
    pub engine: RngEngine,
    pub seed: Option<u64>,
    #[serde(default)]
    pub parallel: bool,
    pub workers: Option<usize>,
    pub max_seconds: Option<f64>,
    #[serde(default)]
    pub contract: ContractTable,
    #[serde(default)]
    pub runs: Vec<RunEntry>,
}

impl RunFile {
    pub fn load(path: &Path) -> RunnerResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RunnerError::io(path, e))?;
        text.parse()
    }

    /// One validated request per `[[runs]]` entry, in file order.
    /// The first invalid entry fails the whole file.
    pub fn requests(&self) -> RunnerResult<Vec<PricingRequest>> {
        if self.runs.is_empty() {
            return Err(RunnerError::NoRuns);
        }
        self.runs
            .iter()
            .enumerate()
            .map(|(index, run)| {
                run.request(&self.contract)
                    .map_err(|source| RunnerError::InvalidRun { index, source })
            })
            .collect()
    }

    pub fn mode(&self) -> ExecutionMode {
        if self.parallel {
            ExecutionMode::Parallel {
                workers: self.workers,
            }
        } else {
            ExecutionMode::Sequential
        }
    }

    pub fn deadline(&self) -> RunnerResult<Option<Duration>> {
        deadline_from_seconds(self.max_seconds)
    }
}

/// A run time limit given in seconds. Zero, negative and non-finite limits are rejected.
pub fn deadline_from_seconds(max_seconds: Option<f64>) -> RunnerResult<Option<Duration>> {
    max_seconds
        .map(|secs| {
            if secs > 0.0 {
                Duration::try_from_secs_f64(secs).map_err(|_| RunnerError::InvalidDeadline(secs))
            } else {
                Err(RunnerError::InvalidDeadline(secs))
            }
        })
        .transpose()
}

impl std::str::FromStr for RunFile {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricing::{ConfigurationError, PricingError};

    const RUN_FILE: &str = r#"
        engine = "mersenne-twister"
        seed = 42
        parallel = true
        workers = 2
        max_seconds = 30.0

        [contract]
        vola = 0.3
        rate = 0.08
        expiry = 0.25
        spot = 60
        strike = 65.0
        paths = 1000
        steps = 50

        [[runs]]
        scheme = "explicit-euler"
        exercise = "put"

        [[runs]]
        scheme = "milstein"
        exercise = "call"
        style = "asian"
        upper_cap = 80.0
        overrides = { strike = 55.0, steps = 10 }
    "#;

    #[test]
    fn parses_a_run_file() {
        let file: RunFile = RUN_FILE.parse().unwrap();
        assert_eq!(file.engine, RngEngine::MersenneTwister);
        assert_eq!(file.seed, Some(42));
        assert_eq!(file.mode(), ExecutionMode::Parallel { workers: Some(2) });
        assert_eq!(file.deadline().unwrap(), Some(Duration::from_secs(30)));

        let requests = file.requests().unwrap();
        assert_eq!(requests.len(), 2);

        let euler = &requests[0];
        assert_eq!(euler.scheme(), SchemeSelection::ExplicitEuler);
        assert_eq!(euler.payoff().name(), "European Put");
        assert_eq!(euler.contract().params().asset_price, 60.0);
        assert_eq!(euler.nr_steps(), 50);

        let asian = &requests[1];
        assert_eq!(asian.payoff().name(), "Asian Call");
        assert_eq!(asian.payoff().upper_cap, 80.0);
        assert_eq!(asian.payoff().lower_cap, 0.0);
        assert_eq!(asian.contract().params().strike, 55.0);
        assert_eq!(asian.contract().params().vola, 0.3);
        assert_eq!(asian.nr_steps(), 10);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let file: RunFile = r#"
            [[runs]]
            scheme = "gbm"
            exercise = "call"
        "#
        .parse()
        .unwrap();
        assert_eq!(file.engine, RngEngine::Default);
        assert_eq!(file.mode(), ExecutionMode::Sequential);
        assert_eq!(file.deadline().unwrap(), None);

        let requests = file.requests().unwrap();
        let params = requests[0].contract().params();
        assert_eq!(params.vola, DEFAULT_VOLA);
        assert_eq!(params.rfr, DEFAULT_RATE);
        assert_eq!(params.time_to_expiration, DEFAULT_EXPIRY);
        assert_eq!(params.asset_price, DEFAULT_SPOT);
        assert_eq!(params.strike, DEFAULT_STRIKE);
        assert_eq!(requests[0].contract().nr_paths(), DEFAULT_NR_PATHS);
        assert_eq!(requests[0].nr_steps(), 0);
    }

    #[test]
    fn invalid_runs_fail_the_file() {
        let file: RunFile = r#"
            [[runs]]
            scheme = "gbm"
            exercise = "call"

            [[runs]]
            scheme = "explicit-euler"
            exercise = "put"
        "#
        .parse()
        .unwrap();
        match file.requests() {
            Err(RunnerError::InvalidRun { index, source }) => {
                assert_eq!(index, 1);
                assert_eq!(
                    source,
                    PricingError::Configuration(ConfigurationError::MissingStepCount {
                        scheme: "Explicit Euler"
                    })
                );
            }
            other => panic!("expected an invalid run, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_files() {
        assert!(matches!(
            "engine = \"xorshift\"".parse::<RunFile>(),
            Err(RunnerError::Toml(_))
        ));
        assert!(matches!(
            "[contract]\nvolatility = 0.2".parse::<RunFile>(),
            Err(RunnerError::Toml(_))
        ));

        let empty: RunFile = "seed = 1".parse().unwrap();
        assert!(matches!(empty.requests(), Err(RunnerError::NoRuns)));

        let negative: RunFile = "max_seconds = -1.0".parse().unwrap();
        assert!(matches!(
            negative.deadline(),
            Err(RunnerError::InvalidDeadline(_))
        ));
    }

    #[test]
    fn run_files_accept_command_line_names() {
        let file: RunFile = r#"
            engine = "MT"

            [contract]
            steps = 5

            [[runs]]
            scheme = "euler"
            exercise = "Put"

            [[runs]]
            scheme = "Milstein"
            exercise = "call"
            style = " Asian "
        "#
        .parse()
        .unwrap();
        assert_eq!(file.engine, RngEngine::MersenneTwister);
        assert_eq!(file.runs[0].scheme, SchemeSelection::ExplicitEuler);
        assert_eq!(file.runs[0].exercise, ExerciseType::Put);
        assert_eq!(file.runs[1].scheme, SchemeSelection::Milstein);
        assert_eq!(file.runs[1].style, PayoffStyle::Asian);

        let err = "engine = \"xorshift\"".parse::<RunFile>().unwrap_err();
        assert!(err.to_string().contains("unknown random engine 'xorshift'"));
    }

    #[test]
    fn deadlines_in_fractional_seconds() {
        assert_eq!(deadline_from_seconds(None).unwrap(), None);
        assert_eq!(
            deadline_from_seconds(Some(0.25)).unwrap(),
            Some(Duration::from_millis(250))
        );
        for secs in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                deadline_from_seconds(Some(secs)),
                Err(RunnerError::InvalidDeadline(_))
            ));
        }
    }

    #[test]
    fn bundled_run_file_is_valid() {
        let file: RunFile = include_str!("../../runs/textbook_put.toml").parse().unwrap();
        let requests = file.requests().unwrap();
        assert_eq!(requests.len(), 5);
        assert_eq!(requests[3].payoff().name(), "Asian Put");
        assert_eq!(requests[4].nr_steps(), 100);
        assert_eq!(requests[4].contract().params().strike, 60.0);
    }
}
