//! Prices a batch of requests, one after another or on a rayon worker pool.

use std::time::Duration;

use pricing::simulation::distributions::clock_seed;
use pricing::simulation::{RngEngine, StandardNormalSource};
use pricing::{value_request, PricingRequest, PricingResult, Valuation};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::RunnerResult;

/// A finished run: simulation result and statistics.
pub type RunOutcome = Valuation;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    /// `None` lets rayon pick the number of workers.
    Parallel { workers: Option<usize> },
}

#[derive(Clone, Copy, Debug)]
pub struct Orchestrator {
    mode: ExecutionMode,
    engine: RngEngine,
    seed: Option<u64>,
    deadline: Option<Duration>,
}

impl Orchestrator {
    pub fn new(mode: ExecutionMode, engine: RngEngine) -> Self {
        Self {
            mode,
            engine,
            seed: None,
            deadline: None,
        }
    }

    /// Run `i` draws from `seed + i`. Without a seed every run is seeded from the clock.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Each run has its own variate source; the returned outcomes are in input order.
    /// A failed run only fails its own entry.
    pub fn run(&self, requests: &[PricingRequest]) -> RunnerResult<Vec<PricingResult<RunOutcome>>> {
        info!(
            nr_runs = requests.len(),
            mode = ?self.mode,
            engine = %self.engine,
            "starting batch"
        );
        let outcomes: Vec<PricingResult<RunOutcome>> = match self.mode {
            ExecutionMode::Sequential => requests
                .iter()
                .enumerate()
                .map(|(index, request)| self.run_one(index, request))
                .collect(),
            ExecutionMode::Parallel { workers } => {
                let mut builder = rayon::ThreadPoolBuilder::new();
                if let Some(nr_workers) = workers {
                    builder = builder.num_threads(nr_workers);
                }
                let pool = builder.build()?;
                pool.install(|| {
                    requests
                        .par_iter()
                        .enumerate()
                        .map(|(index, request)| self.run_one(index, request))
                        .collect()
                })
            }
        };
        Ok(outcomes)
    }

    fn source_for(&self, index: usize) -> StandardNormalSource {
        // clock readings of concurrent runs can coincide, the index keeps them apart
        let base = self.seed.unwrap_or_else(clock_seed);
        StandardNormalSource::from_seed(self.engine, base.wrapping_add(index as u64))
    }

    fn run_one(&self, index: usize, request: &PricingRequest) -> PricingResult<RunOutcome> {
        let mut source = self.source_for(index);
        debug!(run = index, seed = source.seed_nr(), "seeded run");

        let outcome = value_request(request, &mut source, self.deadline);
        if let Err(err) = &outcome {
            warn!(run = index, error = %err, "run failed");
        }
        outcome
    }
}
