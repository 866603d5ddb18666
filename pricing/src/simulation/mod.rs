pub mod distributions;
pub mod monte_carlo;
pub mod payoff;
pub mod sde;

pub use distributions::{RngEngine, StandardNormalSource, VariateSource};
pub use monte_carlo::{
    sample_path, simulate_request, MonteCarloPathSimulator, PathSample, SimulationResult,
};
pub use payoff::EvaluatePayoff;
pub use sde::{AdvanceStep, ExplicitEuler, GeometricBrownianMotion, Milstein, StochasticProcess};
