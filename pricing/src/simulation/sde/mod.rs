//! One-step updates of the asset price under the risk neutral measure.
//!
//! All schemes model
//! '''math
//! dS_t = mu(r, S_t) dt + sigma(vola, S_t) dW_t
//! '''
//! with the constant elasticity of variance exponent fixed at 1, i.e. a geometric Brownian motion.

mod euler;
mod gbm;
mod milstein;

pub use euler::ExplicitEuler;
pub use gbm::GeometricBrownianMotion;
pub use milstein::Milstein;

use crate::common::models::{PricingRequest, SchemeSelection};

/// Elasticity exponent of the diffusion term.
pub const CEV_EXPONENT: f64 = 1.0;

/// Drift function mu(r, S) = r * S.
#[inline]
pub fn drift(rfr: f64, st: f64) -> f64 {
    rfr * st
}

/// Diffusion function sigma(vola, S) = vola * S^beta.
#[inline]
pub fn diffusion(vola: f64, st: f64) -> f64 {
    vola * st.powf(CEV_EXPONENT)
}

/// The Milstein correction factor 0.5 * vola * beta * S^(beta - 1), a constant 0.5 * vola for beta = 1.
#[inline]
pub fn diffusion_derivative(vola: f64, st: f64) -> f64 {
    0.5 * vola * CEV_EXPONENT * st.powf(CEV_EXPONENT - 1.0)
}

/// How the driver walks a path from spot to expiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Discretization {
    /// a single update over the whole expiry, drawn for all paths at once
    ClosedForm,
    /// a per-path time loop; the spot is updated `nr_steps + 1` times with `dt = T / nr_steps`
    TimeSteps { nr_steps: usize },
}

pub trait AdvanceStep {
    /// The next state given the current one and a standard normal draw.
    fn advance(&self, st: f64, z: f64) -> f64;

    fn discretization(&self) -> Discretization;

    fn name(&self) -> &'static str;
}

/// The scheme chosen for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StochasticProcess {
    Gbm(GeometricBrownianMotion),
    ExplicitEuler(ExplicitEuler),
    Milstein(Milstein),
}

impl From<&PricingRequest> for StochasticProcess {
    fn from(request: &PricingRequest) -> Self {
        let dp = request.contract().params();
        match request.scheme() {
            SchemeSelection::Gbm => StochasticProcess::Gbm(GeometricBrownianMotion::new(
                dp.rfr,
                dp.vola,
                dp.time_to_expiration,
            )),
            // a validated request carries a positive step count for these schemes
            SchemeSelection::ExplicitEuler => StochasticProcess::ExplicitEuler(
                ExplicitEuler::new(dp.rfr, dp.vola, dp.time_to_expiration, request.nr_steps()),
            ),
            SchemeSelection::Milstein => StochasticProcess::Milstein(Milstein::new(
                dp.rfr,
                dp.vola,
                dp.time_to_expiration,
                request.nr_steps(),
            )),
        }
    }
}

impl AdvanceStep for StochasticProcess {
    #[inline]
    fn advance(&self, st: f64, z: f64) -> f64 {
        match self {
            StochasticProcess::Gbm(gbm) => gbm.advance(st, z),
            StochasticProcess::ExplicitEuler(euler) => euler.advance(st, z),
            StochasticProcess::Milstein(milstein) => milstein.advance(st, z),
        }
    }

    fn discretization(&self) -> Discretization {
        match self {
            StochasticProcess::Gbm(gbm) => gbm.discretization(),
            StochasticProcess::ExplicitEuler(euler) => euler.discretization(),
            StochasticProcess::Milstein(milstein) => milstein.discretization(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            StochasticProcess::Gbm(gbm) => gbm.name(),
            StochasticProcess::ExplicitEuler(euler) => euler.name(),
            StochasticProcess::Milstein(milstein) => milstein.name(),
        }
    }
}
