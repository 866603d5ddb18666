use super::{AdvanceStep, Discretization};

/// Model params for the SDE
/// '''math
/// dS_t / S_t = mu dt + sigma dW_t
/// ''', where $dW_t ~ N(0, sqrt(dt))$
/// https://en.wikipedia.org/wiki/Geometric_Brownian_motion
///
/// Solved in closed form over the whole time to expiration, so there are no intermediate values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometricBrownianMotion {
    /// drift term, the risk-free rate under the risk neutral measure
    mu: f64,
    /// volatility
    sigma: f64,
    /// time to expiration
    tte: f64,
}

impl GeometricBrownianMotion {
    pub fn new(drift: f64, vola: f64, tte: f64) -> Self {
        Self {
            mu: drift,
            sigma: vola,
            tte,
        }
    }

    /// S_T = S_t * exp((mu - sigma^2 / 2) T + sigma sqrt(T) z)
    pub fn step_analytic(&self, st: f64, z: f64) -> f64 {
        let ret =
            self.tte * (self.mu - self.sigma.powi(2) / 2.0) + self.tte.sqrt() * self.sigma * z;
        st * ret.exp()
    }
}

impl AdvanceStep for GeometricBrownianMotion {
    #[inline]
    fn advance(&self, st: f64, z: f64) -> f64 {
        self.step_analytic(st, z)
    }

    fn discretization(&self) -> Discretization {
        Discretization::ClosedForm
    }

    fn name(&self) -> &'static str {
        "GBM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand_distr::{Distribution, StandardNormal};

    /// NOTE: the tolerance will depend on the number of samples and the volatility
    const TOLERANCE: f64 = 1e-2;

    #[test]
    fn step_analytic() {
        let gbm = GeometricBrownianMotion::new(0.05, 0.2, 1.0);
        assert_approx_eq!(gbm.advance(100.0, 0.0), 100.0 * 0.03_f64.exp(), 1e-12);
        assert_approx_eq!(gbm.advance(100.0, 1.0), 100.0 * 0.23_f64.exp(), 1e-12);
        assert_eq!(gbm.advance(0.0, 1.5), 0.0);
    }

    #[test]
    fn no_time_no_move() {
        let gbm = GeometricBrownianMotion::new(0.05, 0.2, 0.0);
        assert_eq!(gbm.advance(100.0, 2.0), 100.0);
    }

    #[test]
    fn log_returns_match_analytic_moments() {
        let drift = -0.2;
        let vola = 0.4;
        let s0 = 100.0;
        let tte = 5.0;
        let nr_paths = 100_000;

        let gbm = GeometricBrownianMotion::new(drift, vola, tte);
        let mut rng = rand::rngs::StdRng::seed_from_u64(41);
        let avg_delta = (0..nr_paths)
            .map(|_| {
                let z: f64 = StandardNormal.sample(&mut rng);
                (gbm.advance(s0, z) / s0).ln()
            })
            .sum::<f64>()
            / nr_paths as f64;

        let exp_delta = tte * (drift - vola.powi(2) / 2.0);
        // the log return is normal with sd vola * sqrt(tte) ~ 0.9, so SE ~ 0.003
        assert_approx_eq!(avg_delta, exp_delta, TOLERANCE * 2.0);
    }
}
