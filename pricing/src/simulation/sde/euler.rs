use super::{diffusion, drift, AdvanceStep, Discretization};

/// Euler-Maruyama discretization
/// '''math
/// S_{n+1} = S_n + mu(r, S_n) dt + sigma(vola, S_n) sqrt(dt) z
/// '''
/// https://en.wikipedia.org/wiki/Euler%E2%80%93Maruyama_method
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExplicitEuler {
    rfr: f64,
    vola: f64,
    nr_steps: usize,
    dt: f64,
    dt_sqrt: f64,
}

impl ExplicitEuler {
    /// `nr_steps` has to be positive, [`PricingRequest`](crate::common::models::PricingRequest) checks it.
    pub fn new(rfr: f64, vola: f64, tte: f64, nr_steps: usize) -> Self {
        let dt = tte / nr_steps as f64;
        Self {
            rfr,
            vola,
            nr_steps,
            dt,
            dt_sqrt: dt.sqrt(),
        }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }
}

impl AdvanceStep for ExplicitEuler {
    #[inline]
    fn advance(&self, st: f64, z: f64) -> f64 {
        st + self.dt * drift(self.rfr, st) + self.dt_sqrt * diffusion(self.vola, st) * z
    }

    fn discretization(&self) -> Discretization {
        Discretization::TimeSteps {
            nr_steps: self.nr_steps,
        }
    }

    fn name(&self) -> &'static str {
        "Explicit Euler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn single_step() {
        let euler = ExplicitEuler::new(0.08, 0.3, 0.25, 50);
        assert_eq!(euler.dt(), 0.005);

        // drift only
        assert_approx_eq!(euler.advance(60.0, 0.0), 60.0 * (1.0 + 0.08 * 0.005), 1e-12);

        let z = 1.3;
        let expected = 60.0 + 0.005 * 0.08 * 60.0 + 0.005_f64.sqrt() * 0.3 * 60.0 * z;
        assert_approx_eq!(euler.advance(60.0, z), expected, 1e-12);
    }

    #[test]
    fn zero_is_absorbing() {
        let euler = ExplicitEuler::new(0.08, 0.3, 0.25, 50);
        assert_eq!(euler.advance(0.0, -2.0), 0.0);
    }
}
