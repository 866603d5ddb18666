use super::{diffusion, diffusion_derivative, drift, AdvanceStep, Discretization};

/// Euler step plus the second order correction
/// '''math
/// 0.5 sigma(vola, S_n) sigma'(vola, S_n) ((sqrt(dt) z)^2 - dt)
/// '''
/// https://en.wikipedia.org/wiki/Milstein_method
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Milstein {
    rfr: f64,
    vola: f64,
    nr_steps: usize,
    dt: f64,
    dt_sqrt: f64,
}

impl Milstein {
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
}

impl AdvanceStep for Milstein {
    #[inline]
    fn advance(&self, st: f64, z: f64) -> f64 {
        let d_w = self.dt_sqrt * z;
        let sigma = diffusion(self.vola, st);
        st + self.dt * drift(self.rfr, st)
            + sigma * d_w
            + 0.5 * sigma * diffusion_derivative(self.vola, st) * (d_w.powi(2) - self.dt)
    }

    fn discretization(&self) -> Discretization {
        Discretization::TimeSteps {
            nr_steps: self.nr_steps,
        }
    }

    fn name(&self) -> &'static str {
        "Milstein Method"
    }
}
