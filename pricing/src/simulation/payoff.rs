use crate::common::models::{ExerciseType, PayoffSelection, PayoffStyle};

pub fn call_payoff(strike: f64, value: f64) -> f64 {
    (value - strike).max(0.0)
}

pub fn put_payoff(strike: f64, value: f64) -> f64 {
    (strike - value).max(0.0)
}

/// Maps the terminal (or path averaged) asset value to an undiscounted payoff.
pub trait EvaluatePayoff {
    fn payoff(&self, strike: f64, value: f64) -> f64;

    /// Whether [`payoff`](EvaluatePayoff::payoff) expects the arithmetic mean over the path
    /// instead of the terminal value.
    fn is_path_average(&self) -> bool;

    /// Selects the analytic benchmark formula.
    fn exercise(&self) -> ExerciseType;

    fn name(&self) -> String;

    /// Upper and lower barrier caps, reported but not applied. 0.0 means unused.
    fn caps(&self) -> (f64, f64) {
        (0.0, 0.0)
    }
}

impl EvaluatePayoff for PayoffSelection {
    #[inline]
    fn payoff(&self, strike: f64, value: f64) -> f64 {
        // caps are metadata for the reports and leave the payoff untouched
        match self.exercise {
            ExerciseType::Call => call_payoff(strike, value),
            ExerciseType::Put => put_payoff(strike, value),
        }
    }

    fn is_path_average(&self) -> bool {
        self.style == PayoffStyle::Asian
    }

    fn exercise(&self) -> ExerciseType {
        self.exercise
    }

    fn name(&self) -> String {
        PayoffSelection::name(self)
    }

    fn caps(&self) -> (f64, f64) {
        (self.upper_cap, self.lower_cap)
    }
}
