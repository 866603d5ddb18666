use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ConfigurationError, PricingResult};

/// Parses the kebab-case names (and aliases) used in run files and on the command line.
/// Deserialization goes through the same parser via `#[serde(try_from = "String")]`.
macro_rules! impl_from_str {
    ($impl_type:ty, $kind:literal, { $($text:literal => $variant:expr),+ $(,)? }) => {
        impl ::std::str::FromStr for $impl_type {
            type Err = $crate::error::ConfigurationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    _ => Err($crate::error::ConfigurationError::UnknownSelection {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $impl_type {
            type Error = $crate::error::ConfigurationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}
pub(crate) use impl_from_str;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivativeParameter {
    /// the asset's price at time t
    pub asset_price: f64,
    /// the strike or exercise price of the asset
    pub strike: f64,
    /// (T - t) in years, where T is the time of the option's expiration and t is the current time
    pub time_to_expiration: f64,
    /// the annualized risk-free interest rate
    pub rfr: f64,
    /// the annualized standard deviation of the stock's returns
    pub vola: f64,
}

impl DerivativeParameter {
    pub fn new(
        asset_price: f64,
        strike: f64,
        time_to_expiration: f64,
        rfr: f64,
        vola: f64,
    ) -> Self {
        Self {
            asset_price,
            strike,
            time_to_expiration,
            rfr,
            vola,
        }
    }

    /// exp(-r * T)
    pub fn discount_factor(&self) -> f64 {
        (-self.rfr * self.time_to_expiration).exp()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum ExerciseType {
    Call,
    Put,
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseType::Call => write!(f, "Call"),
            ExerciseType::Put => write!(f, "Put"),
        }
    }
}

impl_from_str!(ExerciseType, "exercise type", {
    "call" => ExerciseType::Call,
    "put" => ExerciseType::Put,
});

/// Whether the payoff sees the terminal value or the arithmetic path average.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum PayoffStyle {
    #[default]
    European,
    Asian,
}

impl fmt::Display for PayoffStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayoffStyle::European => write!(f, "European"),
            PayoffStyle::Asian => write!(f, "Asian"),
        }
    }
}

impl_from_str!(PayoffStyle, "payoff style", {
    "european" => PayoffStyle::European,
    "asian" => PayoffStyle::Asian,
});

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum SchemeSelection {
    /// closed form terminal value, a single step over the whole expiry
    #[default]
    Gbm,
    ExplicitEuler,
    Milstein,
}

impl SchemeSelection {
    pub fn name(&self) -> &'static str {
        match self {
            SchemeSelection::Gbm => "GBM",
            SchemeSelection::ExplicitEuler => "Explicit Euler",
            SchemeSelection::Milstein => "Milstein Method",
        }
    }

    pub fn discretizes_time(&self) -> bool {
        !matches!(self, SchemeSelection::Gbm)
    }
}

impl fmt::Display for SchemeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl_from_str!(SchemeSelection, "scheme", {
    "gbm" => SchemeSelection::Gbm,
    "explicit-euler" => SchemeSelection::ExplicitEuler,
    "euler" => SchemeSelection::ExplicitEuler,
    "milstein" => SchemeSelection::Milstein,
});

/// Call or put, European or Asian.
/// The caps of barrier style contracts are carried for reporting only, 0.0 means unused.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PayoffSelection {
    pub exercise: ExerciseType,
    pub style: PayoffStyle,
    pub upper_cap: f64,
    pub lower_cap: f64,
}

impl PayoffSelection {
    pub fn new(exercise: ExerciseType, style: PayoffStyle) -> Self {
        Self {
            exercise,
            style,
            upper_cap: 0.0,
            lower_cap: 0.0,
        }
    }

    pub fn european(exercise: ExerciseType) -> Self {
        Self::new(exercise, PayoffStyle::European)
    }

    pub fn asian(exercise: ExerciseType) -> Self {
        Self::new(exercise, PayoffStyle::Asian)
    }

    pub fn with_caps(mut self, upper_cap: f64, lower_cap: f64) -> Self {
        self.upper_cap = upper_cap;
        self.lower_cap = lower_cap;
        self
    }

    /// e.g. "European Call" or "Asian Put"
    pub fn name(&self) -> String {
        format!("{} {}", self.style, self.exercise)
    }
}

/// The immutable inputs of one run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OptionContract {
    params: DerivativeParameter,
    nr_paths: usize,
    nr_steps: Option<usize>,
}

impl OptionContract {
    /// Rejects negative or non-finite market data and an empty path count.
    /// The step count is checked against the scheme in [`PricingRequest::new`].
    pub fn new(
        params: DerivativeParameter,
        nr_paths: usize,
        nr_steps: Option<usize>,
    ) -> PricingResult<Self> {
        ensure_non_negative("volatility", params.vola)?;
        ensure_non_negative("risk-free rate", params.rfr)?;
        ensure_non_negative("time to expiration", params.time_to_expiration)?;
        ensure_non_negative("asset price", params.asset_price)?;
        ensure_non_negative("strike", params.strike)?;
        if nr_paths < 1 {
            return Err(ConfigurationError::InvalidPathCount(nr_paths).into());
        }
        Ok(Self {
            params,
            nr_paths,
            nr_steps,
        })
    }

    pub fn params(&self) -> &DerivativeParameter {
        &self.params
    }

    pub fn nr_paths(&self) -> usize {
        self.nr_paths
    }

    pub fn nr_steps(&self) -> Option<usize> {
        self.nr_steps
    }

    pub fn discount_factor(&self) -> f64 {
        self.params.discount_factor()
    }
}

/// A contract together with the scheme and payoff it is priced with,
/// validated as a whole before any path is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricingRequest {
    contract: OptionContract,
    scheme: SchemeSelection,
    payoff: PayoffSelection,
}

impl PricingRequest {
    pub fn new(
        contract: OptionContract,
        scheme: SchemeSelection,
        payoff: PayoffSelection,
    ) -> PricingResult<Self> {
        if scheme.discretizes_time() {
            match contract.nr_steps() {
                None => {
                    return Err(ConfigurationError::MissingStepCount {
                        scheme: scheme.name(),
                    }
                    .into())
                }
                Some(0) => {
                    return Err(ConfigurationError::InvalidStepCount {
                        scheme: scheme.name(),
                    }
                    .into())
                }
                Some(_) => {}
            }
        } else if payoff.style == PayoffStyle::Asian {
            // GBM jumps straight to expiry, there is no path to average
            return Err(ConfigurationError::InvalidCombination {
                scheme: scheme.name(),
                payoff: payoff.name(),
            }
            .into());
        }
        Ok(Self {
            contract,
            scheme,
            payoff,
        })
    }

    pub fn contract(&self) -> &OptionContract {
        &self.contract
    }

    pub fn scheme(&self) -> SchemeSelection {
        self.scheme
    }

    pub fn payoff(&self) -> &PayoffSelection {
        &self.payoff
    }

    /// The step count as reported, 0 for the closed form scheme.
    pub fn nr_steps(&self) -> usize {
        if self.scheme.discretizes_time() {
            self.contract.nr_steps().unwrap_or(0)
        } else {
            0
        }
    }

    /// Same contract and scheme, another payoff (used between runs of a batch).
    pub fn with_payoff(&self, payoff: PayoffSelection) -> PricingResult<Self> {
        Self::new(self.contract, self.scheme, payoff)
    }
}
