use crate::common::models::{DerivativeParameter, ExerciseType};
use probability::distribution::{Distribution, Gaussian};

pub(crate) fn cdf(d: f64) -> f64 {
    let normal = Gaussian::new(0.0, 1.0);
    normal.distribution(d)
}

pub trait OptionPrice {
    type Params;
    fn put(params: &Self::Params) -> f64;
    fn call(params: &Self::Params) -> f64;

    fn price(exercise: ExerciseType, params: &Self::Params) -> f64 {
        match exercise {
            ExerciseType::Call => Self::call(params),
            ExerciseType::Put => Self::put(params),
        }
    }
}

/// European Put and Call option prices for stocks.
/// https://en.wikipedia.org/wiki/Black-Scholes_model
///
/// Degenerate inputs (zero volatility or expiry at the money) give NaN,
/// callers decide whether that is an error.
pub struct BlackScholesMerton;

impl BlackScholesMerton {
    fn d1_d2(dp: &DerivativeParameter) -> (f64, f64) {
        let sigma_exp = dp.vola * dp.time_to_expiration.sqrt();
        let d1 = ((dp.asset_price / dp.strike).ln()
            + (dp.rfr + dp.vola.powi(2) / 2.0) * dp.time_to_expiration)
            / sigma_exp;
        (d1, d1 - sigma_exp)
    }
}

impl OptionPrice for BlackScholesMerton {
    type Params = DerivativeParameter;

    fn call(dp: &DerivativeParameter) -> f64 {
        let (d1, d2) = Self::d1_d2(dp);
        cdf(d1) * dp.asset_price - cdf(d2) * dp.strike * dp.discount_factor()
    }

    fn put(dp: &DerivativeParameter) -> f64 {
        let (d1, d2) = Self::d1_d2(dp);
        cdf(-d2) * dp.strike * dp.discount_factor() - cdf(-d1) * dp.asset_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use proptest::prelude::*;

    const TOLERANCE: f64 = 1e-4;

    #[test]
    fn normal_cdf() {
        let center_value = cdf(0.0);
        assert_eq!(center_value, 0.5);

        let sigma_top = cdf(1.0); // mu + 1 sigma
        assert_approx_eq!(sigma_top, 0.8413, 0.0001); // table value for 1.0
    }

    #[test]
    fn european_call() {
        let dp = DerivativeParameter::new(300.0, 250.0, 1.0, 0.03, 0.15);
        assert_approx_eq!(BlackScholesMerton::call(&dp), 58.8197, TOLERANCE);

        let dp = DerivativeParameter::new(310.0, 250.0, 3.5, 0.05, 0.25);
        assert_approx_eq!(BlackScholesMerton::call(&dp), 113.4155, TOLERANCE);
    }

    #[test]
    fn european_put() {
        let dp = DerivativeParameter::new(300.0, 250.0, 1.0, 0.03, 0.15);
        assert_approx_eq!(BlackScholesMerton::put(&dp), 1.4311, TOLERANCE);

        let dp = DerivativeParameter::new(310.0, 250.0, 3.5, 0.05, 0.25);
        assert_approx_eq!(BlackScholesMerton::put(&dp), 13.2797, TOLERANCE);
    }

    #[test]
    fn put_from_exercise_type() {
        let dp = DerivativeParameter::new(60.0, 65.0, 0.25, 0.08, 0.3);
        assert_eq!(
            BlackScholesMerton::price(ExerciseType::Put, &dp),
            BlackScholesMerton::put(&dp)
        );
        assert_eq!(
            BlackScholesMerton::price(ExerciseType::Call, &dp),
            BlackScholesMerton::call(&dp)
        );
        // a few dollars out of the money
        assert_approx_eq!(BlackScholesMerton::put(&dp), 5.8463, TOLERANCE);
    }

    #[test]
    fn european_put_call_parity() {
        let dp = DerivativeParameter::new(300.0, 250.0, 1.0, 0.03, 0.15);
        let put_call_parity = BlackScholesMerton::call(&dp) - BlackScholesMerton::put(&dp);
        assert_approx_eq!(
            put_call_parity,
            dp.asset_price - dp.strike * (-dp.rfr * dp.time_to_expiration).exp(),
            1e-10
        );
    }

    proptest! {
        #[test]
        fn put_call_parity_holds(
            spot in 1.0..500.0_f64,
            strike in 1.0..500.0_f64,
            tte in 0.05..5.0_f64,
            rfr in 0.0..0.2_f64,
            vola in 0.05..1.0_f64,
        ) {
            let dp = DerivativeParameter::new(spot, strike, tte, rfr, vola);
            let lhs = BlackScholesMerton::call(&dp) - BlackScholesMerton::put(&dp);
            let rhs = spot - strike * dp.discount_factor();
            prop_assert!((lhs - rhs).abs() < 1e-8 * spot.max(strike));
        }

        #[test]
        fn prices_are_bounded(
            spot in 1.0..500.0_f64,
            strike in 1.0..500.0_f64,
            tte in 0.05..5.0_f64,
            rfr in 0.0..0.2_f64,
            vola in 0.05..1.0_f64,
        ) {
            let dp = DerivativeParameter::new(spot, strike, tte, rfr, vola);
            let call = BlackScholesMerton::call(&dp);
            let put = BlackScholesMerton::put(&dp);
            prop_assert!(call >= -1e-9 && call <= spot + 1e-9);
            prop_assert!(put >= -1e-9 && put <= strike + 1e-9);
        }
    }
}
