//! Technical indicators over rate series
//!
//! Pure functions: each takes an ascending [`RatePoint`] slice and returns a
//! new series whose timestamps align to the last input point of each window.
//! Insufficient input yields an empty series rather than an error.
//!
//! - [`sma`] - simple moving average
//! - [`bollinger`] - SMA ± k population standard deviations
//! - [`rsi`] - Wilder-smoothed relative strength index

use crate::RatePoint;

pub mod bollinger;
pub mod rsi;
pub mod sma;

pub use bollinger::{bollinger, BollingerBands, DEFAULT_BOLLINGER_K, DEFAULT_BOLLINGER_WINDOW};
pub use rsi::{rsi, DEFAULT_RSI_PERIOD};
pub use sma::sma;

/// Population standard deviation (ddof = 0) of `values` around `mean`.
pub(crate) fn std_pop(values: &[RatePoint], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let var = values
        .iter()
        .map(|p| (p.value - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    var.sqrt()
}
