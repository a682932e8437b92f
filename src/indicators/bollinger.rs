use super::{sma, std_pop};
use crate::RatePoint;

/// Default band window
pub const DEFAULT_BOLLINGER_WINDOW: usize = 20;
/// Default band width in standard deviations
pub const DEFAULT_BOLLINGER_K: f64 = 2.0;

/// Bollinger Bands: middle SMA with upper/lower envelopes.
///
/// All three series share timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerBands {
    /// SMA(window)
    pub middle: Vec<RatePoint>,
    /// middle + k·σ
    pub upper: Vec<RatePoint>,
    /// middle - k·σ
    pub lower: Vec<RatePoint>,
}

impl BollingerBands {
    /// Whether the bands are empty (series shorter than the window).
    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }

    /// Number of points per band
    pub fn len(&self) -> usize {
        self.middle.len()
    }
}

/// Bollinger Bands over `window` points, `k` population standard deviations wide.
pub fn bollinger(points: &[RatePoint], window: usize, k: f64) -> BollingerBands {
    let middle = sma(points, window);
    if middle.is_empty() {
        return BollingerBands::default();
    }

    let (upper, lower) = middle
        .iter()
        .zip(points.windows(window))
        .map(|(m, slice)| {
            let offset = k * std_pop(slice, m.value);
            (
                RatePoint::new(m.timestamp, m.value + offset),
                RatePoint::new(m.timestamp, m.value - offset),
            )
        })
        .unzip();

    BollingerBands {
        middle,
        upper,
        lower,
    }
}
