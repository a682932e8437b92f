use crate::RatePoint;

/// Default RSI period
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Relative Strength Index with Wilder smoothing.
///
/// The averages are seeded with the simple mean gain/loss of the first
/// `period` differences; each later difference is smoothed in with
/// `(prev * (period - 1) + current) / period` and emits one value stamped at
/// the point that closes it. The seed itself is not emitted, so the output has
/// `points.len() - period - 1` values. A zero average loss saturates at 100.
/// Empty when `period == 0` or `points.len() <= period + 1`.
pub fn rsi(points: &[RatePoint], period: usize) -> Vec<RatePoint> {
    if period == 0 || points.len() <= period + 1 {
        return Vec::new();
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = points
        .windows(2)
        .map(|w| {
            let diff = w[1].value - w[0].value;
            (diff.max(0.0), (-diff).max(0.0))
        })
        .unzip();

    let p = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / p;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / p;

    let mut out = Vec::with_capacity(points.len() - period - 1);

    for i in period..gains.len() {
        avg_gain = (avg_gain * (p - 1.0) + gains[i]) / p;
        avg_loss = (avg_loss * (p - 1.0) + losses[i]) / p;
        out.push(RatePoint::new(points[i + 1].timestamp, strength(avg_gain, avg_loss)));
    }
    out
}

fn strength(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}
