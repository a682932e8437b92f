use crate::RatePoint;

/// Simple moving average over `window` points.
///
/// Returns `len - window + 1` points, each stamped with the last point of its
/// window. Empty when `window <= 1` or the series is shorter than `window`.
pub fn sma(points: &[RatePoint], window: usize) -> Vec<RatePoint> {
    if window <= 1 || points.len() < window {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(points.len() - window + 1);
    let mut sum = 0.0;
    for (i, point) in points.iter().enumerate() {
        sum += point.value;
        if i >= window {
            sum -= points[i - window].value;
        }
        if i + 1 >= window {
            out.push(RatePoint::new(point.timestamp, sum / window as f64));
        }
    }
    out
}
