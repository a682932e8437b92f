//! Extrema-preserving downsampling for charts.
//!
//! The series is cut into contiguous buckets of
//! `ceil(n / floor(max_points / 2))` points; each bucket contributes its
//! minimum and maximum (earlier one first), the original first and last
//! points are always kept, then the result is de-duplicated by timestamp,
//! sorted, and capped at `max_points`. Peaks and valleys survive even at high
//! compression ratios.

use std::collections::HashSet;

use crate::RatePoint;

/// Reduce `points` to at most `max_points`.
///
/// Identity when `points.len() <= max_points` or `max_points <= 2`.
/// Input must be sorted ascending by timestamp.
pub fn reduce(points: &[RatePoint], max_points: usize) -> Vec<RatePoint> {
    let n = points.len();
    if n <= max_points || max_points <= 2 {
        return points.to_vec();
    }

    let bucket_size = n.div_ceil(max_points / 2);
    let mut picked: Vec<RatePoint> = Vec::with_capacity(max_points + 2);

    picked.push(points[0]);
    for bucket in points.chunks(bucket_size) {
        let (min, max) = extrema(bucket);
        if min.timestamp <= max.timestamp {
            picked.push(min);
            picked.push(max);
        } else {
            picked.push(max);
            picked.push(min);
        }
    }
    picked.push(points[n - 1]);

    let mut seen = HashSet::with_capacity(picked.len());
    picked.retain(|p| seen.insert(p.timestamp));
    picked.sort_by_key(|p| p.timestamp);

    if picked.len() > max_points {
        // Cap the count without losing the final point.
        let last = picked[picked.len() - 1];
        picked.truncate(max_points - 1);
        picked.push(last);
    }
    picked
}

/// Minimum and maximum of a non-empty bucket; ties resolve to the earliest point.
fn extrema(bucket: &[RatePoint]) -> (RatePoint, RatePoint) {
    let mut min = bucket[0];
    let mut max = bucket[0];
    for p in &bucket[1..] {
        if p.value < min.value {
            min = *p;
        }
        if p.value > max.value {
            max = *p;
        }
    }
    (min, max)
}
