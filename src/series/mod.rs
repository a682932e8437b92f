//! Series normalization and downsampling
//!
//! - [`normalize`] turns a raw [`TimeseriesResponse`](crate::TimeseriesResponse)
//!   into a sorted point sequence for one symbol
//! - [`downsample::reduce`] bounds a long sequence for charting while keeping
//!   per-bucket extrema and the first/last points

use crate::RatePoint;

pub mod downsample;
pub mod normalize;

pub use downsample::reduce;
pub use normalize::{normalize, SERIES_DATE_FORMAT};

/// Sort ascending by timestamp and collapse duplicate timestamps.
///
/// For duplicates the later point in the input wins.
pub fn sort_and_dedup(mut points: Vec<RatePoint>) -> Vec<RatePoint> {
    // Stable sort keeps input order among equal timestamps.
    points.sort_by_key(|p| p.timestamp);

    let mut out: Vec<RatePoint> = Vec::with_capacity(points.len());
    for point in points {
        match out.last_mut() {
            Some(last) if last.timestamp == point.timestamp => *last = point,
            _ => out.push(point),
        }
    }
    out
}

/// Whether timestamps are strictly ascending.
pub fn is_strictly_ascending(points: &[RatePoint]) -> bool {
    points.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
}
