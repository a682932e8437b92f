//! Raw response -> point sequence.

use chrono::NaiveDate;
use tracing::trace;

use crate::{RatePoint, TimeseriesResponse};

/// Date key format used by the rate table (`yyyy-MM-dd`).
pub const SERIES_DATE_FORMAT: &str = "%Y-%m-%d";

/// Extract the `symbol` series from `response`, sorted ascending.
///
/// Dates whose key does not parse, or whose row has no entry for `symbol`,
/// are skipped silently: sparse data is expected. Each date becomes a point
/// at 00:00 UTC.
pub fn normalize(response: &TimeseriesResponse, symbol: &str) -> Vec<RatePoint> {
    let mut points: Vec<RatePoint> = response
        .rates
        .iter()
        .filter_map(|(date_key, row)| {
            let value = *row.get(symbol)?;
            let date = match NaiveDate::parse_from_str(date_key, SERIES_DATE_FORMAT) {
                Ok(date) => date,
                Err(_) => {
                    trace!(date_key, "skipping unparsable date key");
                    return None;
                }
            };
            let timestamp = date.and_hms_opt(0, 0, 0)?.and_utc();
            Some(RatePoint::new(timestamp, value))
        })
        .collect();

    points.sort_by_key(|p| p.timestamp);
    points
}
