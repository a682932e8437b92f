//! Series export writers

use crate::RatePoint;

pub mod csv;

pub use self::csv::{timeseries_csv, write_timeseries_csv, CsvSeriesWriter};

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// Buffer could not be turned back into text
    #[error("output is not valid UTF-8: {0}")]
    Encoding(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Sink for a rate series.
pub trait SeriesWriter {
    /// Write a single point
    fn write_point(&mut self, point: &RatePoint) -> OutputResult<()>;

    /// Write several points in order
    fn write_points(&mut self, points: &[RatePoint]) -> OutputResult<()> {
        for point in points {
            self.write_point(point)?;
        }
        Ok(())
    }

    /// Flush buffered rows
    fn flush(&mut self) -> OutputResult<()>;
}
