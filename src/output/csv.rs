//! CSV export: `date,rate(BASE->SYMBOL)` header, one `yyyy-MM-dd,value` row per point.

use csv::{Terminator, Writer, WriterBuilder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult, SeriesWriter};
use crate::RatePoint;

const DEFAULT_BUFFER_SIZE: usize = 8192;
const ROW_DATE_FORMAT: &str = "%Y-%m-%d";

/// CSV writer for one currency pair.
pub struct CsvSeriesWriter<W: Write> {
    writer: Writer<W>,
    rows_written: u64,
}

impl<W: Write> CsvSeriesWriter<W> {
    /// Wrap `inner` and write the header row.
    pub fn from_writer(inner: W, base: &str, symbol: &str) -> OutputResult<Self> {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(inner);
        let header = format!("rate({base}->{symbol})");
        writer.write_record(["date", header.as_str()])?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Rows written so far, header excluded
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| OutputError::Io(e.into_error()))
    }
}

impl CsvSeriesWriter<BufWriter<File>> {
    /// Create `path` (and missing parent directories) and write the header.
    pub fn create<P: AsRef<Path>>(path: P, base: &str, symbol: &str) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        Self::from_writer(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file), base, symbol)
    }
}

impl<W: Write> SeriesWriter for CsvSeriesWriter<W> {
    fn write_point(&mut self, point: &RatePoint) -> OutputResult<()> {
        let date = point.timestamp.format(ROW_DATE_FORMAT).to_string();
        self.writer.write_record([date, point.value.to_string()])?;
        self.rows_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Render `points` as CSV text. Empty input renders as an empty string.
pub fn timeseries_csv(base: &str, symbol: &str, points: &[RatePoint]) -> OutputResult<String> {
    if points.is_empty() {
        return Ok(String::new());
    }

    let mut writer = CsvSeriesWriter::from_writer(Vec::new(), base, symbol)?;
    writer.write_points(points)?;
    let bytes = writer.into_inner()?;
    String::from_utf8(bytes).map_err(|e| OutputError::Encoding(e.to_string()))
}

/// Write `points` as CSV to `path`; empty input produces an empty file.
pub fn write_timeseries_csv<P: AsRef<Path>>(
    path: P,
    base: &str,
    symbol: &str,
    points: &[RatePoint],
) -> OutputResult<u64> {
    let path = path.as_ref();
    if points.is_empty() {
        File::create(path)?;
        debug!(path = %path.display(), "wrote empty CSV");
        return Ok(0);
    }

    let mut writer = CsvSeriesWriter::create(path, base, symbol)?;
    writer.write_points(points)?;
    writer.flush()?;
    let rows = writer.rows_written();
    info!(path = %path.display(), rows, "CSV export complete");
    Ok(rows)
}
