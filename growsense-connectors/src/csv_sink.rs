//! Append-only CSV log
//!
//! One row per polling cycle: a local timestamp followed by one column per
//! reading. A new (or empty) file gets a header row first; an existing file
//! is appended to as-is. Failed readings are written as empty cells so the
//! columns stay aligned.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use core::fmt::Display;
use growsense_core::CycleReport;

use crate::{ConnectorError, ConnectorResult, ReadingSink};

/// Timestamp column format
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header of the timestamp column
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// CSV file with a fixed column layout
pub struct CsvSink {
    path: PathBuf,
    columns: Vec<String>,
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Open `path` for appending, writing the header if the file is new
    pub fn open<P: AsRef<Path>>(path: P, columns: &[&str]) -> ConnectorResult<Self> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| ConnectorError::Io { path: path.display().to_string(), source };

        let file = OpenOptions::new().create(true).append(true).open(&path).map_err(io_err)?;
        let is_new = file.metadata().map_err(io_err)?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(std::iter::once(TIMESTAMP_COLUMN).chain(columns.iter().copied()))?;
            writer.flush().map_err(io_err)?;
            log::info!("Created {} with {} reading columns", path.display(), columns.len());
        }

        Ok(Self {
            path,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            writer,
        })
    }

    /// File being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reading columns, without the timestamp
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Append one row of cells in column order
    pub fn append(&mut self, timestamp: NaiveDateTime, cells: &[Option<f32>]) -> ConnectorResult<()> {
        if cells.len() != self.columns.len() {
            return Err(ConnectorError::Config(format!(
                "row has {} cells, {} has {} columns",
                cells.len(),
                self.path.display(),
                self.columns.len()
            )));
        }

        let mut row = Vec::with_capacity(cells.len() + 1);
        row.push(timestamp.format(TIMESTAMP_FORMAT).to_string());
        row.extend(cells.iter().map(|cell| cell.map(|v| format!("{:.4}", v)).unwrap_or_default()));
        self.writer.write_record(&row)?;
        Ok(())
    }
}

impl ReadingSink for CsvSink {
    /// Columns are matched by name; readings the report lacks are left empty
    fn write_cycle<E: Display>(&mut self, timestamp: NaiveDateTime, report: &CycleReport<E>) -> ConnectorResult<()> {
        let cells: Vec<Option<f32>> = self.columns.iter().map(|column| report.value(column)).collect();
        self.append(timestamp, &cells)?;
        self.flush()
    }

    fn flush(&mut self) -> ConnectorResult<()> {
        let path = &self.path;
        self.writer
            .flush()
            .map_err(|source| ConnectorError::Io { path: path.display().to_string(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use growsense_core::SensorError;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        {
            let mut sink = CsvSink::open(&path, &["tds_ppm", "ph"]).unwrap();
            sink.append(at(12, 0, 0), &[Some(801.0249), Some(6.5)]).unwrap();
            sink.flush().unwrap();
        }
        {
            let mut sink = CsvSink::open(&path, &["tds_ppm", "ph"]).unwrap();
            sink.append(at(12, 0, 1), &[Some(790.0), None]).unwrap();
            sink.flush().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "timestamp,tds_ppm,ph\n\
             2024-05-17 12:00:00,801.0249,6.5000\n\
             2024-05-17 12:00:01,790.0000,\n"
        );
    }

    #[test]
    fn failed_reading_leaves_empty_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycle.csv");
        let mut sink = CsvSink::open(&path, &["tds_ppm", "ph", "thermistor_c"]).unwrap();

        let mut report: CycleReport = CycleReport::new();
        report.record("tds_ppm", Ok(801.0)).unwrap();
        report.record("ph", Err(SensorError::Domain { reason: "pH raw count must be positive" })).unwrap();
        report.record("thermistor_c", Ok(21.05)).unwrap();
        sink.write_cycle(at(8, 30, 0), &report).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let last = contents.lines().last().unwrap();
        assert_eq!(last, "2024-05-17 08:30:00,801.0000,,21.0500");
    }

    #[test]
    fn row_width_must_match_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::open(dir.path().join("w.csv"), &["a", "b"]).unwrap();
        assert!(matches!(sink.append(at(0, 0, 0), &[Some(1.0)]), Err(ConnectorError::Config(_))));
    }
}
