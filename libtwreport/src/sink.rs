//! Append-only output log
//!
//! Every row is flushed and synced before the call returns, so an
//! interrupted run leaves all previously reported rows on disk.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{OutputError, Result};
use crate::types::ResultRow;

pub const HEADER: [&str; 3] = ["screen_name", "report", "block"];

/// Output path used when none is given, derived from the run's start time.
///
/// Millisecond precision keeps two runs started in the same second apart;
/// within one run the name is derived exactly once.
pub fn default_output_path(dir: &Path, started_at: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "twreport-{}.csv",
        started_at.format("%Y%m%d-%H%M%S%.3f")
    ))
}

pub struct ResultSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    /// The file already had content when opened
    resumed: bool,
    rows_written: usize,
}

impl ResultSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let open_error = |source| OutputError::Open {
            path: path.display().to_string(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_error)?;
        let resumed = file.metadata().map_err(open_error)?.len() > 0;

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            resumed,
            rows_written: 0,
        })
    }

    /// Write the column header, unless the file already holds an earlier
    /// run's log.
    pub fn write_header(&mut self) -> Result<()> {
        if self.resumed {
            tracing::debug!("Appending to existing log {}", self.path.display());
            return Ok(());
        }
        self.writer.write_record(HEADER).map_err(OutputError::Write)?;
        self.commit()
    }

    pub fn append(&mut self, row: &ResultRow) -> Result<()> {
        self.writer.serialize(row).map_err(OutputError::Write)?;
        self.commit()?;
        self.rows_written += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.writer.flush().map_err(OutputError::Flush)?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(OutputError::Flush)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended by this sink (not counting earlier runs)
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}
