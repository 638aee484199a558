//! Sequential reader over the input csv

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{InputError, Result};
use crate::types::Record;

/// Forward-only stream of [`Record`]s.
///
/// There is no header handling: every line is a record. All records must
/// have the same number of fields; a ragged line is reported as malformed.
pub struct RowSource<R: Read> {
    reader: csv::Reader<R>,
    buf: csv::StringRecord,
}

impl RowSource<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| InputError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> RowSource<R> {
    pub fn from_reader(reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b',')
            .flexible(false)
            .from_reader(reader);

        Self {
            reader,
            buf: csv::StringRecord::new(),
        }
    }

    /// Next record, `Ok(None)` at end of input.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        match self.reader.read_record(&mut self.buf) {
            Ok(true) => Ok(Some(Record::new(
                self.buf.iter().map(str::to_string).collect(),
            ))),
            Ok(false) => Ok(None),
            Err(e) => Err(malformed(e).into()),
        }
    }
}

fn malformed(error: csv::Error) -> InputError {
    let line = error.position().map(|p| p.line());
    let message = match error.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {} fields, found {}", expected_len, len),
        _ => error.to_string(),
    };
    InputError::Malformed { line, message }
}
