//! Reconcile an input file against an output log
//!
//! Writes every input row whose screen name is not already in the log, so
//! an interrupted batch can be restarted on just the remaining accounts.
//! Screen names compare case-insensitively.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{InputError, OutputError, Result};
use crate::sink::HEADER;
use crate::source::RowSource;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Distinct screen names found in the log
    pub logged: usize,
    /// Input rows written out
    pub kept: usize,
    /// Input rows dropped because the log already has them
    pub removed: usize,
}

/// Screen names already present in an output log, lowercased.
///
/// Only a first record spelling out the log header is treated as one; an
/// account actually named `screen_name` further down is kept.
pub fn logged_identifiers<R: Read>(log: R) -> Result<HashSet<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(log);

    let mut seen = HashSet::new();
    let mut record = csv::StringRecord::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                return Err(InputError::Malformed {
                    line: e.position().map(|p| p.line()),
                    message: format!("output log: {}", e),
                }
                .into())
            }
        }

        if record.position().map_or(false, |p| p.record() == 0)
            && record.iter().map(str::trim).eq(HEADER)
        {
            continue;
        }
        let Some(name) = record.get(0).map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        seen.insert(name.to_lowercase());
    }
    Ok(seen)
}

/// Stream `input` to `out`, dropping rows whose `column` value is in `logged`.
///
/// Rows without a value in `column` are kept; nothing was done for them.
pub fn reconcile<R: Read, W: Write>(
    mut input: RowSource<R>,
    logged: &HashSet<String>,
    column: usize,
    out: W,
) -> Result<MergeSummary> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    let mut summary = MergeSummary {
        logged: logged.len(),
        ..Default::default()
    };

    while let Some(record) = input.next_record()? {
        if let Some(id) = record.identifier(column) {
            if logged.contains(&id.to_lowercase()) {
                debug!("Dropping already reported user {}", id);
                summary.removed += 1;
                continue;
            }
        }
        writer
            .write_record(record.fields())
            .map_err(OutputError::Write)?;
        summary.kept += 1;
    }

    writer.flush().map_err(OutputError::Flush)?;
    Ok(summary)
}

/// Open both files and reconcile them into `out`.
pub fn merge_files<W: Write>(
    input: &Path,
    log: &Path,
    column: usize,
    out: W,
) -> Result<MergeSummary> {
    let log_file = File::open(log).map_err(|source| InputError::Open {
        path: log.display().to_string(),
        source,
    })?;
    let logged = logged_identifiers(log_file)?;
    info!(
        log = %log.display(),
        count = logged.len(),
        "Loaded already reported users"
    );

    let summary = reconcile(RowSource::open(input)?, &logged, column, out)?;
    info!(
        kept = summary.kept,
        removed = summary.removed,
        "Merge finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn source(text: &str) -> RowSource<Cursor<Vec<u8>>> {
        RowSource::from_reader(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_logged_identifiers_skips_header() {
        let log = "screen_name,report,block\nAlice,true,false\nbob,true,true\n";
        let seen = logged_identifiers(Cursor::new(log)).unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("alice"));
        assert!(seen.contains("bob"));
        assert!(!seen.contains("screen_name"));
    }

    #[test]
    fn test_account_named_like_header_column_is_kept() {
        let log = "screen_name,report,block\nscreen_name,true,false\nalice,true,false\n";
        let seen = logged_identifiers(Cursor::new(log)).unwrap();
        assert!(seen.contains("screen_name"));
        assert_eq!(seen.len(), 2);

        // Headerless log whose first account is `screen_name`
        let log = "screen_name,true,true\n";
        let seen = logged_identifiers(Cursor::new(log)).unwrap();
        assert!(seen.contains("screen_name"));
    }

    #[test]
    fn test_logged_identifiers_empty_log() {
        let seen = logged_identifiers(Cursor::new("")).unwrap();
        assert!(seen.is_empty());
    }

    #[test]
    fn test_reconcile_drops_logged_rows() {
        let logged: HashSet<String> = ["alice".to_string()].into_iter().collect();
        let mut out = Vec::new();

        let summary = reconcile(
            source("1,ALICE,spam\n2,bob,abuse\n3,,unknown\n"),
            &logged,
            1,
            &mut out,
        )
        .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "2,bob,abuse\n3,,unknown\n");
        assert_eq!(
            summary,
            MergeSummary {
                logged: 1,
                kept: 2,
                removed: 1
            }
        );
    }

    #[test]
    fn test_reconcile_preserves_quoting() {
        let logged = HashSet::new();
        let mut out = Vec::new();
        reconcile(source("carol,\"a, b\"\n"), &logged, 0, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "carol,\"a, b\"\n");
    }

    #[test]
    fn test_merge_files() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.csv");
        let log = temp.path().join("log.csv");
        std::fs::write(&input, "alice\nbob\ncarol\n").unwrap();
        std::fs::write(&log, "screen_name,report,block\nbob,true,false\n").unwrap();

        let mut out = Vec::new();
        let summary = merge_files(&input, &log, 0, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "alice\ncarol\n");
        assert_eq!(summary.removed, 1);
    }

    #[test]
    fn test_merge_files_missing_log() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.csv");
        std::fs::write(&input, "alice\n").unwrap();

        let result = merge_files(&input, &temp.path().join("nope.csv"), 0, Vec::new());
        assert!(result.is_err());
    }
}
