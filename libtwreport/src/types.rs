//! Core types for twreport

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_BACKOFF_SECS;

/// Settings for one `report` run. Fixed once the run starts.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Zero-based column holding the screen name
    pub column: usize,
    pub block: bool,
    /// Ask the operator before every action
    pub prompt: bool,
    /// Walk the input and prompts without calling the API or logging rows
    pub dry_run: bool,
    /// How long to wait after a rate-limit response before trying again
    pub backoff: Duration,
}

impl BatchJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            column: 0,
            block: false,
            prompt: true,
            dry_run: false,
            backoff: Duration::from_secs(DEFAULT_BACKOFF_SECS),
        }
    }
}

/// One input line, split into fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The screen name at `column`, if the record has that column and it is
    /// not blank.
    pub fn identifier(&self, column: usize) -> Option<&str> {
        self.fields
            .get(column)
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
    }
}

/// What a single remote action attempt came back with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The account was reported (and blocked, if asked)
    Success { identifier: String, blocked: bool },
    /// Over the quota for this kind of action; try again later
    RateLimited,
    /// Anything else. Never retried.
    Failed { cause: String },
}

/// A line of the output log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "screen_name")]
    pub identifier: String,
    #[serde(rename = "report")]
    pub reported: bool,
    #[serde(rename = "block")]
    pub blocked: bool,
}

impl ResultRow {
    pub fn reported(identifier: impl Into<String>, blocked: bool) -> Self {
        Self {
            identifier: identifier.into(),
            reported: true,
            blocked,
        }
    }
}

/// A row whose action failed and was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRow {
    pub identifier: String,
    pub cause: String,
}

/// Counters for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub output: PathBuf,
    pub dry_run: bool,
    pub rows_read: usize,
    pub reported: usize,
    /// Rows with no usable value in the configured column
    pub skipped: usize,
    /// Rows the operator answered "no" for
    pub rejected: usize,
    /// Rows that would have been actioned in a dry run
    pub simulated: usize,
    pub rate_limit_waits: usize,
    pub failed: Vec<FailedRow>,
}
