//! twreport - batch report / block abusive accounts
//!
//! Reads screen names from a csv file and reports each one through a
//! rate-limited moderation API, logging every successful report to an
//! append-only csv so long runs can be audited or resumed.

pub mod clients;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod merge;
pub mod prompt;
pub mod sink;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use clients::RemoteActionClient;
pub use config::{Config, Credentials};
pub use engine::BatchEngine;
pub use error::{Result, TwreportError};
pub use types::{ActionOutcome, BatchJob, BatchSummary, Record, ResultRow};
