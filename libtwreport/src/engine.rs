//! Batch engine: input rows in, reported accounts out
//!
//! One row at a time, in input order:
//!
//! 1. take the screen name from the configured column (rows without one
//!    are skipped),
//! 2. ask the operator, when prompting is on (a "no" skips the row),
//! 3. call the client; a rate limit puts the engine to sleep for the
//!    back-off interval and the same row is tried again, as often as it
//!    takes; any other failure is logged and the row is skipped,
//! 4. append the row to the output log and make it durable before moving
//!    on.
//!
//! Credentials are verified before anything is written. A failed
//! verification or a malformed input line ends the run with an error.

use std::fs::File;
use std::io::Read;

use tracing::{debug, info, warn};

use crate::clients::RemoteActionClient;
use crate::error::Result;
use crate::prompt::{ConfirmationGate, TerminalGate};
use crate::sink::ResultSink;
use crate::source::RowSource;
use crate::types::{ActionOutcome, BatchJob, BatchSummary, FailedRow, ResultRow};

/// How an action ended once rate limits were waited out
enum Settled {
    Reported(ResultRow),
    Failed(String),
}

pub struct BatchEngine<C: RemoteActionClient> {
    job: BatchJob,
    client: C,
    /// Falls back to a stdin/stdout prompt on first use
    gate: Option<Box<dyn ConfirmationGate>>,
}

impl<C: RemoteActionClient> BatchEngine<C> {
    /// Engine that prompts on the terminal when the job asks for it
    pub fn new(job: BatchJob, client: C) -> Self {
        Self {
            job,
            client,
            gate: None,
        }
    }

    pub fn with_gate(mut self, gate: Box<dyn ConfirmationGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run the job against its input file.
    ///
    /// The input is opened only after the credentials check out.
    pub async fn run(&mut self) -> Result<BatchSummary> {
        self.verify().await?;
        let source = RowSource::<File>::open(&self.job.input)?;
        self.process(source).await
    }

    /// Run the job against an already opened source.
    pub async fn run_with_source<R: Read>(
        &mut self,
        source: RowSource<R>,
    ) -> Result<BatchSummary> {
        self.verify().await?;
        self.process(source).await
    }

    async fn verify(&mut self) -> Result<()> {
        info!(client = self.client.name(), "Verifying credentials");
        self.client.verify_credentials().await?;
        info!("Credentials verified");
        Ok(())
    }

    async fn process<R: Read>(&mut self, mut source: RowSource<R>) -> Result<BatchSummary> {
        // A dry run leaves no trace on disk, not even a header
        let mut sink = if self.job.dry_run {
            info!(output = %self.job.output.display(), "[dry-run] Output log will not be written");
            None
        } else {
            let mut sink = ResultSink::open(&self.job.output)?;
            sink.write_header()?;
            info!(output = %sink.path().display(), "Logging reported accounts");
            Some(sink)
        };

        let mut summary = BatchSummary {
            output: self.job.output.clone(),
            dry_run: self.job.dry_run,
            ..Default::default()
        };

        while let Some(record) = source.next_record()? {
            summary.rows_read += 1;

            let Some(identifier) = record.identifier(self.job.column) else {
                debug!(
                    row = summary.rows_read,
                    column = self.job.column,
                    "No screen name in column, skipping row"
                );
                summary.skipped += 1;
                continue;
            };

            if self.job.prompt && !self.confirm(identifier)? {
                info!("Skipping user {}", identifier);
                summary.rejected += 1;
                continue;
            }

            if self.job.dry_run {
                info!(
                    "[dry-run] Would report user {} (blocked: {})",
                    identifier, self.job.block
                );
                summary.simulated += 1;
                continue;
            }

            match self.act_until_settled(identifier, &mut summary).await {
                Settled::Reported(row) => {
                    if let Some(sink) = sink.as_mut() {
                        sink.append(&row)?;
                    }
                    info!("User {} reported (blocked: {})", row.identifier, row.blocked);
                    summary.reported += 1;
                }
                Settled::Failed(cause) => {
                    warn!("Failed to report user {}: {}", identifier, cause);
                    summary.failed.push(FailedRow {
                        identifier: identifier.to_string(),
                        cause,
                    });
                }
            }
        }

        info!(
            rows = summary.rows_read,
            reported = summary.reported,
            failed = summary.failed.len(),
            rejected = summary.rejected,
            skipped = summary.skipped,
            simulated = summary.simulated,
            rate_limit_waits = summary.rate_limit_waits,
            "Batch finished"
        );
        Ok(summary)
    }

    fn confirm(&mut self, identifier: &str) -> Result<bool> {
        let question = if self.job.block {
            format!(
                "WARNING: Are you sure you want to report and block user `{}`? (y/n): ",
                identifier
            )
        } else {
            format!(
                "WARNING: Are you sure you want to report user `{}`? (y/n): ",
                identifier
            )
        };
        self.gate
            .get_or_insert_with(|| Box::new(TerminalGate::stdio()) as Box<dyn ConfirmationGate>)
            .confirm(&question)
    }

    /// Call the client until it gives an answer other than "rate limited".
    async fn act_until_settled(&self, identifier: &str, summary: &mut BatchSummary) -> Settled {
        let mut attempt: u32 = 1;
        loop {
            match self.client.act(identifier, self.job.block).await {
                ActionOutcome::Success {
                    identifier,
                    blocked,
                } => return Settled::Reported(ResultRow::reported(identifier, blocked)),
                ActionOutcome::Failed { cause } => return Settled::Failed(cause),
                ActionOutcome::RateLimited => {
                    warn!(
                        user = identifier,
                        attempt,
                        "You are over the limit for spam reports. Sleeping for {}",
                        humantime::format_duration(self.job.backoff)
                    );
                    summary.rate_limit_waits += 1;
                    tokio::time::sleep(self.job.backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
