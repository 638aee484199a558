//! twreport - batch report / block abusive Twitter accounts

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use libtwreport::clients::twitter::TwitterClient;
use libtwreport::logging::{LogFormat, LoggingConfig};
use libtwreport::sink::default_output_path;
use libtwreport::{merge, BatchEngine, BatchJob, BatchSummary, Config, Credentials, TwreportError};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "twreport")]
#[command(version, about = "Batch report / block abusive Twitter accounts from a csv file")]
#[command(long_about = r#"Batch report / block abusive Twitter accounts from a csv file.

Every account that was reported is appended to an output log right away, so
an interrupted run can be picked up again with `twreport merge`.

CONFIGURATION:
  Settings are read from ~/.config/twreport/config.toml (or the file named
  by TWREPORT_CONFIG). Command-line flags and TWREPORT_* environment
  variables take precedence over the file.

EXIT CODES:
  0 - Success
  1 - Configuration, input/output or other error
  2 - Twitter rejected the credentials
  3 - Malformed input csv"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json or pretty)
    #[arg(long, global = true, env = "TWREPORT_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "TWREPORT_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report (and optionally block) every account listed in a csv file
    Report(ReportArgs),

    /// Drop already reported accounts from a csv file
    ///
    /// Writes every row of --csv whose screen name is not in the output log
    /// given by --out. Screen names compare case-insensitively.
    Merge(MergeArgs),
}

#[derive(clap::Args, Debug)]
struct ReportArgs {
    /// Csv file with the accounts to report
    #[arg(long, value_name = "FILE")]
    csv: PathBuf,

    /// Output log [default: twreport-<timestamp>.csv in the output directory]
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Zero-based column holding the screen name
    #[arg(long, value_name = "N")]
    column: Option<usize>,

    /// Block each account as well as reporting it
    #[arg(long)]
    block: bool,

    /// Only report, even if the config file sets `block = true`
    #[arg(long, conflicts_with = "block")]
    no_block: bool,

    /// Do not ask for confirmation before each account
    #[arg(long)]
    no_prompt: bool,

    /// Go through the file without calling Twitter or logging rows
    #[arg(long, alias = "debug")]
    dry_run: bool,

    /// App consumer key
    #[arg(long, env = "TWREPORT_CONSUMER_KEY", hide_env_values = true)]
    consumer_key: Option<String>,

    /// App consumer secret
    #[arg(long, env = "TWREPORT_CONSUMER_SECRET", hide_env_values = true)]
    consumer_secret: Option<String>,

    /// Access token of the reporting account
    #[arg(long, env = "TWREPORT_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Access token secret of the reporting account
    #[arg(long, env = "TWREPORT_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    access_token_secret: Option<String>,

    /// Seconds to wait after hitting the rate limit [default: 900]
    #[arg(long, value_name = "SECONDS")]
    backoff_secs: Option<u64>,

    /// Summary format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(clap::Args, Debug)]
struct MergeArgs {
    /// Csv file the accounts were reported from
    #[arg(long, value_name = "FILE")]
    csv: PathBuf,

    /// Output log written by `twreport report`
    #[arg(long, value_name = "FILE")]
    out: PathBuf,

    /// Zero-based column holding the screen name
    #[arg(long, value_name = "N")]
    column: Option<usize>,

    /// Where to write the remaining rows [default: stdout]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::new(cli.log_format, cli.log_level.clone(), cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        let code = e
            .downcast_ref::<TwreportError>()
            .map(TwreportError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Report(args) => run_report(args, config).await,
        Commands::Merge(args) => run_merge(args, config),
    }
}

async fn run_report(args: ReportArgs, config: Config) -> Result<()> {
    let twitter = &config.twitter;
    let credentials = Credentials::from_parts(
        args.consumer_key.or_else(|| twitter.consumer_key.clone()),
        args.consumer_secret.or_else(|| twitter.consumer_secret.clone()),
        args.access_token.or_else(|| twitter.access_token.clone()),
        args.access_token_secret
            .or_else(|| twitter.access_token_secret.clone()),
    )?;

    let output = match args.out {
        Some(path) => path,
        None => {
            let path = default_output_path(&config.report.output_dir(), chrono::Utc::now());
            info!("No --out given, logging reported accounts to {}", path.display());
            path
        }
    };

    let job = BatchJob {
        column: args.column.unwrap_or(config.report.column),
        block: resolve_block(args.block, args.no_block, config.report.block),
        prompt: !args.no_prompt,
        dry_run: args.dry_run,
        backoff: args
            .backoff_secs
            .map(std::time::Duration::from_secs)
            .unwrap_or_else(|| config.report.backoff()),
        ..BatchJob::new(args.csv, output)
    };

    let client = TwitterClient::with_base_url(credentials, twitter.api_base())?;
    let mut engine = BatchEngine::new(job, client);
    let summary = engine.run().await?;

    match args.format {
        OutputFormat::Text => print_summary(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

/// `--block` / `--no-block` win over the config file
fn resolve_block(block: bool, no_block: bool, configured: bool) -> bool {
    if no_block {
        false
    } else {
        block || configured
    }
}

fn print_summary(summary: &BatchSummary) {
    if summary.dry_run {
        println!("Dry run, nothing was reported.");
        println!("Would report: {}", summary.simulated);
    } else {
        println!("Reported: {}", summary.reported);
    }
    println!("Rows read: {}", summary.rows_read);
    println!("Skipped (no screen name): {}", summary.skipped);
    println!("Declined: {}", summary.rejected);
    println!("Rate limit waits: {}", summary.rate_limit_waits);
    println!("Failed: {}", summary.failed.len());
    for failed in &summary.failed {
        println!("  {}: {}", failed.identifier, failed.cause);
    }
    if summary.dry_run {
        println!("Output log (not written): {}", summary.output.display());
    } else {
        println!("Output log: {}", summary.output.display());
    }
}

fn run_merge(args: MergeArgs, config: Config) -> Result<()> {
    let column = args.column.unwrap_or(config.report.column);

    let summary = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            merge::merge_files(&args.csv, &args.out, column, file)?
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            let summary = merge::merge_files(&args.csv, &args.out, column, &mut lock)?;
            lock.flush()?;
            summary
        }
    };

    eprintln!(
        "Kept {} rows, removed {} already reported",
        summary.kept, summary.removed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_block() {
        assert!(!resolve_block(false, false, false));
        assert!(resolve_block(false, false, true));
        assert!(resolve_block(true, false, false));
        assert!(!resolve_block(false, true, true));
    }

    #[test]
    fn test_block_flags_conflict() {
        let result = Cli::try_parse_from([
            "twreport", "report", "--csv", "in.csv", "--block", "--no-block",
        ]);
        assert!(result.is_err());
    }
}
