use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use roster_fetch::{
    consolidate, download_all, ConsolidateOptions, DownloadOptions, HttpFetcher,
    DEFAULT_BASE_URL, DEFAULT_CHARACTER_COUNT, DEFAULT_CONCURRENCY,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Fetch and consolidate villager sprite assets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download every character folder and write all-characters.json.
    Download(DownloadArgs),
    /// Rebuild all-characters.json from folders already on disk.
    Consolidate(ConsolidateArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Public web root; assets land in <out>/characters.
    #[arg(long, default_value = "public")]
    out: PathBuf,
    /// Number of characters, numbered from 1.
    #[arg(long, default_value_t = DEFAULT_CHARACTER_COUNT)]
    count: u32,
}

#[derive(Args)]
struct DownloadArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Reuse files already on disk.
    #[arg(long)]
    resume: bool,
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Args)]
struct ConsolidateArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Delete answer.txt / short-answer.txt and omit the text block.
    #[arg(long)]
    strip_text: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Download(args) => run_download(args),
        Command::Consolidate(args) => run_consolidate(args),
    }
}

fn run_download(args: DownloadArgs) -> ExitCode {
    let fetcher = match HttpFetcher::new() {
        Ok(fetcher) => fetcher,
        Err(err) => {
            error!(error = %err, "http_client_failed");
            return ExitCode::FAILURE;
        }
    };
    let options = DownloadOptions {
        base_url: args.base_url,
        count: args.common.count,
        concurrency: args.concurrency,
        resume: args.resume,
        ..DownloadOptions::new(args.common.out)
    };

    match download_all(&fetcher, &options) {
        Ok(report) => {
            info!(
                downloaded = report.records,
                total = options.count,
                path = %report.roster_path.display(),
                "download_complete"
            );
            if !report.failed.is_empty() {
                warn!(
                    failed = report.failed.len(),
                    "some characters failed; rerun with --resume to retry them"
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "roster_write_failed");
            ExitCode::FAILURE
        }
    }
}

fn run_consolidate(args: ConsolidateArgs) -> ExitCode {
    let options = ConsolidateOptions {
        public_root: args.common.out,
        count: args.common.count,
        strip_text: args.strip_text,
    };
    match consolidate(&options) {
        Ok(report) => {
            info!(
                characters = report.records,
                failed = report.failed.len(),
                removed_files = report.removed_files,
                path = %report.roster_path.display(),
                "consolidate_complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "roster_write_failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
