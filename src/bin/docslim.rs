//! docslim - 画像を削除してDOCXファイルを縮小するCLI
//!
//! # Usage
//!
//! ```bash
//! # 15 MBを超える1ファイルを処理（report.docx.backupを残す）
//! docslim report.docx
//!
//! # ディレクトリ配下を再帰的に処理し、成功したらバックアップを削除
//! docslim ./documents --remove-backup
//!
//! # 閾値を変更し、結果をJSONで出力
//! docslim ./documents --threshold-mb 5 --json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use docslim::{
    BackupPolicy, BatchSummary, DocSlimError, FileOutcome, FileReport, Shrinker, ShrinkerBuilder,
    DEFAULT_SIZE_THRESHOLD_MB,
};
use tracing::{error, Level};

/// Strip embedded images from oversized Word documents
#[derive(Parser, Debug)]
#[command(name = "docslim")]
#[command(version, about, long_about = None)]
struct Args {
    /// A .docx file, or a directory to scan recursively
    path: PathBuf,

    /// Do not create a .backup copy before rewriting
    #[arg(long = "no-backup", conflicts_with = "remove_backup")]
    no_backup: bool,

    /// Only print warnings and errors; suppress the summary
    #[arg(short, long)]
    silent: bool,

    /// Delete the .backup copy after a successful rewrite
    #[arg(long = "remove-backup")]
    remove_backup: bool,

    /// Files at or below this size (MB) are left untouched
    #[arg(long = "threshold-mb", value_name = "MB", default_value_t = DEFAULT_SIZE_THRESHOLD_MB)]
    threshold_mb: f64,

    /// Print the result as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl Args {
    fn backup_policy(&self) -> BackupPolicy {
        if self.no_backup {
            BackupPolicy::Disabled
        } else if self.remove_backup {
            BackupPolicy::RemoveOnSuccess
        } else {
            BackupPolicy::Keep
        }
    }
}

fn init_tracing(silent: bool) {
    let level = if silent { Level::WARN } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), DocSlimError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| DocSlimError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    println!("{}", text);
    Ok(())
}

fn print_file_report(report: &FileReport) {
    match report.outcome {
        FileOutcome::Processed => {
            println!(
                "{}: {:.2} MB -> {:.2} MB (saved {:.2} MB)",
                report.path.display(),
                report.original_size_mb,
                report.new_size_mb,
                report.saved_mb()
            );
            if let Some(backup) = &report.backup_path {
                println!("backup: {}", backup.display());
            }
        }
        FileOutcome::Skipped => println!(
            "{}: {:.2} MB, within threshold, unchanged",
            report.path.display(),
            report.original_size_mb
        ),
        FileOutcome::Failed => println!(
            "{}: failed: {}",
            report.path.display(),
            report.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn print_summary(summary: &BatchSummary) {
    println!("==============================");
    println!("documents:  {}", summary.total_files);
    println!("processed:  {}", summary.processed);
    println!("skipped:    {}", summary.skipped);
    println!("errored:    {}", summary.errored);
    if summary.legacy > 0 {
        println!("legacy .doc (convert manually): {}", summary.legacy);
    }
    println!(
        "size:       {:.2} MB -> {:.2} MB",
        summary.total_original_mb, summary.total_new_mb
    );
    match summary.reduction_percent() {
        Some(percent) => println!("saved:      {:.2} MB ({:.1}%)", summary.saved_mb(), percent),
        None => println!("saved:      0.00 MB"),
    }
    for report in summary.files.iter().filter(|r| !r.is_success()) {
        println!(
            "  failed: {}: {}",
            report.path.display(),
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
}

fn run_file(shrinker: &Shrinker, path: &Path, args: &Args) -> Result<bool, DocSlimError> {
    let report = shrinker.process_file(path);
    if args.json {
        print_json(&report)?;
    } else if !args.silent {
        print_file_report(&report);
    }
    Ok(report.is_success())
}

fn run_directory(shrinker: &Shrinker, dir: &Path, args: &Args) -> Result<bool, DocSlimError> {
    let summary = shrinker.process_directory(dir)?;
    if args.json {
        print_json(&summary)?;
    } else if !args.silent {
        print_summary(&summary);
    }
    Ok(summary.errored == 0)
}

fn run(args: &Args) -> Result<bool, DocSlimError> {
    let shrinker = ShrinkerBuilder::new()
        .with_size_threshold_mb(args.threshold_mb)
        .with_backup_policy(args.backup_policy())
        .build()?;

    if args.path.is_dir() {
        run_directory(&shrinker, &args.path, args)
    } else {
        run_file(&shrinker, &args.path, args)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.silent);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %err, "docslim failed");
            ExitCode::FAILURE
        }
    }
}
