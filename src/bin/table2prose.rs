//! table2prose - CSV / Excelの表を「列名：値」の段落テキストへ変換するCLI
//!
//! # Usage
//!
//! ```bash
//! # plan.xlsxの先頭シートをplan_clean.txtへ
//! table2prose plan.xlsx
//!
//! # シートと出力先を指定
//! table2prose plan.xlsx --sheet 研发计划 --output ./out/
//!
//! # GBKのCSVを箇条書きなしで変換
//! table2prose legacy.csv --encoding gbk --no-bullet
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use docslim::{DocSlimError, ProseConverterBuilder, SheetSelector};
use tracing::{error, info, warn, Level};

/// Convert a CSV or Excel table into "column：value" paragraphs
#[derive(Parser, Debug)]
#[command(name = "table2prose")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input .csv or .xlsx/.xlsm/.xltx/.xltm file
    input: PathBuf,

    /// Sheet name (Excel only; defaults to the first sheet)
    #[arg(long, value_name = "NAME")]
    sheet: Option<String>,

    /// Output file or existing directory (defaults to <stem>_clean.txt next to the input)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Do not prefix each line with "- "
    #[arg(long = "no-bullet")]
    no_bullet: bool,

    /// CSV text encoding
    #[arg(long, value_name = "LABEL", default_value = "utf-8-sig")]
    encoding: String,
}

fn run(args: &Args) -> Result<(), DocSlimError> {
    let selector = match &args.sheet {
        Some(name) => SheetSelector::Name(name.clone()),
        None => SheetSelector::First,
    };

    let converter = ProseConverterBuilder::new()
        .with_sheet_selector(selector)
        .with_bullets(!args.no_bullet)
        .with_encoding(args.encoding.as_str())
        .build()?;

    let report = converter.convert_file(&args.input, args.output.as_deref())?;
    match &report.output_path {
        Some(path) => info!(
            output = %path.display(),
            paragraphs = report.paragraphs,
            "conversion finished"
        ),
        None => warn!(input = %args.input.display(), "no text produced, nothing written"),
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "table2prose failed");
            ExitCode::FAILURE
        }
    }
}
