//! docslim - Pure-Rust DOCX image stripper and spreadsheet-to-prose converter for RAG ingestion
//!
//! This crate shrinks oversized Word documents (`.docx`) by removing every embedded
//! image while keeping the text, and converts tabular data (CSV / Excel) into
//! `column：value` paragraphs that text-only retrieval pipelines can index.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use docslim::ShrinkerBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Files at or below 15 MB are left untouched
//!     let shrinker = ShrinkerBuilder::new().build()?;
//!
//!     let report = shrinker.process_file("report.docx");
//!     println!(
//!         "{:?}: {:.2} MB -> {:.2} MB",
//!         report.outcome, report.original_size_mb, report.new_size_mb
//!     );
//!
//!     Ok(())
//! }
//! ```
//!
//! # Batch Processing
//!
//! ```rust,no_run
//! use docslim::{BackupPolicy, ShrinkerBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shrinker = ShrinkerBuilder::new()
//!         .with_size_threshold_mb(10.0)
//!         .with_backup_policy(BackupPolicy::RemoveOnSuccess)
//!         .build()?;
//!
//!     let summary = shrinker.process_directory("documents")?;
//!     println!(
//!         "{} processed, {} skipped, {} failed, {:.2} MB saved",
//!         summary.processed,
//!         summary.skipped,
//!         summary.errored,
//!         summary.saved_mb()
//!     );
//!
//!     Ok(())
//! }
//! ```
//!
//! # Spreadsheet to Prose
//!
//! ```rust,no_run
//! use docslim::{ProseConverterBuilder, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ProseConverterBuilder::new()
//!         .with_sheet_selector(SheetSelector::Index(0))
//!         .build()?;
//!
//!     // Writes plan_clean.txt next to the input
//!     let report = converter.convert_file("plan.xlsx", None)?;
//!     println!("{} paragraphs", report.paragraphs);
//!
//!     // Or keep the text in memory
//!     let text = converter.convert_to_string("people.csv")?;
//!     println!("{}", text);
//!
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod error;
mod package;
mod prose;
mod security;
mod shrink;
mod types;

// 公開API
pub use api::{BackupPolicy, DocumentKind, FileOutcome, SheetSelector};
pub use builder::{
    ProseConverter, ProseConverterBuilder, Shrinker, ShrinkerBuilder, DEFAULT_SIZE_THRESHOLD_MB,
};
pub use error::DocSlimError;
pub use package::{document_kind, is_supported, rewrite, size_of};
pub use prose::{build_output_path, RenderOptions, Table, TableRow, DEFAULT_SEPARATOR};
pub use shrink::backup_path_for;
pub use types::{
    BatchSummary, ConversionReport, FileReport, PartOutcome, PartReport, RewriteReport,
};
