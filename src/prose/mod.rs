//! Prose Module
//!
//! 表データ（CSV / Excel）を、テキスト検索向けの自然言語段落へ変換する。

mod reader;
mod render;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::builder::ProseConfig;
use crate::error::DocSlimError;
use crate::types::ConversionReport;

pub use reader::Table;
pub use render::{RenderOptions, TableRow, DEFAULT_SEPARATOR};

pub(crate) use reader::resolve_encoding;

use reader::TableFormat;

/// 出力ファイル名の接尾辞
const OUTPUT_SUFFIX: &str = "_clean.txt";

/// 出力先のパスを決定する
///
/// - `output`が既存のディレクトリ → `<output>/<stem>_clean.txt`
/// - `output`がそれ以外 → そのまま使用
/// - `output`なし → 入力ファイルと同じディレクトリの`<stem>_clean.txt`
///
/// # 使用例
///
/// ```rust
/// use std::path::Path;
/// use docslim::build_output_path;
///
/// let out = build_output_path(Path::new("data/plan.xlsx"), None);
/// assert_eq!(out, Path::new("data/plan_clean.txt"));
/// ```
pub fn build_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{}{}", stem, OUTPUT_SUFFIX);

    match output {
        Some(output) if output.is_dir() => output.join(file_name),
        Some(output) => output.to_path_buf(),
        None => input.with_file_name(file_name),
    }
}

/// 入力ファイルを読み込む
pub(crate) fn read_table(input: &Path, config: &ProseConfig) -> Result<Table, DocSlimError> {
    match TableFormat::from_path(input) {
        Some(TableFormat::Excel) => reader::read_excel(input, &config.sheet_selector),
        Some(TableFormat::Csv) => reader::read_csv(input, config.encoding),
        None => Err(DocSlimError::UnsupportedFormat {
            path: input.to_path_buf(),
            message: "only Excel (.xlsx, .xlsm, .xltx, .xltm) and CSV files are supported"
                .to_string(),
        }),
    }
}

/// 表を段落へ変換する
pub(crate) fn render_table(table: &Table, config: &ProseConfig) -> Vec<String> {
    render::render_paragraphs(&table.headers, &table.rows, &config.render)
}

/// 表を段落へ変換し、空行で連結する
pub(crate) fn render_text(table: &Table, config: &ProseConfig) -> String {
    render::render_rows(&table.headers, &table.rows, &config.render)
}

/// 入力ファイルを変換し、テキストファイルとして書き出す
///
/// 段落が1つも生成されない場合はファイルを書き出さない。
pub(crate) fn convert_file(
    input: &Path,
    output: Option<&Path>,
    config: &ProseConfig,
) -> Result<ConversionReport, DocSlimError> {
    let table = read_table(input, config)?;
    let paragraphs = render_table(&table, config);

    if paragraphs.is_empty() {
        warn!(input = %input.display(), "table has no usable content");
        return Ok(ConversionReport {
            output_path: None,
            paragraphs: 0,
        });
    }

    let output_path = build_output_path(input, output);
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, paragraphs.join("\n\n"))?;

    info!(
        output = %output_path.display(),
        paragraphs = paragraphs.len(),
        "prose written"
    );

    Ok(ConversionReport {
        output_path: Some(output_path),
        paragraphs: paragraphs.len(),
    })
}
