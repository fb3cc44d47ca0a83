//! Table Reader Module
//!
//! CSVファイルとExcelワークブックを読み込み、ヘッダー行とデータ行に分ける。
//! セル値はすべて正規化済みの文字列として扱う。

use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

use super::render::TableRow;
use crate::api::SheetSelector;
use crate::error::DocSlimError;

/// ヘッダー行とデータ行
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// ヘッダー行（列名）
    pub headers: Vec<String>,
    /// データ行
    pub rows: Vec<TableRow>,
}

/// 入力ファイルの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TableFormat {
    Csv,
    Excel,
}

impl TableFormat {
    /// 拡張子から判定する（大文字小文字を区別しない）
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xltx" | "xltm" => Some(TableFormat::Excel),
            "csv" => Some(TableFormat::Csv),
            _ => None,
        }
    }
}

/// エンコーディングラベルを解決する
///
/// `utf-8-sig`（BOM付きUTF-8）も受け付ける。BOMはどのラベルでも除去される。
pub(crate) fn resolve_encoding(label: &str) -> Result<&'static Encoding, DocSlimError> {
    let normalized = label.trim().to_ascii_lowercase();
    if matches!(normalized.as_str(), "utf-8-sig" | "utf8-sig") {
        return Ok(UTF_8);
    }

    Encoding::for_label(normalized.as_bytes())
        .ok_or_else(|| DocSlimError::Encoding(format!("Unknown encoding label: '{}'", label)))
}

/// CSVファイルを読み込む
///
/// 先頭レコードをヘッダー行として扱う。列数の異なる行も受け付ける。
pub(crate) fn read_csv(path: &Path, encoding: &'static Encoding) -> Result<Table, DocSlimError> {
    let bytes = fs::read(path)?;
    let (text, actual, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(DocSlimError::Encoding(format!(
            "'{}' is not valid {}",
            path.display(),
            actual.name()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let headers = match records.next() {
        Some(record) => record?.iter().map(normalize_text).collect(),
        None => {
            return Err(DocSlimError::EmptyTable(format!(
                "CSV file '{}' is empty",
                path.display()
            )))
        }
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        rows.push(TableRow::new(record.iter().map(normalize_text).collect()));
    }

    debug!(path = %path.display(), rows = rows.len(), "CSV loaded");
    Ok(Table { headers, rows })
}

/// Excelワークブックからシートを1つ読み込む
///
/// 使用範囲（最初に値のあるセルから最後に値のあるセルまで）の先頭行を
/// ヘッダー行として扱う。
pub(crate) fn read_excel(path: &Path, selector: &SheetSelector) -> Result<Table, DocSlimError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    let sheet_name = match selector {
        SheetSelector::First => sheet_names.first().cloned().ok_or_else(|| {
            DocSlimError::EmptyTable(format!("Workbook '{}' has no sheets", path.display()))
        })?,
        SheetSelector::Index(index) => sheet_names.get(*index).cloned().ok_or_else(|| {
            DocSlimError::Config(format!(
                "Sheet index {} is out of range (sheet count: {})",
                index,
                sheet_names.len()
            ))
        })?,
        SheetSelector::Name(name) => {
            if !sheet_names.contains(name) {
                return Err(DocSlimError::Config(format!("Sheet not found: {}", name)));
            }
            name.clone()
        }
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut range_rows = range.rows();

    let headers = match range_rows.next() {
        Some(row) => row.iter().map(normalize_cell).collect(),
        None => {
            return Err(DocSlimError::EmptyTable(format!(
                "Sheet '{}' is empty",
                sheet_name
            )))
        }
    };

    let rows: Vec<TableRow> = range_rows
        .map(|row| TableRow::new(row.iter().map(normalize_cell).collect()))
        .collect();

    debug!(path = %path.display(), sheet = %sheet_name, rows = rows.len(), "worksheet loaded");
    Ok(Table { headers, rows })
}

fn normalize_text(value: &str) -> String {
    value.trim().to_string()
}

/// セル値を文字列へ正規化する
///
/// - 空セル → 空文字列
/// - 整数値の浮動小数点数 → 小数点なしの整数表記
/// - その他の浮動小数点数 → 有効数字6桁（`%g`形式）
/// - 文字列 → 前後の空白を除去
/// - 論理値 → `True` / `False`
/// - 日時 → `YYYY-MM-DD HH:MM:SS`
pub(crate) fn normalize_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => normalize_float(*f),
        Data::String(s) => normalize_text(s),
        Data::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                normalize_float(dt.as_f64())
            } else {
                format_excel_datetime(dt.as_f64()).unwrap_or_else(|| normalize_float(dt.as_f64()))
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => normalize_text(s),
        Data::Error(e) => e.to_string(),
    }
}

fn normalize_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        if value == 0.0 {
            return "0".to_string();
        }
        return format!("{:.0}", value);
    }
    format_general(value)
}

/// `%.6g`相当の書式で数値を文字列化する
pub(crate) fn format_general(value: f64) -> String {
    const PRECISION: i32 = 6;

    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return (if value > 0.0 { "inf" } else { "-inf" }).to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // 丸めた後の指数で表記を決める（例: 999999.5 → 1e+06）
    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Excelのシリアル値（1900年システム）を日時文字列へ変換
fn format_excel_datetime(serial: f64) -> Option<String> {
    // 9999-12-31より後は日付として扱わない
    if !serial.is_finite() || !(0.0..=2_958_465.0).contains(&serial) {
        return None;
    }

    // 1900年うるう年バグ: シリアル値60（1900-02-29）より前は1日ずれる
    let epoch_day = if serial < 60.0 { 31 } else { 30 };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, epoch_day)?.and_hms_opt(0, 0, 0)?;

    let seconds = (serial * 86_400.0).round() as i64;
    let datetime = epoch.checked_add_signed(Duration::seconds(seconds))?;
    Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}
