//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use std::path::PathBuf;

use thiserror::Error;

/// docslimクレート全体で使用するエラー型
///
/// DOCXパッケージの展開・書き換え・再圧縮、および表データの読み込みと
/// テキスト変換の処理中に発生するすべてのエラーを統一的に扱います。
///
/// # エラーの種類
///
/// - `Io`: I/O操作中に発生したエラー（ディスクフル、権限不足、ファイルロックなど）
/// - `Archive`: ZIPアーカイブが壊れている、またはZIPではない
/// - `XmlParse`: コンテンツXML・リレーションシップXMLの解析エラー
/// - `Spreadsheet` / `Csv`: 表データの読み込みエラー
/// - `Config`: 設定の検証に失敗したエラー
///
/// # 使用例
///
/// ```rust,no_run
/// use docslim::DocSlimError;
/// use std::fs::File;
///
/// fn open_package(path: &str) -> Result<(), DocSlimError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     // ... 処理 ...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum DocSlimError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIPアーカイブの読み書きエラー
    ///
    /// 破損したアーカイブ、ZIP形式ではないファイルなどが原因となります。
    #[error("ZIP archive error: {0}")]
    Archive(String),

    /// XMLパートの解析エラー
    ///
    /// 書き換え処理の内部では、このエラーはパート単位で回復されます
    /// （該当パートは変更せずにスキップ）。
    #[error("Malformed XML in '{part}': {message}")]
    XmlParse {
        /// パッケージ内のパート名（例: `word/document.xml`）
        part: String,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// Excelファイルの解析中に発生したエラー
    ///
    /// `#[from]`属性により、`calamine::Error`から自動的に変換されます。
    #[error("Failed to parse spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// CSVファイルの解析中に発生したエラー
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// 表データにヘッダー行すら存在しない
    #[error("Table has no content: {0}")]
    EmptyTable(String),

    /// 文字コードの指定・デコードに関するエラー
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `ShrinkerBuilder::build()`や`ProseConverterBuilder::build()`時に
    /// 無効な設定が検出された場合に発生します。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use docslim::{DocSlimError, ShrinkerBuilder};
    ///
    /// let result = ShrinkerBuilder::new()
    ///     .with_size_threshold_mb(-1.0)  // 無効な閾値
    ///     .build();
    ///
    /// match result {
    ///     Err(DocSlimError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// サポートされていないファイル形式
    ///
    /// 旧形式の`.doc`ファイルは認識されますが、手動で`.docx`へ変換する
    /// 必要があるため、このエラーとして報告されます。
    #[error("Unsupported format '{}': {message}", path.display())]
    UnsupportedFormat {
        /// 対象ファイルのパス
        path: PathBuf,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃などのセキュリティ制限に
    /// 違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

impl DocSlimError {
    /// XMLパートの解析エラーを生成するヘルパー
    pub(crate) fn xml(part: &str, message: impl std::fmt::Display) -> Self {
        DocSlimError::XmlParse {
            part: part.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for DocSlimError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => DocSlimError::Io(e),
            other => DocSlimError::Archive(other.to_string()),
        }
    }
}
