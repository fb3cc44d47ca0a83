//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use std::path::Path;

/// ファイルの種別
///
/// 拡張子（大文字小文字を区別しない）から判定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentKind {
    /// ZIPベースのパッケージ形式（`.docx`）
    ///
    /// 画像削除の対象となる唯一の形式です。
    Package,

    /// 旧形式のバイナリ文書（`.doc`）
    ///
    /// 認識はしますが処理はしません。Wordで開いて`.docx`として保存し直す
    /// 必要があることを報告します。
    Legacy,

    /// 上記以外のファイル
    Other,
}

impl DocumentKind {
    /// パスの拡張子から種別を判定する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use docslim::DocumentKind;
    ///
    /// assert_eq!(DocumentKind::from_path("Report.DOCX"), DocumentKind::Package);
    /// assert_eq!(DocumentKind::from_path("old.doc"), DocumentKind::Legacy);
    /// assert_eq!(DocumentKind::from_path("notes.txt"), DocumentKind::Other);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("docx") => DocumentKind::Package,
            Some("doc") => DocumentKind::Legacy,
            _ => DocumentKind::Other,
        }
    }
}

/// バックアップの方針
///
/// 書き換え前に元ファイルを`<path>.backup`へコピーするかどうか、
/// 成功後にそのバックアップを残すかどうかを指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum BackupPolicy {
    /// バックアップを作成しない
    ///
    /// 書き換えに失敗した場合、元の状態へ復元する手段はありません。
    Disabled,

    /// バックアップを作成し、成功後も残す（デフォルト）
    #[default]
    Keep,

    /// バックアップを作成し、書き換えに成功したら削除する
    RemoveOnSuccess,
}

impl BackupPolicy {
    /// バックアップを作成するかどうか
    pub fn creates_backup(self) -> bool {
        !matches!(self, BackupPolicy::Disabled)
    }
}

/// 1ファイルの処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    /// 画像を削除して書き換えた
    Processed,

    /// サイズが閾値以下のため何もしなかった（エラーではない）
    Skipped,

    /// 処理に失敗した（バックアップがあれば復元済み）
    Failed,
}

/// シート選択方式
///
/// 表データをテキストへ変換する際に読み込むシートを指定します。
/// CSVファイルでは無視されます。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SheetSelector {
    /// 先頭のシート（デフォルト）
    #[default]
    First,

    /// インデックス指定（0始まり）
    Index(usize),

    /// シート名指定
    ///
    /// 例: `SheetSelector::Name("Sheet1".to_string())`
    Name(String),
}
