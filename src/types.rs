//! Types Module
//!
//! クレート全体で使用する共通データ型（処理結果レポート）を定義するモジュール。

use std::path::PathBuf;

use serde::Serialize;

use crate::api::FileOutcome;

/// バイト数をMB（1024 * 1024バイト単位）に変換
pub(crate) fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// XMLパート単位の書き換え結果
///
/// パート単位のベストエフォート処理のため、1つのパートの失敗が
/// ファイル全体の失敗にはなりません。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PartOutcome {
    /// 書き換えた
    Rewritten {
        /// 削除した要素（またはリレーションシップ）の数
        removed: usize,
        /// 名前空間を解決できず残した要素の数
        unresolved: usize,
    },

    /// 削除対象が見つからず、変更しなかった
    Unchanged,

    /// XMLが不正なため変更せずにスキップした
    Skipped {
        /// スキップの理由
        reason: String,
    },
}

/// パート名と書き換え結果の組
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartReport {
    /// パッケージ内のパート名（例: `word/document.xml`）
    pub part: String,
    /// 書き換え結果
    pub outcome: PartOutcome,
}

/// パッケージ書き換えの結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    /// 削除したメディアエントリの数
    pub media_removed: usize,
    /// 再圧縮したエントリの数
    pub entries_written: usize,
    /// コンテンツパート・リレーションシップパートごとの結果
    pub parts: Vec<PartReport>,
}

impl RewriteReport {
    /// コンテンツから削除した図形要素の合計
    pub fn drawings_removed(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| !p.part.ends_with(".rels"))
            .map(|p| match p.outcome {
                PartOutcome::Rewritten { removed, .. } => removed,
                _ => 0,
            })
            .sum()
    }

    /// スキップされたパートの一覧
    pub fn skipped_parts(&self) -> impl Iterator<Item = &PartReport> {
        self.parts
            .iter()
            .filter(|p| matches!(p.outcome, PartOutcome::Skipped { .. }))
    }
}

/// 1ファイルの処理結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    /// 対象ファイルのパス
    pub path: PathBuf,
    /// 処理結果
    pub outcome: FileOutcome,
    /// 処理前のサイズ（MB）
    pub original_size_mb: f64,
    /// 処理後のサイズ（MB）。スキップ・失敗時は処理前と同じ
    pub new_size_mb: f64,
    /// 作成したバックアップのパス（残っている場合のみ）
    pub backup_path: Option<PathBuf>,
    /// 失敗時のエラーメッセージ
    pub error: Option<String>,
}

impl FileReport {
    /// 処理に成功したかどうか（スキップも成功として扱う）
    pub fn is_success(&self) -> bool {
        self.outcome != FileOutcome::Failed
    }

    /// 削減できたサイズ（MB）
    pub fn saved_mb(&self) -> f64 {
        self.original_size_mb - self.new_size_mb
    }
}

/// ディレクトリ一括処理の集計結果
///
/// 処理中の状態はこの構造体にのみ蓄積され、呼び出し元へ返されます。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// 対象となった`.docx`ファイルの数
    pub total_files: usize,
    /// 書き換えたファイルの数
    pub processed: usize,
    /// 閾値以下のためスキップしたファイルの数
    pub skipped: usize,
    /// 失敗したファイルの数
    pub errored: usize,
    /// 手動変換が必要な旧形式（`.doc`）ファイルの数
    pub legacy: usize,
    /// 処理前サイズの合計（MB）
    pub total_original_mb: f64,
    /// 処理後サイズの合計（MB）
    pub total_new_mb: f64,
    /// ファイルごとの結果（処理順）
    pub files: Vec<FileReport>,
}

impl BatchSummary {
    /// 1ファイルの結果を集計に加える
    pub fn record(&mut self, report: FileReport) {
        self.total_files += 1;
        match report.outcome {
            FileOutcome::Processed => self.processed += 1,
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Failed => self.errored += 1,
        }
        self.total_original_mb += report.original_size_mb;
        self.total_new_mb += report.new_size_mb;
        self.files.push(report);
    }

    /// 削減できたサイズの合計（MB）
    pub fn saved_mb(&self) -> f64 {
        self.total_original_mb - self.total_new_mb
    }

    /// 削減率（%）。対象が空の場合は`None`
    pub fn reduction_percent(&self) -> Option<f64> {
        if self.total_original_mb > 0.0 {
            Some(self.saved_mb() / self.total_original_mb * 100.0)
        } else {
            None
        }
    }
}

/// 表データ変換の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// 出力したファイルのパス。段落が1つもない場合は出力しない
    pub output_path: Option<PathBuf>,
    /// 出力した段落の数
    pub paragraphs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: FileOutcome, original: f64, new: f64) -> FileReport {
        FileReport {
            path: PathBuf::from("a.docx"),
            outcome,
            original_size_mb: original,
            new_size_mb: new,
            backup_path: None,
            error: None,
        }
    }

    #[test]
    fn test_bytes_to_mb() {
        assert_eq!(bytes_to_mb(0), 0.0);
        assert_eq!(bytes_to_mb(1024 * 1024), 1.0);
        assert_eq!(bytes_to_mb(15 * 1024 * 1024), 15.0);
    }

    #[test]
    fn test_batch_summary_record() {
        let mut summary = BatchSummary::default();
        summary.record(report(FileOutcome::Processed, 20.0, 2.0));
        summary.record(report(FileOutcome::Skipped, 1.0, 1.0));
        summary.record(report(FileOutcome::Failed, 30.0, 30.0));

        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.total_original_mb, 51.0);
        assert_eq!(summary.total_new_mb, 33.0);
        assert_eq!(summary.saved_mb(), 18.0);
        assert_eq!(summary.files.len(), 3);
        assert_eq!(summary.files[2].outcome, FileOutcome::Failed);
    }

    #[test]
    fn test_reduction_percent() {
        let mut summary = BatchSummary::default();
        assert_eq!(summary.reduction_percent(), None);

        summary.record(report(FileOutcome::Processed, 20.0, 5.0));
        assert_eq!(summary.reduction_percent(), Some(75.0));
    }

    #[test]
    fn test_file_report_success() {
        assert!(report(FileOutcome::Skipped, 1.0, 1.0).is_success());
        assert!(report(FileOutcome::Processed, 20.0, 1.0).is_success());
        assert!(!report(FileOutcome::Failed, 20.0, 20.0).is_success());
    }

    #[test]
    fn test_drawings_removed_ignores_rels() {
        let report = RewriteReport {
            media_removed: 2,
            entries_written: 5,
            parts: vec![
                PartReport {
                    part: "word/document.xml".to_string(),
                    outcome: PartOutcome::Rewritten {
                        removed: 3,
                        unresolved: 0,
                    },
                },
                PartReport {
                    part: "word/_rels/document.xml.rels".to_string(),
                    outcome: PartOutcome::Rewritten {
                        removed: 2,
                        unresolved: 0,
                    },
                },
                PartReport {
                    part: "word/header1.xml".to_string(),
                    outcome: PartOutcome::Skipped {
                        reason: "bad xml".to_string(),
                    },
                },
            ],
        };

        assert_eq!(report.drawings_removed(), 3);
        assert_eq!(report.skipped_parts().count(), 1);
    }
}
