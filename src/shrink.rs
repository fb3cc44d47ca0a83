//! Shrink Module
//!
//! パッケージ書き換えの呼び出し側の方針を実装するモジュール。
//! サイズ閾値による判定、バックアップと復元、ディレクトリ一括処理を扱う。

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::api::{BackupPolicy, DocumentKind, FileOutcome};
use crate::builder::ShrinkConfig;
use crate::error::DocSlimError;
use crate::package::{rewrite_with, size_of};
use crate::types::{BatchSummary, FileReport, RewriteReport};

/// バックアップファイルの拡張子
const BACKUP_SUFFIX: &str = ".backup";

/// 対象ファイルに対応するバックアップのパス（`<path>.backup`）
///
/// # 使用例
///
/// ```rust
/// use std::path::Path;
/// use docslim::backup_path_for;
///
/// assert_eq!(backup_path_for(Path::new("a/b.docx")), Path::new("a/b.docx.backup"));
/// ```
pub fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

fn report(path: &Path, outcome: FileOutcome, original: f64, new: f64) -> FileReport {
    FileReport {
        path: path.to_path_buf(),
        outcome,
        original_size_mb: original,
        new_size_mb: new,
        backup_path: None,
        error: None,
    }
}

fn failed(path: &Path, original: f64, err: &DocSlimError) -> FileReport {
    FileReport {
        error: Some(err.to_string()),
        ..report(path, FileOutcome::Failed, original, original)
    }
}

/// 画像を削除して書き換え、処理後のサイズを測る
fn shrink_in_place(
    path: &Path,
    config: &ShrinkConfig,
) -> Result<(RewriteReport, f64), DocSlimError> {
    let rewrite = rewrite_with(path, &config.security)?;
    let new_size = size_of(path)?;
    Ok((rewrite, new_size))
}

/// 1ファイルを処理する
///
/// エラーはすべて`FileOutcome::Failed`として返し、呼び出し元へは伝播しない。
pub(crate) fn process_file(path: &Path, config: &ShrinkConfig) -> FileReport {
    info!(path = %path.display(), "processing file");

    let original = match size_of(path) {
        Ok(size) => size,
        Err(err) => {
            error!(path = %path.display(), error = %err, "cannot read file size");
            return failed(path, 0.0, &err);
        }
    };

    match DocumentKind::from_path(path) {
        DocumentKind::Package => {}
        DocumentKind::Legacy => {
            let err = DocSlimError::UnsupportedFormat {
                path: path.to_path_buf(),
                message: "legacy .doc files must be converted to .docx manually (open in Word and save as .docx)"
                    .to_string(),
            };
            warn!(path = %path.display(), "legacy .doc requires manual conversion");
            return failed(path, original, &err);
        }
        DocumentKind::Other => {
            let err = DocSlimError::UnsupportedFormat {
                path: path.to_path_buf(),
                message: "not a .docx document".to_string(),
            };
            warn!(path = %path.display(), "unsupported file type");
            return failed(path, original, &err);
        }
    }

    if original <= config.size_threshold_mb {
        info!(
            size_mb = original,
            threshold_mb = config.size_threshold_mb,
            "within size threshold, skipping"
        );
        return report(path, FileOutcome::Skipped, original, original);
    }

    let backup = if config.backup_policy.creates_backup() {
        let backup = backup_path_for(path);
        if let Err(err) = fs::copy(path, &backup) {
            let err = DocSlimError::from(err);
            error!(path = %path.display(), error = %err, "failed to create backup");
            return failed(path, original, &err);
        }
        info!(backup = %backup.display(), "backup created");
        Some(backup)
    } else {
        None
    };

    match shrink_in_place(path, config) {
        Ok((rewrite, new_size)) => {
            let saved = original - new_size;
            info!(
                size_mb = new_size,
                saved_mb = saved,
                percent = saved / original * 100.0,
                media = rewrite.media_removed,
                drawings = rewrite.drawings_removed(),
                "images removed"
            );
            for part in rewrite.skipped_parts() {
                warn!(part = %part.part, "part was left unchanged");
            }
            if new_size > config.size_threshold_mb {
                warn!(
                    size_mb = new_size,
                    threshold_mb = config.size_threshold_mb,
                    "file still exceeds size threshold"
                );
            }

            let backup_path = match (backup, config.backup_policy) {
                (Some(backup), BackupPolicy::RemoveOnSuccess) => match fs::remove_file(&backup) {
                    Ok(()) => {
                        info!(backup = %backup.display(), "backup removed");
                        None
                    }
                    Err(err) => {
                        warn!(backup = %backup.display(), error = %err, "failed to remove backup");
                        Some(backup)
                    }
                },
                (backup, _) => backup,
            };

            FileReport {
                backup_path,
                ..report(path, FileOutcome::Processed, original, new_size)
            }
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to remove images");

            let mut result = failed(path, original, &err);
            match backup {
                Some(backup) => match fs::rename(&backup, path) {
                    Ok(()) => info!(path = %path.display(), "original restored from backup"),
                    Err(restore_err) => {
                        error!(
                            backup = %backup.display(),
                            error = %restore_err,
                            "failed to restore original from backup"
                        );
                        result.backup_path = Some(backup);
                    }
                },
                None => warn!(path = %path.display(), "no backup was made; file may be damaged"),
            }
            result
        }
    }
}

/// ディレクトリ配下の文書を列挙する
///
/// # 戻り値
///
/// `(.docxファイル, .docファイル)`。それぞれファイル名順。
/// Officeのロックファイル（`~$`で始まるもの）は除外する。
pub(crate) fn collect_documents(dir: &Path) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut packages = Vec::new();
    let mut legacy = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with("~$") {
            continue;
        }

        match DocumentKind::from_path(entry.path()) {
            DocumentKind::Package => packages.push(entry.into_path()),
            DocumentKind::Legacy => legacy.push(entry.into_path()),
            DocumentKind::Other => {}
        }
    }

    (packages, legacy)
}

/// ディレクトリ配下の`.docx`を1つずつ処理する
///
/// 1ファイルの失敗は他のファイルの処理を止めない。
pub(crate) fn process_directory(
    dir: &Path,
    config: &ShrinkConfig,
) -> Result<BatchSummary, DocSlimError> {
    if !dir.is_dir() {
        return Err(DocSlimError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("directory not found: {}", dir.display()),
        )));
    }

    let (packages, legacy) = collect_documents(dir);
    info!(dir = %dir.display(), documents = packages.len(), legacy = legacy.len(), "scanning directory");

    let mut summary = BatchSummary::default();
    for path in &legacy {
        warn!(path = %path.display(), "legacy .doc requires manual conversion, not processed");
        summary.legacy += 1;
    }

    for path in &packages {
        summary.record(process_file(path, config));
    }

    info!(
        total = summary.total_files,
        processed = summary.processed,
        skipped = summary.skipped,
        errored = summary.errored,
        saved_mb = summary.saved_mb(),
        "batch finished"
    );

    Ok(summary)
}
