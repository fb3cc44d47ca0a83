//! Package Rewriter Module
//!
//! DOCXパッケージから画像を取り除くコア処理。
//!
//! 1. 作業ディレクトリへ展開
//! 2. `word/media`を削除
//! 3. リレーションシップパートから画像への参照を削除し、削除したIDを参照元パートごとに集める
//! 4. コンテンツパートから`w:drawing`/`w:pict`を削除し、
//!    IDを失ったパートからはそのIDを参照する要素も削除
//! 5. 元のパスへDeflate圧縮で再圧縮
//! 6. 作業ディレクトリを破棄（成功・失敗にかかわらず）

mod archive;
mod content;
mod filter;
mod rels;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::api::DocumentKind;
use crate::error::DocSlimError;
use crate::security::SecurityConfig;
use crate::types::{bytes_to_mb, PartOutcome, PartReport, RewriteReport};

use self::filter::FilteredXml;

/// メディアディレクトリ（パッケージ内の相対パス）
pub(crate) const MEDIA_DIR: &str = "word/media";

/// ファイルサイズをMB単位で取得する
///
/// # 使用例
///
/// ```rust,no_run
/// # fn main() -> Result<(), docslim::DocSlimError> {
/// let size = docslim::size_of("report.docx")?;
/// println!("{:.2} MB", size);
/// # Ok(())
/// # }
/// ```
pub fn size_of(path: impl AsRef<Path>) -> Result<f64, DocSlimError> {
    Ok(bytes_to_mb(fs::metadata(path.as_ref())?.len()))
}

/// ファイルの種別を拡張子から判定する
pub fn document_kind(path: impl AsRef<Path>) -> DocumentKind {
    DocumentKind::from_path(path)
}

/// 書き換えに対応したパッケージ形式（`.docx`）かどうか
///
/// 旧形式の`.doc`は認識されますが`false`を返します。
pub fn is_supported(path: impl AsRef<Path>) -> bool {
    document_kind(path) == DocumentKind::Package
}

/// パッケージから画像を取り除き、元のパスへ書き戻す
///
/// サイズ閾値の判定やバックアップは行いません（[`crate::Shrinker`]の責務）。
/// エラーを返した場合、対象ファイルは書きかけの状態になっている可能性があります。
///
/// # 戻り値
///
/// * `Ok(RewriteReport)` - 書き換えに成功した場合
/// * `Err(DocSlimError::Archive)` - ZIPとして読み込めない場合
/// * `Err(DocSlimError::Io)` - ディスクフル、権限不足など
pub fn rewrite(path: impl AsRef<Path>) -> Result<RewriteReport, DocSlimError> {
    rewrite_with(path.as_ref(), &SecurityConfig::default())
}

pub(crate) fn rewrite_with(
    path: &Path,
    security: &SecurityConfig,
) -> Result<RewriteReport, DocSlimError> {
    let extracted = archive::extract_to_scratch(path, security)?;
    let root = extracted.root();
    let mut report = RewriteReport::default();

    let media_dir = root.join(MEDIA_DIR);
    if media_dir.is_dir() {
        report.media_removed = extracted
            .entries
            .iter()
            .filter(|name| is_media_entry(name))
            .count();
        fs::remove_dir_all(&media_dir)?;
        info!(files = report.media_removed, "removed media directory");
    }

    // 参照元パート名 → 削除したリレーションシップID
    let mut removed_ids: HashMap<String, HashSet<String>> = HashMap::new();
    for name in extracted.entries.iter().filter(|n| n.ends_with(".rels")) {
        let mut ids = Vec::new();
        let outcome = rewrite_part(root, name, |xml| {
            let (filtered, removed) = rels::strip_image_relationships(name, xml)?;
            ids = removed;
            Ok(filtered)
        })?;
        if let Some(source) = rels::source_part(name).filter(|_| !ids.is_empty()) {
            debug!(part = %source, ids = ids.len(), "relationships removed");
            removed_ids.entry(source).or_default().extend(ids);
        }
        report.parts.push(PartReport {
            part: name.clone(),
            outcome,
        });
    }

    let no_ids = HashSet::new();
    for name in &extracted.entries {
        let ids = match removed_ids.get(name) {
            Some(ids) => ids,
            None if content::is_content_part(name) => &no_ids,
            None => continue,
        };
        let outcome = rewrite_part(root, name, |xml| {
            content::strip_images_and_references(name, xml, ids)
        })?;
        report.parts.push(PartReport {
            part: name.clone(),
            outcome,
        });
    }

    report.entries_written = archive::repack(root, &extracted.entries, path)?;

    Ok(report)
}

fn is_media_entry(name: &str) -> bool {
    name.strip_prefix(MEDIA_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(|rest| !rest.is_empty() && !rest.ends_with('/'))
        .unwrap_or(false)
}

/// 1つのXMLパートを書き換える
///
/// XMLの解析エラーはこのパートだけの問題として`Skipped`に変換し、
/// I/Oエラーは呼び出し元へ返す。
fn rewrite_part<F>(root: &Path, name: &str, strip: F) -> Result<PartOutcome, DocSlimError>
where
    F: FnOnce(&[u8]) -> Result<FilteredXml, DocSlimError>,
{
    let path = root.join(name);
    let xml = fs::read(&path)?;

    match strip(&xml) {
        Ok(filtered) if filtered.removed == 0 => {
            if filtered.unresolved > 0 {
                warn!(part = %name, unresolved = filtered.unresolved, "image elements with unresolved namespace left in place");
                Ok(PartOutcome::Rewritten {
                    removed: 0,
                    unresolved: filtered.unresolved,
                })
            } else {
                Ok(PartOutcome::Unchanged)
            }
        }
        Ok(filtered) => {
            fs::write(&path, &filtered.xml)?;
            debug!(part = %name, removed = filtered.removed, "part rewritten");
            if filtered.unresolved > 0 {
                warn!(part = %name, unresolved = filtered.unresolved, "image elements with unresolved namespace left in place");
            }
            Ok(PartOutcome::Rewritten {
                removed: filtered.removed,
                unresolved: filtered.unresolved,
            })
        }
        Err(DocSlimError::XmlParse { part, message }) => {
            warn!(part = %part, error = %message, "malformed XML, part left unchanged");
            Ok(PartOutcome::Skipped { reason: message })
        }
        Err(other) => Err(other),
    }
}
