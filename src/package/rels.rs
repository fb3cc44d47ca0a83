//! Relationship Part Rewriter
//!
//! `*.rels`から、削除したメディアを指すリレーションシップを取り除く。
//! 削除したIDは、参照元のパートを書き換えるために呼び出し元へ返す。

use quick_xml::events::BytesStart;
use quick_xml::name::{Namespace, ResolveResult};

use super::filter::{attribute, filter_elements, Decision, FilteredXml};
use crate::error::DocSlimError;

/// パッケージリレーションシップの名前空間
pub(crate) const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

/// 画像として扱う拡張子（大文字小文字を区別しない）
pub(crate) const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// ターゲットがメディアディレクトリ配下、または画像ファイルかどうか
pub(crate) fn is_image_target(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    if lower.contains("media/") {
        return true;
    }

    lower
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// リレーションシップの種類が画像かどうか
fn is_image_type(rel_type: &str) -> bool {
    rel_type.ends_with("/image")
}

/// リレーションシップを削除すべきかどうか
///
/// 外部ターゲット（`TargetMode="External"`）は、種類が画像の場合のみ削除する。
/// `.png`で終わるURLへのハイパーリンクはIDを残す。
pub(crate) fn should_remove(target: &str, rel_type: &str, external: bool) -> bool {
    if external {
        return is_image_type(rel_type);
    }
    is_image_type(rel_type) || is_image_target(target)
}

fn decide(part: &str, resolved: &ResolveResult, start: &BytesStart) -> Result<Decision, DocSlimError> {
    let is_relationship = matches!(
        resolved,
        ResolveResult::Bound(Namespace(ns)) if *ns == RELATIONSHIPS_NS.as_bytes()
    ) && start.local_name().as_ref() == b"Relationship";

    if !is_relationship {
        return Ok(Decision::Keep);
    }

    let target = attribute(part, start, "Target")?.unwrap_or_default();
    let rel_type = attribute(part, start, "Type")?.unwrap_or_default();
    let external = attribute(part, start, "TargetMode")?
        .map(|mode| mode.eq_ignore_ascii_case("External"))
        .unwrap_or(false);

    if should_remove(&target, &rel_type, external) {
        Ok(Decision::Remove)
    } else {
        Ok(Decision::Keep)
    }
}

/// リレーションシップパートから画像への参照を取り除く
///
/// # 戻り値
///
/// 書き換え後のXMLと、削除したリレーションシップの`Id`の一覧
pub(crate) fn strip_image_relationships(
    part: &str,
    xml: &[u8],
) -> Result<(FilteredXml, Vec<String>), DocSlimError> {
    let mut removed_ids = Vec::new();
    let filtered = filter_elements(part, xml, |_, resolved, start| {
        let decision = decide(part, resolved, start)?;
        if decision == Decision::Remove {
            if let Some(id) = attribute(part, start, "Id")? {
                removed_ids.push(id);
            }
        }
        Ok(decision)
    })?;
    Ok((filtered, removed_ids))
}

/// リレーションシップパートの参照元パート名
///
/// `word/_rels/document.xml.rels` → `word/document.xml`。
/// パッケージ自体のリレーションシップ（`_rels/.rels`）には参照元パートがないため`None`。
pub(crate) fn source_part(rels_part: &str) -> Option<String> {
    let (dir, file) = rels_part.rsplit_once('/')?;
    let file = file.strip_suffix(".rels").filter(|f| !f.is_empty())?;
    let parent = if dir == "_rels" {
        ""
    } else {
        dir.strip_suffix("/_rels")?
    };

    if parent.is_empty() {
        Some(file.to_string())
    } else {
        Some(format!("{}/{}", parent, file))
    }
}
