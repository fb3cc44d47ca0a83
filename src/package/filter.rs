//! XML Element Filter
//!
//! `quick_xml::NsReader`でイベントを読み、名前空間を解決したうえで
//! 削除対象の要素（サブツリーごと）を除いたイベントだけを`Writer`へ流す。
//! 対象外のノードはバイト列を変更せずに書き戻すため、順序も保たれる。
//!
//! 要素には文書順の通し番号（開始タグ・空要素タグの出現順）を振る。
//! 削除したリレーションシップIDを参照する要素は[`mark_references`]で
//! 事前に番号を集め、書き換え時にその番号の要素を取り除く。

use std::collections::HashSet;
use std::iter;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use quick_xml::writer::Writer;

use crate::error::DocSlimError;

/// 名前空間URIとローカル名の組
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QualifiedName {
    pub namespace: &'static str,
    pub local: &'static str,
}

impl QualifiedName {
    pub const fn new(namespace: &'static str, local: &'static str) -> Self {
        Self { namespace, local }
    }
}

/// 要素ごとの判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    /// そのまま書き戻す
    Keep,
    /// サブツリーごと削除する
    Remove,
    /// 名前空間を解決できないため残す（集計のみ）
    Unresolved,
}

/// フィルタ適用後のXML
#[derive(Debug)]
pub(crate) struct FilteredXml {
    pub xml: Vec<u8>,
    pub removed: usize,
    pub unresolved: usize,
}

/// 名前空間マップに基づいて要素を判定する
///
/// ローカル名が一致しても、接頭辞が未宣言（`Unknown`）または名前空間なし
/// （`Unbound`）の要素は`Unresolved`として残す。
pub(crate) fn classify(
    resolved: &ResolveResult,
    local_name: &[u8],
    targets: &[QualifiedName],
) -> Decision {
    let mut local_matches = targets.iter().filter(|t| t.local.as_bytes() == local_name);

    match resolved {
        ResolveResult::Bound(Namespace(ns)) => {
            if local_matches.any(|t| t.namespace.as_bytes() == *ns) {
                Decision::Remove
            } else {
                Decision::Keep
            }
        }
        ResolveResult::Unbound | ResolveResult::Unknown(_) => {
            if local_matches.next().is_some() {
                Decision::Unresolved
            } else {
                Decision::Keep
            }
        }
    }
}

/// XMLパートから要素を取り除く
///
/// # 引数
///
/// * `part` - パート名（エラーメッセージ用）
/// * `xml` - パートのバイト列
/// * `decide` - 開始タグ（空要素タグを含む）ごとに、要素の通し番号とともに呼ばれる判定関数
///
/// # 戻り値
///
/// * `Ok(FilteredXml)` - 書き換え後のXMLと集計
/// * `Err(DocSlimError::XmlParse)` - XMLが不正な場合
pub(crate) fn filter_elements<F>(
    part: &str,
    xml: &[u8],
    mut decide: F,
) -> Result<FilteredXml, DocSlimError>
where
    F: FnMut(usize, &ResolveResult, &BytesStart) -> Result<Decision, DocSlimError>,
{
    let mut reader = NsReader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    // 削除中のサブツリーの深さ（0なら削除中ではない）
    let mut skip_depth = 0usize;
    // 削除中の要素も含めて数える
    let mut ordinal = 0usize;
    let mut removed = 0usize;
    let mut unresolved = 0usize;

    loop {
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| DocSlimError::xml(part, e))?;

        if skip_depth > 0 {
            match event {
                Event::Start(_) => {
                    skip_depth += 1;
                    ordinal += 1;
                }
                Event::Empty(_) => ordinal += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => {
                    return Err(DocSlimError::xml(
                        part,
                        "unexpected end of document inside a removed element",
                    ))
                }
                _ => {}
            }
            continue;
        }

        let decision = match &event {
            Event::Eof => break,
            Event::Start(start) | Event::Empty(start) => {
                let current = ordinal;
                ordinal += 1;
                decide(current, &resolved, start)?
            }
            _ => Decision::Keep,
        };

        match decision {
            Decision::Remove => {
                removed += 1;
                if matches!(event, Event::Start(_)) {
                    skip_depth = 1;
                }
            }
            Decision::Unresolved => {
                unresolved += 1;
                writer
                    .write_event(event)
                    .map_err(|e| DocSlimError::xml(part, e))?;
            }
            Decision::Keep => {
                writer
                    .write_event(event)
                    .map_err(|e| DocSlimError::xml(part, e))?;
            }
        }
    }

    Ok(FilteredXml {
        xml: writer.into_inner(),
        removed,
        unresolved,
    })
}

/// 削除済みのIDを参照する要素の通し番号を集める
///
/// `namespaces`に属する属性（`r:id`、`r:embed`、`r:link`など）の値が
/// `ids`に含まれる要素を探す。祖先に`containers`の要素があれば、
/// 最も外側のものを削除対象とし、なければ参照している要素自身を対象とする。
///
/// # 戻り値
///
/// [`filter_elements`]の`decide`に渡される番号と同じ体系の通し番号の集合
pub(crate) fn mark_references(
    part: &str,
    xml: &[u8],
    namespaces: &[&str],
    ids: &HashSet<String>,
    containers: &[QualifiedName],
) -> Result<HashSet<usize>, DocSlimError> {
    let mut reader = NsReader::from_reader(xml);
    let mut marked = HashSet::new();
    // 開いている要素の（通し番号, コンテナかどうか）
    let mut open: Vec<(usize, bool)> = Vec::new();
    let mut ordinal = 0usize;

    loop {
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| DocSlimError::xml(part, e))?;

        let (start, is_container) = match &event {
            Event::Eof => break,
            Event::End(_) => {
                open.pop();
                continue;
            }
            Event::Start(start) | Event::Empty(start) => (
                start,
                classify(&resolved, start.local_name().as_ref(), containers) == Decision::Remove,
            ),
            _ => continue,
        };
        let current = ordinal;
        ordinal += 1;

        if references_any(&reader, part, start, namespaces, ids)? {
            let target = open
                .iter()
                .chain(iter::once(&(current, is_container)))
                .find(|(_, container)| *container)
                .map_or(current, |(index, _)| *index);
            marked.insert(target);
        }

        if matches!(event, Event::Start(_)) {
            open.push((current, is_container));
        }
    }

    Ok(marked)
}

/// 指定した名前空間の属性のいずれかが`ids`の値を持つかどうか
fn references_any(
    reader: &NsReader<&[u8]>,
    part: &str,
    start: &BytesStart,
    namespaces: &[&str],
    ids: &HashSet<String>,
) -> Result<bool, DocSlimError> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DocSlimError::xml(part, e))?;
        let (resolved, _) = reader.resolve_attribute(attr.key);
        let in_namespace = matches!(
            resolved,
            ResolveResult::Bound(Namespace(ns)) if namespaces.iter().any(|n| n.as_bytes() == ns)
        );
        if !in_namespace {
            continue;
        }

        let value = attr
            .unescape_value()
            .map_err(|e| DocSlimError::xml(part, e))?;
        if ids.contains(value.as_ref()) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// 属性値をアンエスケープして取得する
pub(crate) fn attribute(
    part: &str,
    start: &BytesStart,
    name: &str,
) -> Result<Option<String>, DocSlimError> {
    match start
        .try_get_attribute(name)
        .map_err(|e| DocSlimError::xml(part, e))?
    {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|e| DocSlimError::xml(part, e))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "urn:test";
    const TARGETS: &[QualifiedName] = &[QualifiedName::new(NS, "img")];

    fn strip(xml: &str) -> Result<FilteredXml, DocSlimError> {
        filter_elements("test.xml", xml.as_bytes(), |_, resolved, start| {
            Ok(classify(resolved, start.local_name().as_ref(), TARGETS))
        })
    }

    #[test]
    fn test_removes_nested_subtree() {
        let xml = r#"<t:root xmlns:t="urn:test"><t:p>a</t:p><t:img><t:img/><t:x>b</t:x></t:img><t:p>c</t:p></t:root>"#;
        let out = strip(xml).unwrap();

        assert_eq!(
            String::from_utf8(out.xml).unwrap(),
            r#"<t:root xmlns:t="urn:test"><t:p>a</t:p><t:p>c</t:p></t:root>"#
        );
        assert_eq!(out.removed, 1);
    }

    #[test]
    fn test_removes_empty_element() {
        let xml = r#"<root xmlns="urn:test"><img/><keep/></root>"#;
        let out = strip(xml).unwrap();

        assert_eq!(
            String::from_utf8(out.xml).unwrap(),
            r#"<root xmlns="urn:test"><keep/></root>"#
        );
        assert_eq!(out.removed, 1);
    }

    #[test]
    fn test_other_namespace_is_kept() {
        let xml = r#"<root xmlns:o="urn:other"><o:img/></root>"#;
        let out = strip(xml).unwrap();

        assert_eq!(String::from_utf8(out.xml).unwrap(), xml);
        assert_eq!(out.removed, 0);
        assert_eq!(out.unresolved, 0);
    }

    #[test]
    fn test_unknown_prefix_is_unresolved() {
        let xml = r#"<root><q:img/></root>"#;
        let out = strip(xml).unwrap();

        assert_eq!(String::from_utf8(out.xml).unwrap(), xml);
        assert_eq!(out.removed, 0);
        assert_eq!(out.unresolved, 1);
    }

    #[test]
    fn test_declaration_and_text_preserved() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n<t:r xmlns:t=\"urn:test\"> a &amp; b <!-- c --></t:r>";
        let out = strip(xml).unwrap();

        assert_eq!(String::from_utf8(out.xml).unwrap(), xml);
    }

    #[test]
    fn test_mismatched_tags_are_an_error() {
        let result = strip(r#"<root xmlns="urn:test"><a></b></root>"#);
        assert!(matches!(result, Err(DocSlimError::XmlParse { .. })));
    }

    #[test]
    fn test_truncated_inside_removed_element() {
        let result = strip(r#"<root xmlns="urn:test"><img><x>"#);
        assert!(matches!(result, Err(DocSlimError::XmlParse { .. })));
    }

    #[test]
    fn test_attribute_unescaped() {
        let xml = r#"<r Target="a&amp;b.png"/>"#;
        let mut seen = None;
        filter_elements("t", xml.as_bytes(), |_, _, start| {
            seen = attribute("t", start, "Target")?;
            Ok(Decision::Keep)
        })
        .unwrap();

        assert_eq!(seen.as_deref(), Some("a&b.png"));
    }

    const REF_NS: &[&str] = &["urn:ref"];
    const CONTAINERS: &[QualifiedName] = &[QualifiedName::new(NS, "box")];

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ordinals_count_skipped_elements() {
        let xml = r#"<t:root xmlns:t="urn:test"><t:img><t:a/><t:b/></t:img><t:c/></t:root>"#;
        let mut seen = Vec::new();
        filter_elements("test.xml", xml.as_bytes(), |ordinal, resolved, start| {
            seen.push((ordinal, String::from_utf8_lossy(start.local_name().as_ref()).into_owned()));
            Ok(classify(resolved, start.local_name().as_ref(), TARGETS))
        })
        .unwrap();

        // t:a / t:bは削除中のため呼ばれないが番号は消費される
        assert_eq!(
            seen,
            vec![(0, "root".to_string()), (1, "img".to_string()), (4, "c".to_string())]
        );
    }

    #[test]
    fn test_mark_references_prefers_outermost_container() {
        let xml = concat!(
            r#"<t:root xmlns:t="urn:test" xmlns:r="urn:ref">"#,
            r#"<t:box><t:box><t:pic r:id="rId1"/></t:box></t:box>"#,
            r#"<t:pic r:id="rId2"/>"#,
            r#"<t:pic r:id="rId3"/>"#,
            r#"<t:pic id="rId1"/>"#,
            r#"</t:root>"#,
        );
        let marked =
            mark_references("test.xml", xml.as_bytes(), REF_NS, &ids(&["rId1", "rId2"]), CONTAINERS)
                .unwrap();

        // 1: 外側のt:box、4: コンテナのないt:pic。名前空間のないid属性は対象外
        assert_eq!(marked, HashSet::from([1usize, 4]));
    }

    #[test]
    fn test_mark_references_then_filter() {
        let xml = r#"<t:root xmlns:t="urn:test" xmlns:r="urn:ref"><t:p>a</t:p><t:box><t:pic r:embed="rId7"/></t:box><t:p>b</t:p></t:root>"#;
        let marked =
            mark_references("test.xml", xml.as_bytes(), REF_NS, &ids(&["rId7"]), CONTAINERS).unwrap();
        let out = filter_elements("test.xml", xml.as_bytes(), |ordinal, _, _| {
            Ok(if marked.contains(&ordinal) {
                Decision::Remove
            } else {
                Decision::Keep
            })
        })
        .unwrap();

        assert_eq!(
            String::from_utf8(out.xml).unwrap(),
            r#"<t:root xmlns:t="urn:test" xmlns:r="urn:ref"><t:p>a</t:p><t:p>b</t:p></t:root>"#
        );
        assert_eq!(out.removed, 1);
    }
}
