//! Content Part Rewriter
//!
//! 本文・ヘッダー・フッター・脚注などのコンテンツパートから、
//! 画像を表す`w:drawing`要素と旧形式の`w:pict`要素を取り除く。
//! リレーションシップを削除したパートでは、そのIDを参照する要素も取り除く。

use std::collections::HashSet;

use super::filter::{classify, filter_elements, mark_references, Decision, FilteredXml, QualifiedName};
use crate::error::DocSlimError;

/// WordprocessingML（Transitional）の名前空間
pub(crate) const WORDPROCESSING_NS: &str =
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// WordprocessingML（Strict）の名前空間
pub(crate) const WORDPROCESSING_STRICT_NS: &str = "http://purl.oclc.org/ooxml/wordprocessingml/main";

/// 削除対象となる画像要素
pub(crate) const IMAGE_ELEMENTS: &[QualifiedName] = &[
    QualifiedName::new(WORDPROCESSING_NS, "drawing"),
    QualifiedName::new(WORDPROCESSING_NS, "pict"),
    QualifiedName::new(WORDPROCESSING_STRICT_NS, "drawing"),
    QualifiedName::new(WORDPROCESSING_STRICT_NS, "pict"),
];

/// リレーションシップ参照属性（`r:id`、`r:embed`など）の名前空間
pub(crate) const RELATIONSHIP_REFERENCE_NS: &[&str] = &[
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
    "http://purl.oclc.org/ooxml/officeDocument/relationships",
];

/// DrawingMLの名前空間（Transitional / Strict）
const DRAWINGML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const DRAWINGML_STRICT_NS: &str = "http://purl.oclc.org/ooxml/drawingml/main";

/// 削除したIDを参照する要素を含む場合に、まとめて取り除く要素
///
/// 埋め込みオブジェクトのプレビュー画像（`w:object`内の`v:imagedata`）、
/// 背景画像（`w:background`内の`v:fill`）、図の塗りつぶし（`a:blipFill`）を含む。
pub(crate) const REFERENCE_CONTAINERS: &[QualifiedName] = &[
    QualifiedName::new(WORDPROCESSING_NS, "drawing"),
    QualifiedName::new(WORDPROCESSING_NS, "pict"),
    QualifiedName::new(WORDPROCESSING_NS, "object"),
    QualifiedName::new(WORDPROCESSING_NS, "background"),
    QualifiedName::new(WORDPROCESSING_STRICT_NS, "drawing"),
    QualifiedName::new(WORDPROCESSING_STRICT_NS, "pict"),
    QualifiedName::new(WORDPROCESSING_STRICT_NS, "object"),
    QualifiedName::new(WORDPROCESSING_STRICT_NS, "background"),
    QualifiedName::new(DRAWINGML_NS, "blipFill"),
    QualifiedName::new(DRAWINGML_STRICT_NS, "blipFill"),
];

/// パッケージ内のパス名がコンテンツパートかどうかを判定
///
/// `word/`直下の`document.xml`、`header*.xml`、`footer*.xml`、
/// `footnotes.xml`、`endnotes.xml`が対象。
pub(crate) fn is_content_part(name: &str) -> bool {
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    if file.contains('/') {
        return false;
    }

    matches!(file, "document.xml" | "footnotes.xml" | "endnotes.xml")
        || ((file.starts_with("header") || file.starts_with("footer")) && file.ends_with(".xml"))
}

/// 指定した名前空間マップに一致する要素を取り除く
pub(crate) fn strip_elements(
    part: &str,
    xml: &[u8],
    targets: &[QualifiedName],
) -> Result<FilteredXml, DocSlimError> {
    filter_elements(part, xml, |_, resolved, start| {
        Ok(classify(resolved, start.local_name().as_ref(), targets))
    })
}

/// コンテンツパートから画像要素を取り除く
pub(crate) fn strip_images(part: &str, xml: &[u8]) -> Result<FilteredXml, DocSlimError> {
    strip_elements(part, xml, IMAGE_ELEMENTS)
}

/// 画像要素と、削除したリレーションシップIDを参照する要素を取り除く
///
/// `removed_ids`が空の場合は[`strip_images`]と同じ。
pub(crate) fn strip_images_and_references(
    part: &str,
    xml: &[u8],
    removed_ids: &HashSet<String>,
) -> Result<FilteredXml, DocSlimError> {
    if removed_ids.is_empty() {
        return strip_images(part, xml);
    }

    let marked = mark_references(
        part,
        xml,
        RELATIONSHIP_REFERENCE_NS,
        removed_ids,
        REFERENCE_CONTAINERS,
    )?;
    filter_elements(part, xml, |ordinal, resolved, start| {
        if marked.contains(&ordinal) {
            return Ok(Decision::Remove);
        }
        Ok(classify(resolved, start.local_name().as_ref(), IMAGE_ELEMENTS))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
        r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
        r#"xmlns:v="urn:schemas-microsoft-com:vml" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        r#"<w:body><w:p><w:r><w:t>Before</w:t></w:r>"#,
        r#"<w:r><w:drawing><wp:inline><wp:docPr id="1" name="Picture 1"/></wp:inline></w:drawing></w:r>"#,
        r#"<w:r><w:t xml:space="preserve">After </w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:pict><v:shape><v:imagedata r:id="rId5"/></v:shape></w:pict></w:r></w:p>"#,
        r#"</w:body></w:document>"#,
    );

    #[test]
    fn test_strip_drawing_and_pict() {
        let out = strip_images("word/document.xml", DOC.as_bytes()).unwrap();
        let xml = String::from_utf8(out.xml).unwrap();

        assert_eq!(out.removed, 2);
        assert!(!xml.contains("w:drawing"));
        assert!(!xml.contains("w:pict"));
        assert!(!xml.contains("rId5"));
        assert!(xml.contains("<w:t>Before</w:t>"));
        assert!(xml.contains(r#"<w:t xml:space="preserve">After </w:t>"#));
        assert!(xml.contains("<w:r></w:r>"));
    }

    #[test]
    fn test_text_order_preserved() {
        let out = strip_images("word/document.xml", DOC.as_bytes()).unwrap();
        let xml = String::from_utf8(out.xml).unwrap();

        let before = xml.find("Before").unwrap();
        let after = xml.find("After").unwrap();
        assert!(before < after);
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
    }

    #[test]
    fn test_strict_namespace() {
        let xml = r#"<w:document xmlns:w="http://purl.oclc.org/ooxml/wordprocessingml/main"><w:body><w:drawing/></w:body></w:document>"#;
        let out = strip_images("word/document.xml", xml.as_bytes()).unwrap();

        assert_eq!(out.removed, 1);
    }

    #[test]
    fn test_no_images_is_identity() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p/></w:body></w:document>"#;
        let out = strip_images("word/document.xml", xml.as_bytes()).unwrap();

        assert_eq!(out.removed, 0);
        assert_eq!(String::from_utf8(out.xml).unwrap(), xml);
    }

    #[test]
    fn test_is_content_part() {
        assert!(is_content_part("word/document.xml"));
        assert!(is_content_part("word/header1.xml"));
        assert!(is_content_part("word/footer2.xml"));
        assert!(is_content_part("word/footnotes.xml"));
        assert!(is_content_part("word/endnotes.xml"));

        assert!(!is_content_part("word/styles.xml"));
        assert!(!is_content_part("word/_rels/document.xml.rels"));
        assert!(!is_content_part("word/glossary/document.xml"));
        assert!(!is_content_part("docProps/core.xml"));
    }

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_object_preview_removed_with_reference() {
        let xml = concat!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
            r#"xmlns:v="urn:schemas-microsoft-com:vml" xmlns:o="urn:schemas-microsoft-com:office:office" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<w:body><w:p><w:r><w:object><v:shape><v:imagedata r:id="rId9"/></v:shape>"#,
            r#"<o:OLEObject r:id="rId10"/></w:object></w:r>"#,
            r#"<w:r><w:t>Keep</w:t></w:r></w:p></w:body></w:document>"#,
        );
        let out =
            strip_images_and_references("word/document.xml", xml.as_bytes(), &ids(&["rId9"])).unwrap();
        let text = String::from_utf8(out.xml).unwrap();

        assert_eq!(out.removed, 1);
        assert!(!text.contains("w:object"));
        assert!(!text.contains("rId9"));
        assert!(text.contains("<w:t>Keep</w:t>"));
    }

    #[test]
    fn test_background_and_bare_reference() {
        let xml = concat!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
            r#"xmlns:v="urn:schemas-microsoft-com:vml" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<w:background w:color="FFFFFF"><v:background><v:fill r:id="rId3" type="frame"/></v:background></w:background>"#,
            r#"<w:body><w:p><w:hyperlink r:id="rId4"><w:r><w:t>link</w:t></w:r></w:hyperlink></w:p>"#,
            r#"<w:p><w:customImage r:id="rId5"/></w:p></w:body></w:document>"#,
        );
        let out = strip_images_and_references(
            "word/document.xml",
            xml.as_bytes(),
            &ids(&["rId3", "rId5"]),
        )
        .unwrap();
        let text = String::from_utf8(out.xml).unwrap();

        assert_eq!(out.removed, 2);
        assert!(!text.contains("w:background"));
        assert!(!text.contains("rId5"));
        assert!(text.contains(r#"<w:hyperlink r:id="rId4">"#));
    }

    #[test]
    fn test_chart_picture_fill() {
        let xml = concat!(
            r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" "#,
            r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<c:spPr><a:blipFill><a:blip r:embed="rId1"/><a:stretch/></a:blipFill><a:ln/></c:spPr>"#,
            r#"</c:chartSpace>"#,
        );
        let out =
            strip_images_and_references("word/charts/chart1.xml", xml.as_bytes(), &ids(&["rId1"]))
                .unwrap();
        let text = String::from_utf8(out.xml).unwrap();

        assert_eq!(out.removed, 1);
        assert!(text.contains("<c:spPr><a:ln/></c:spPr>"));
    }

    #[test]
    fn test_no_removed_ids_matches_strip_images() {
        let with_refs = strip_images_and_references("word/document.xml", DOC.as_bytes(), &HashSet::new())
            .unwrap();
        let plain = strip_images("word/document.xml", DOC.as_bytes()).unwrap();

        assert_eq!(with_refs.xml, plain.xml);
        assert_eq!(with_refs.removed, plain.removed);
    }
}
