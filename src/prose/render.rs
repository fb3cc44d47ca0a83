//! Prose Renderer Module
//!
//! 表の各行を「列名：値」の並びからなる段落へ変換する。

/// 全角コロン（デフォルトの区切り文字）
pub const DEFAULT_SEPARATOR: &str = "：";

/// 箇条書きの接頭辞
const BULLET_PREFIX: &str = "- ";

/// 段落の書式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// 各行の先頭に`- `を付けるか
    pub bullets: bool,
    /// 列名と値の区切り文字
    pub separator: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            bullets: true,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

/// 表の1行（正規化済みのセル値）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub values: Vec<String>,
}

impl TableRow {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// 行を段落へ変換する
    ///
    /// 列名または値が空の列は出力しない。ヘッダーより長い行の余剰セル、
    /// ヘッダーより短い行の不足セルはどちらも無視される。
    ///
    /// # 使用例
    ///
    /// ```
    /// use docslim::{RenderOptions, TableRow};
    ///
    /// let headers = vec!["名前".to_string(), "年齢".to_string()];
    /// let row = TableRow::new(vec!["山田".to_string(), "42".to_string()]);
    ///
    /// let text = row.to_paragraph(&headers, &RenderOptions::default());
    /// assert_eq!(text, "- 名前：山田\n- 年齢：42");
    /// ```
    pub fn to_paragraph(&self, headers: &[String], options: &RenderOptions) -> String {
        let prefix = if options.bullets { BULLET_PREFIX } else { "" };

        headers
            .iter()
            .zip(&self.values)
            .filter_map(|(header, value)| {
                let header = header.trim();
                let value = value.trim();
                if header.is_empty() || value.is_empty() {
                    None
                } else {
                    Some(format!("{}{}{}{}", prefix, header, options.separator, value))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 空でない段落だけを集める
pub(crate) fn render_paragraphs(
    headers: &[String],
    rows: &[TableRow],
    options: &RenderOptions,
) -> Vec<String> {
    rows.iter()
        .map(|row| row.to_paragraph(headers, options))
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

/// 段落を空行で区切って連結する
pub(crate) fn render_rows(headers: &[String], rows: &[TableRow], options: &RenderOptions) -> String {
    render_paragraphs(headers, rows, options).join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(values: &[&str]) -> TableRow {
        TableRow::new(values.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_to_paragraph_with_bullets() {
        let paragraph = row(&["研发平台", "张三"])
            .to_paragraph(&headers(&["项目", "负责人"]), &RenderOptions::default());

        assert_eq!(paragraph, "- 项目：研发平台\n- 负责人：张三");
    }

    #[test]
    fn test_to_paragraph_without_bullets() {
        let options = RenderOptions {
            bullets: false,
            ..RenderOptions::default()
        };
        let paragraph = row(&["A", "B"]).to_paragraph(&headers(&["x", "y"]), &options);

        assert_eq!(paragraph, "x：A\ny：B");
    }

    #[test]
    fn test_to_paragraph_skips_empty_header_and_value() {
        let paragraph = row(&["1", "2", " ", "4"])
            .to_paragraph(&headers(&["a", "", "c", "d"]), &RenderOptions::default());

        assert_eq!(paragraph, "- a：1\n- d：4");
    }

    #[test]
    fn test_to_paragraph_ragged_rows() {
        let options = RenderOptions::default();
        let hdrs = headers(&["a", "b", "c"]);

        assert_eq!(row(&["1"]).to_paragraph(&hdrs, &options), "- a：1");
        assert_eq!(
            row(&["1", "2", "3", "4"]).to_paragraph(&hdrs, &options),
            "- a：1\n- b：2\n- c：3"
        );
    }

    #[test]
    fn test_custom_separator() {
        let options = RenderOptions {
            bullets: false,
            separator: ": ".to_string(),
        };

        assert_eq!(row(&["v"]).to_paragraph(&headers(&["k"]), &options), "k: v");
    }

    #[test]
    fn test_render_rows_drops_empty_paragraphs() {
        let hdrs = headers(&["a", "b"]);
        let rows = vec![row(&["1", "2"]), row(&["", ""]), row(&["3", ""])];

        let text = render_rows(&hdrs, &rows, &RenderOptions::default());
        assert_eq!(text, "- a：1\n- b：2\n\n- a：3");
    }

    #[test]
    fn test_render_rows_empty() {
        let text = render_rows(&headers(&["a"]), &[], &RenderOptions::default());
        assert!(text.is_empty());
    }
}
