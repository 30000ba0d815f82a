//! EPUB3导航文档解析
//!
//! 在导航文档中找到目录 `nav` 元素，把其中的超链接转换为目录条目。

use crate::epub::toc::{TocEntry, strip_fragment};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static NAV_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("nav").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// 判断 `nav` 元素是否带有目录标记（`epub:type="toc"` 或 `role="doc-toc"`）
fn is_toc_landmark(nav: &ElementRef) -> bool {
    nav.value().attrs().any(|(name, value)| {
        let is_type = name == "epub:type" || name.ends_with(":type");
        (is_type && value.split_whitespace().any(|token| token == "toc"))
            || (name == "role" && value.split_whitespace().any(|token| token == "doc-toc"))
    })
}

/// 解析导航文档
///
/// 优先使用带目录标记的 `nav`，没有时退回第一个 `nav` 元素。
/// 链接目标去掉片段后按导航文档所在目录解析。
///
/// # 参数
/// * `markup` - 导航文档内容
/// * `base_dir` - 导航文档所在目录(带结尾的 `/`)
pub fn parse_nav_document(markup: &str, base_dir: &str) -> Vec<TocEntry> {
    let document = Html::parse_document(markup);

    let nav = document
        .select(&NAV_SELECTOR)
        .find(is_toc_landmark)
        .or_else(|| document.select(&NAV_SELECTOR).next());

    let Some(nav) = nav else {
        return Vec::new();
    };

    nav.select(&LINK_SELECTOR)
        .filter_map(|link| {
            let target = strip_fragment(link.value().attr("href")?);
            if target.is_empty() {
                return None;
            }

            Some(TocEntry {
                title: crate::text::collapse_whitespace(&link.text().collect::<String>()),
                href: format!("{}{}", base_dir, target),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_toc_landmark() {
        let markup = r##"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<body>
  <nav epub:type="landmarks"><ol><li><a href="cover.xhtml">Cover</a></li></ol></nav>
  <nav epub:type="toc" id="toc">
    <ol>
      <li><a href="text/ch1.xhtml#top">Chapter
          One</a></li>
      <li><a href="text/ch2.xhtml">Chapter Two</a></li>
      <li><a href="#local">Local only</a></li>
    </ol>
  </nav>
</body></html>"##;

        let entries = parse_nav_document(markup, "OEBPS/");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Chapter One");
        assert_eq!(entries[0].href, "OEBPS/text/ch1.xhtml");
        assert_eq!(entries[1].href, "OEBPS/text/ch2.xhtml");
    }

    #[test]
    fn test_role_doc_toc() {
        let markup = r#"<html><body>
<nav><a href="other.xhtml">Other</a></nav>
<nav role="doc-toc"><a href="ch1.xhtml">One</a></nav>
</body></html>"#;

        let entries = parse_nav_document(markup, "");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "One");
    }

    #[test]
    fn test_falls_back_to_first_nav() {
        let markup = r#"<html><body><nav><a href="ch1.xhtml">One</a></nav></body></html>"#;
        let entries = parse_nav_document(markup, "");
        assert_eq!(entries[0].href, "ch1.xhtml");
    }

    #[test]
    fn test_document_without_nav() {
        let markup = r#"<html><body><p><a href="ch1.xhtml">One</a></p></body></html>"#;
        assert!(parse_nav_document(markup, "").is_empty());
    }
}
