//! 正文提取模块
//!
//! 把脊柱中的(X)HTML文档转换为纯文本，并尝试从标题类元素中识别章节名。

use std::borrow::Cow;

use once_cell::sync::Lazy;
use quick_xml::Writer;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// 章节标题的最大长度（字符数，不含）
const MAX_TITLE_CHARS: usize = 100;

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// 按优先级排列的章节标题选择器
static HEADING_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "h1",
        "h2",
        ".chapter-title",
        ".chapter-heading",
        "[class*=\"chapter\"]",
    ]
    .iter()
    .map(|selector| Selector::parse(selector).unwrap())
    .collect()
});

/// HTML中允许自闭合的空元素
const VOID_ELEMENTS: &[&[u8]] = &[
    b"area", b"base", b"br", b"col", b"embed", b"hr", b"img", b"input", b"link", b"meta",
    b"param", b"source", b"track", b"wbr",
];

/// 把XHTML中自闭合的非空元素展开为成对标签
///
/// HTML解析器把 `<title/>`、`<script src="..."/>` 之类当作开始标签，之后的
/// 内容会全部被吞进这个元素。不是格式良好的XML时原样返回。
fn expand_self_closing(markup: &str) -> Cow<'_, str> {
    match rewrite_self_closing(markup) {
        Some(expanded) => Cow::Owned(expanded),
        None => Cow::Borrowed(markup),
    }
}

fn rewrite_self_closing(markup: &str) -> Option<String> {
    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::with_capacity(markup.len()));
    let mut changed = false;

    loop {
        match reader.read_event().ok()? {
            Event::Empty(e) if !VOID_ELEMENTS.contains(&e.local_name().as_ref()) => {
                writer.write_event(Event::Start(e.borrow())).ok()?;
                writer.write_event(Event::End(e.to_end())).ok()?;
                changed = true;
            }
            Event::Eof => break,
            event => writer.write_event(event).ok()?,
        }
    }

    if !changed {
        return None;
    }
    String::from_utf8(writer.into_inner()).ok()
}

/// 提取文档的纯文本
///
/// 跳过script、style等非正文元素；块级元素之间以空行分隔，`br` 产生换行。
/// 无法解析或没有内容时返回空字符串。
pub fn extract_text(markup: &str) -> String {
    if markup.trim().is_empty() {
        return String::new();
    }

    let document = Html::parse_document(&expand_self_closing(markup));
    let mut result = String::new();

    match document.select(&BODY_SELECTOR).next() {
        Some(body) => process_element(body, &mut result),
        None => process_element(document.root_element(), &mut result),
    }

    result
}

/// 递归收集元素中的文本
fn process_element(element: ElementRef, result: &mut String) {
    let tag_name = element.value().name();

    // 跳过文档头部和脚本相关标签
    if matches!(
        tag_name,
        "head" | "script" | "style" | "noscript" | "template" | "title" | "meta" | "link"
    ) {
        return;
    }

    // 跳过媒体标签
    if matches!(
        tag_name,
        "img" | "svg" | "video" | "audio" | "canvas" | "embed" | "object" | "iframe" | "picture"
    ) {
        return;
    }

    for node in element.children() {
        match node.value() {
            Node::Text(text) => result.push_str(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(node) {
                    process_element(child_element, result);
                }
            }
            _ => {}
        }
    }

    match tag_name {
        "p" | "div" | "section" | "article" | "blockquote" | "h1" | "h2" | "h3" | "h4"
        | "h5" | "h6" | "li" | "ul" | "ol" | "table" | "tr" | "pre" | "figure" | "hr" => {
            result.push_str("\n\n");
        }
        "br" => result.push('\n'),
        "td" | "th" => result.push(' '),
        _ => {}
    }
}

/// 从文档中识别章节标题
///
/// 依次尝试 h1、h2 以及带chapter类名的元素，返回第一个长度在 1..100
/// 个字符之间的候选（空白已折叠）。
pub fn extract_chapter_title(markup: &str) -> Option<String> {
    if markup.trim().is_empty() {
        return None;
    }

    let document = Html::parse_document(&expand_self_closing(markup));

    HEADING_SELECTORS.iter().find_map(|selector| {
        document.select(selector).find_map(|candidate| {
            let text = crate::text::collapse_whitespace(&candidate.text().collect::<String>());
            let length = text.chars().count();
            (length > 0 && length < MAX_TITLE_CHARS).then_some(text)
        })
    })
}
