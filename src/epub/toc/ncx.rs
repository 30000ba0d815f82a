//! NCX（Navigation Control file for XML）解析器
//!
//! 把navMap中的导航点按文档顺序（深度优先）展开为目录条目。

use crate::epub::toc::{TocEntry, strip_fragment};
use crate::epub::xml::{attr_value, text_content};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// 解析过程中的导航点
#[derive(Debug, Default)]
struct PendingPoint {
    label: String,
    src: Option<String>,
}

/// 解析NCX文件内容
///
/// # 参数
/// * `xml_content` - NCX文件的XML内容
/// * `opf_dir` - OPF文件所在目录，拼接在src之前
///
/// # 返回值
/// * `Vec<TocEntry>` - 目录条目；既没有标签也没有src的导航点被跳过
pub fn parse_ncx(xml_content: &str, opf_dir: &str) -> Vec<TocEntry> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().trim_text(true);

    let mut points: Vec<PendingPoint> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut in_nav_map = false;
    let mut in_label = false;
    let mut in_label_text = false;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(%err, "malformed NCX, keeping partial navigation map");
                break;
            }
        };

        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"navMap" => in_nav_map = true,
                b"navPoint" if in_nav_map => {
                    stack.push(points.len());
                    points.push(PendingPoint::default());
                }
                b"navLabel" if !stack.is_empty() => in_label = true,
                b"text" if in_label => in_label_text = true,
                b"content" => set_src(e, &stack, &mut points),
                _ => {}
            },
            Event::Empty(ref e) => {
                if e.local_name().as_ref() == b"content" {
                    set_src(e, &stack, &mut points);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"navMap" => in_nav_map = false,
                b"navPoint" if in_nav_map => {
                    stack.pop();
                }
                b"navLabel" => in_label = false,
                b"text" => in_label_text = false,
                _ => {}
            },
            Event::Text(ref e) if in_label_text => {
                if let Some(&current) = stack.last() {
                    points[current].label.push_str(&text_content(e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    points
        .into_iter()
        .filter_map(|point| {
            let title = crate::text::collapse_whitespace(&point.label);
            let src = point.src.filter(|src| !src.is_empty());
            if title.is_empty() && src.is_none() {
                return None;
            }

            let href = format!("{}{}", opf_dir, strip_fragment(src.as_deref().unwrap_or("")));
            Some(TocEntry { title, href })
        })
        .collect()
}

/// 记录当前导航点的content src（只取第一个）
fn set_src(e: &quick_xml::events::BytesStart, stack: &[usize], points: &mut [PendingPoint]) {
    if let Some(&current) = stack.last() {
        let point = &mut points[current];
        if point.src.is_none() {
            point.src = attr_value(e, b"src");
        }
    }
}
