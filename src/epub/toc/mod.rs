//! 目录解析模块
//!
//! 依次尝试NCX导航文件与EPUB3导航文档，第一个得到非空结果的策略生效。

mod nav;
mod ncx;

pub use nav::parse_nav_document;
pub use ncx::parse_ncx;

use std::collections::HashMap;

use crate::epub::archive::Archive;
use crate::epub::opf::{ManifestItem, Package, opf_directory};

/// 目录条目：按文件路径定位的章节标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// 章节标题（可能为空）
    pub title: String,
    /// 已解析、去掉片段的文件路径
    pub href: String,
}

/// 去掉链接中的 `#片段`
pub(crate) fn strip_fragment(href: &str) -> &str {
    href.split('#').next().unwrap_or("")
}

/// 解析整本书的目录
///
/// 读取失败的文件被跳过；两种策略都没有结果时返回空列表。
pub fn resolve_toc<A: Archive>(archive: &mut A, package: &Package) -> Vec<TocEntry> {
    let from_ncx = ncx_entries(archive, package);
    if !from_ncx.is_empty() {
        tracing::debug!(entries = from_ncx.len(), "table of contents from NCX");
        return from_ncx;
    }

    let from_nav = nav_entries(archive, package);
    if !from_nav.is_empty() {
        tracing::debug!(entries = from_nav.len(), "table of contents from navigation document");
    } else {
        tracing::debug!("no table of contents, relying on heading detection");
    }
    from_nav
}

fn ncx_entries<A: Archive>(archive: &mut A, package: &Package) -> Vec<TocEntry> {
    let Some(item) = package.ncx_item() else {
        return Vec::new();
    };

    match archive.read_entry_as_text(&item.href) {
        Ok(content) => parse_ncx(&content, &package.opf_dir),
        Err(err) => {
            tracing::debug!(href = %item.href, %err, "NCX not readable");
            Vec::new()
        }
    }
}

fn nav_entries<A: Archive>(archive: &mut A, package: &Package) -> Vec<TocEntry> {
    let is_candidate = |item: &&ManifestItem| item.href.contains("nav") || item.is_markup();

    let mut candidates: Vec<&ManifestItem> = package
        .manifest
        .iter()
        .filter(|item| item.is_nav())
        .collect();
    candidates.extend(
        package
            .manifest
            .iter()
            .filter(|item| !item.is_nav())
            .filter(is_candidate),
    );

    for item in candidates {
        let Ok(markup) = archive.read_entry_as_text(&item.href) else {
            continue;
        };

        let entries = parse_nav_document(&markup, opf_directory(&item.href));
        if !entries.is_empty() {
            return entries;
        }
    }

    Vec::new()
}

/// 把目录条目转换为 路径 → 标题 的映射；同一路径以第一个条目为准
pub fn titles_by_href(entries: &[TocEntry]) -> HashMap<String, String> {
    let mut titles = HashMap::new();
    for entry in entries {
        titles
            .entry(entry.href.clone())
            .or_insert_with(|| entry.title.clone());
    }
    titles
}
