//! 书籍组装模块
//!
//! 驱动容器解析、目录解析与正文提取，得到整本书的规范化文本以及按词偏移
//! 定位的章节列表。

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::epub::archive::{Archive, ZipEpubArchive};
use crate::epub::container::{CONTAINER_PATH, resolve_opf_path};
use crate::epub::content::{extract_chapter_title, extract_text};
use crate::epub::opf::Package;
use crate::epub::toc::{resolve_toc, titles_by_href};
use crate::error::{InvalidArchiveReason, LectioError, Result};
use crate::text;

/// 章节：以在整本书词序列中的起始位置定位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,
    pub start_word_index: usize,
}

/// 组装完成的书籍
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    /// 书名
    pub title: String,
    /// 作者列表
    pub creators: Vec<String>,
    /// 语言
    pub language: Option<String>,
    /// 规范化后的全文，段落之间以空行分隔
    pub text: String,
    /// 章节列表；不足两个章节时为 `None`
    pub chapters: Option<Vec<Chapter>>,
    /// 全文词数
    pub word_count: usize,
}

impl Book {
    /// 从EPUB文件路径加载书籍
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Book> {
        let mut archive: ZipEpubArchive<File> = ZipEpubArchive::open(path)?;
        assemble(&mut archive)
    }

    /// 是否包含可读取的词
    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }
}

/// 读取归档中的条目，把“不存在”转换为指定的无效归档原因
fn read_required<A: Archive>(
    archive: &mut A,
    path: &str,
    reason: InvalidArchiveReason,
) -> Result<String> {
    match archive.read_entry_as_text(path) {
        Ok(content) => Ok(content),
        Err(LectioError::EntryNotFound(_)) => Err(LectioError::InvalidArchive(reason)),
        Err(err) => Err(err),
    }
}

/// 组装整本书
///
/// 只有容器描述缺失、OPF路径缺失或OPF文件缺失会导致失败；单个文件缺失、
/// 空白章节或没有目录都只会降级处理。
pub fn assemble<A: Archive>(archive: &mut A) -> Result<Book> {
    let container_xml =
        read_required(archive, CONTAINER_PATH, InvalidArchiveReason::MissingContainer)?;
    let opf_path = resolve_opf_path(&container_xml)?;
    let opf_content = read_required(archive, &opf_path, InvalidArchiveReason::MissingPackage)?;

    let package = Package::parse(&opf_content, &opf_path);
    let toc_titles = titles_by_href(&resolve_toc(archive, &package));

    let mut parts: Vec<String> = Vec::new();
    let mut chapters: Vec<Chapter> = Vec::new();
    let mut words_so_far = 0usize;

    for href in &package.spine {
        let markup = match archive.read_entry_as_text(href) {
            Ok(markup) => markup,
            Err(err) => {
                tracing::debug!(%href, %err, "skipping unreadable spine entry");
                continue;
            }
        };

        let section_text = extract_text(&markup);
        if section_text.trim().is_empty() {
            continue;
        }

        // 目录标题为空时按没有目录项处理
        let title = toc_titles
            .get(href)
            .filter(|title| !title.is_empty())
            .cloned()
            .or_else(|| extract_chapter_title(&markup));

        if let Some(title) = title {
            chapters.push(Chapter {
                title,
                start_word_index: words_so_far,
            });
        }

        words_so_far += text::word_count(&section_text);
        parts.push(section_text);
    }

    let full_text = text::normalize_text(&parts.join("\n\n"));
    let word_count = text::word_count(&full_text);
    debug_assert_eq!(word_count, words_so_far);

    tracing::info!(
        title = %package.title,
        words = word_count,
        chapters = chapters.len(),
        "assembled book"
    );

    Ok(Book {
        title: package.title,
        creators: package.creators,
        language: package.language,
        text: full_text,
        chapters: (chapters.len() > 1).then_some(chapters),
        word_count,
    })
}
