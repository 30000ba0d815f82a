//! 归档读取模块
//!
//! 导入流程只依赖 [`Archive`] 这一最小接口：列出条目、按路径读取文本。

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

use crate::error::{LectioError, Result};

/// EPUB的mimetype文件内容
const EPUB_MIMETYPE: &str = "application/epub+zip";

/// 归档读取能力
pub trait Archive {
    /// 列出归档中的所有条目
    fn list_entries(&self) -> Vec<String>;

    /// 读取指定条目的文本内容
    ///
    /// 条目不存在时返回 [`LectioError::EntryNotFound`]。
    fn read_entry_as_text(&mut self, path: &str) -> Result<String>;

    /// 检查条目是否存在
    fn contains(&self, path: &str) -> bool {
        self.list_entries().iter().any(|entry| entry == path)
    }
}

/// 基于zip的EPUB归档
pub struct ZipEpubArchive<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl ZipEpubArchive<File> {
    /// 从文件路径打开EPUB
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<ZipEpubArchive<File>>` - 成功返回归档实例
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> ZipEpubArchive<R> {
    /// 从任意可定位的读取器创建归档
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        let mut epub = Self { archive };
        epub.check_mimetype();
        Ok(epub)
    }

    /// 检查mimetype文件
    ///
    /// 缺失或内容不符只记录警告，不影响后续解析。
    fn check_mimetype(&mut self) -> bool {
        match self.read_entry_as_text("mimetype") {
            Ok(content) if content.trim() == EPUB_MIMETYPE => true,
            Ok(content) => {
                tracing::warn!(found = %content.trim(), "unexpected EPUB mimetype");
                false
            }
            Err(_) => {
                tracing::warn!("EPUB has no mimetype entry");
                false
            }
        }
    }
}

impl<R: Read + Seek> Archive for ZipEpubArchive<R> {
    fn list_entries(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    fn read_entry_as_text(&mut self, path: &str) -> Result<String> {
        let mut file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(LectioError::EntryNotFound(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn contains(&self, path: &str) -> bool {
        self.archive.index_for_name(path).is_some()
    }
}

/// 内存中的归档，条目按路径排序
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: BTreeMap<String, String>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加条目（链式调用）
    pub fn with_entry(mut self, path: &str, content: &str) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: &str, content: &str) {
        self.entries.insert(path.to_string(), content.to_string());
    }
}

impl Archive for MemoryArchive {
    fn list_entries(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn read_entry_as_text(&mut self, path: &str) -> Result<String> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| LectioError::EntryNotFound(path.to_string()))
    }

    fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}
