//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义。清单项按文档顺序保存，同时维护id索引。

use std::collections::HashMap;

/// NCX导航文件的媒体类型
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// 清单项信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    /// 项目ID
    pub id: String,
    /// 文件路径(已按OPF所在目录拼接)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
    /// 属性(如nav、cover-image等)
    pub properties: Option<String>,
}

impl ManifestItem {
    /// 创建新的清单项
    pub fn new(id: String, href: String, media_type: String) -> Self {
        Self {
            id,
            href,
            media_type,
            properties: None,
        }
    }

    /// 检查是否包含指定属性
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|properties| properties.split_whitespace().any(|p| p == property))
    }

    /// 检查是否为EPUB3导航文档
    pub fn is_nav(&self) -> bool {
        self.has_property("nav")
    }

    /// 检查是否为NCX导航文件
    pub fn is_ncx(&self) -> bool {
        self.media_type == NCX_MEDIA_TYPE
    }

    /// 检查是否为(X)HTML文件
    pub fn is_markup(&self) -> bool {
        matches!(self.media_type.as_str(), "application/xhtml+xml" | "text/html")
    }
}

/// 清单：按文档顺序排列的清单项
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    items: Vec<ManifestItem>,
    index: HashMap<String, usize>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入清单项；重复的id覆盖先前的项，位置不变
    pub fn insert(&mut self, item: ManifestItem) {
        match self.index.get(&item.id) {
            Some(&position) => self.items[position] = item,
            None => {
                self.index.insert(item.id.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    /// 根据ID获取清单项
    pub fn get(&self, id: &str) -> Option<&ManifestItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    /// 按文档顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
