//! OPF解析器模块
//!
//! 提供OPF（Open Packaging Format）文件的XML解析功能。

use crate::epub::opf::manifest::{Manifest, ManifestItem};
use crate::epub::xml::{attr_value, text_content};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// 没有标题时使用的默认书名
pub const DEFAULT_TITLE: &str = "Untitled";

/// 当前所在的OPF区段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Metadata,
    Manifest,
    Spine,
}

/// 正在收集文本的元数据字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaField {
    Title,
    Creator,
    Language,
}

/// OPF文件解析结果
#[derive(Debug, Clone)]
pub struct Package {
    /// 书名
    pub title: String,
    /// 作者列表
    pub creators: Vec<String>,
    /// 语言
    pub language: Option<String>,
    /// 清单项(文件列表)
    pub manifest: Manifest,
    /// 阅读顺序：已解析的文件路径
    pub spine: Vec<String>,
    /// 脊柱的目录引用(NCX清单项ID)
    pub spine_toc: Option<String>,
    /// OPF文件所在目录(带结尾的 `/`，根目录时为空)
    pub opf_dir: String,
}

/// 返回OPF路径的目录部分，包含结尾的 `/`
pub fn opf_directory(opf_path: &str) -> &str {
    match opf_path.rfind('/') {
        Some(position) => &opf_path[..=position],
        None => "",
    }
}

impl Package {
    /// 解析OPF文件内容
    ///
    /// 清单中的href直接拼接在OPF目录之后，不处理 `..` 段。
    /// XML格式错误时停止解析并保留已读取的部分。
    ///
    /// # 参数
    /// * `opf_content` - OPF文件的XML内容
    /// * `opf_path` - OPF文件在归档中的路径
    pub fn parse(opf_content: &str, opf_path: &str) -> Package {
        let opf_dir = opf_directory(opf_path).to_string();

        let mut reader = Reader::from_str(opf_content);
        reader.config_mut().trim_text(true);

        let mut title: Option<String> = None;
        let mut creators = Vec::new();
        let mut language = None;
        let mut manifest = Manifest::new();
        let mut idrefs: Vec<String> = Vec::new();
        let mut spine_toc = None;

        let mut section = Section::None;
        let mut capturing: Option<MetaField> = None;
        let mut text = String::new();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(
                        %err,
                        opf_path,
                        "malformed package document, keeping partial result"
                    );
                    break;
                }
            };

            match event {
                Event::Start(ref e) => {
                    let local_name = e.local_name();
                    match local_name.as_ref() {
                        b"metadata" => section = Section::Metadata,
                        b"manifest" => section = Section::Manifest,
                        b"spine" => {
                            section = Section::Spine;
                            spine_toc = attr_value(e, b"toc");
                        }
                        b"item" if section == Section::Manifest => {
                            Self::parse_manifest_item(e, &opf_dir, &mut manifest);
                        }
                        b"itemref" if section == Section::Spine => {
                            Self::parse_spine_item(e, &mut idrefs);
                        }
                        name if section == Section::Metadata && capturing.is_none() => {
                            capturing = match name {
                                b"title" => Some(MetaField::Title),
                                b"creator" => Some(MetaField::Creator),
                                b"language" => Some(MetaField::Language),
                                _ => None,
                            };
                            text.clear();
                        }
                        _ => {}
                    }
                }
                Event::Empty(ref e) => match e.local_name().as_ref() {
                    b"item" if section == Section::Manifest => {
                        Self::parse_manifest_item(e, &opf_dir, &mut manifest);
                    }
                    b"itemref" if section == Section::Spine => {
                        Self::parse_spine_item(e, &mut idrefs);
                    }
                    b"spine" => spine_toc = attr_value(e, b"toc"),
                    _ => {}
                },
                Event::End(ref e) => {
                    let local_name = e.local_name();
                    match local_name.as_ref() {
                        b"metadata" | b"manifest" | b"spine" => section = Section::None,
                        name => {
                            let finished = match (capturing, name) {
                                (Some(MetaField::Title), b"title")
                                | (Some(MetaField::Creator), b"creator")
                                | (Some(MetaField::Language), b"language") => capturing.take(),
                                _ => None,
                            };
                            let value = text.trim();
                            match finished {
                                Some(MetaField::Title) if title.is_none() && !value.is_empty() => {
                                    title = Some(value.to_string());
                                }
                                Some(MetaField::Creator) if !value.is_empty() => {
                                    creators.push(value.to_string());
                                }
                                Some(MetaField::Language)
                                    if language.is_none() && !value.is_empty() =>
                                {
                                    language = Some(value.to_string());
                                }
                                _ => {}
                            }
                        }
                    }
                }
                Event::Text(ref e) if capturing.is_some() => {
                    text.push_str(&text_content(e));
                }
                Event::CData(ref e) if capturing.is_some() => {
                    text.push_str(&String::from_utf8_lossy(e));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let spine = idrefs
            .iter()
            .filter_map(|idref| match manifest.get(idref) {
                Some(manifest_item) => Some(manifest_item.href.clone()),
                None => {
                    tracing::debug!(%idref, "spine itemref not found in manifest");
                    None
                }
            })
            .collect();

        Package {
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            creators,
            language,
            manifest,
            spine,
            spine_toc,
            opf_dir,
        }
    }

    /// 解析清单项；缺少id或href的项被忽略
    fn parse_manifest_item(e: &BytesStart, opf_dir: &str, manifest: &mut Manifest) {
        let id = attr_value(e, b"id").filter(|id| !id.is_empty());
        let href = attr_value(e, b"href").filter(|href| !href.is_empty());

        if let (Some(id), Some(href)) = (id, href) {
            let media_type = attr_value(e, b"media-type").unwrap_or_default();
            let mut item = ManifestItem::new(id, format!("{}{}", opf_dir, href), media_type);
            item.properties = attr_value(e, b"properties");
            manifest.insert(item);
        }
    }

    /// 解析脊柱项；`linear="no"` 的项同样按顺序保留
    fn parse_spine_item(e: &BytesStart, idrefs: &mut Vec<String>) {
        if let Some(idref) = attr_value(e, b"idref").filter(|idref| !idref.is_empty()) {
            idrefs.push(idref);
        }
    }

    /// 获取导航目录使用的NCX清单项
    ///
    /// 优先使用spine的toc属性，其次是第一个NCX媒体类型的清单项。
    pub fn ncx_item(&self) -> Option<&ManifestItem> {
        self.spine_toc
            .as_deref()
            .and_then(|id| self.manifest.get(id))
            .filter(|item| item.is_ncx())
            .or_else(|| self.manifest.iter().find(|item| item.is_ncx()))
    }
}
