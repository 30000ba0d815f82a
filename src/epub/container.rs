use crate::error::{InvalidArchiveReason, LectioError, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// container.xml在归档中的固定路径
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone)]
pub struct RootFile {
    pub full_path: String,
}

/// Container.xml的解析结果
#[derive(Debug, Clone)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 解析container.xml内容
    ///
    /// XML格式错误时保留出错前已读到的rootfile。
    pub fn parse_xml(xml_content: &str) -> Container {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut rootfiles = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    if e.local_name().as_ref() != b"rootfile" {
                        continue;
                    }

                    let full_path = e
                        .attributes()
                        .flatten()
                        .find(|attr| attr.key.local_name().as_ref() == b"full-path")
                        .map(|attr| String::from_utf8_lossy(&attr.value).to_string());

                    if let Some(full_path) = full_path.filter(|path| !path.is_empty()) {
                        rootfiles.push(RootFile { full_path });
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(%err, "malformed container.xml");
                    break;
                }
            }
        }

        Container { rootfiles }
    }

    /// 获取OPF文件路径：第一个声明的rootfile
    pub fn opf_path(&self) -> Option<&str> {
        self.rootfiles.first().map(|rf| rf.full_path.as_str())
    }
}

/// 从container.xml中解析出OPF文件路径
///
/// # 返回值
/// * `Result<String>` - OPF文件的完整路径；没有rootfile时返回
///   `InvalidArchive(MissingOpfPath)`
pub fn resolve_opf_path(container_xml: &str) -> Result<String> {
    Container::parse_xml(container_xml)
        .opf_path()
        .map(str::to_string)
        .ok_or(LectioError::InvalidArchive(InvalidArchiveReason::MissingOpfPath))
}
