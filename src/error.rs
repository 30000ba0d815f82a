use std::fmt;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LectioError>;

/// 归档无效的具体原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArchiveReason {
    /// 缺少 META-INF/container.xml
    MissingContainer,
    /// container.xml 中没有声明 rootfile
    MissingOpfPath,
    /// rootfile 指向的OPF文件不存在
    MissingPackage,
}

impl fmt::Display for InvalidArchiveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::MissingContainer => "缺少container.xml",
            Self::MissingOpfPath => "找不到OPF文件路径",
            Self::MissingPackage => "OPF文件不存在",
        };
        f.write_str(message)
    }
}

/// Lectio相关的错误类型
#[derive(Error, Debug)]
pub enum LectioError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("文件不是有效的EPUB格式: {0}")]
    InvalidArchive(InvalidArchiveReason),

    #[error("没有可读取的文本内容")]
    EmptyContent,

    #[error("归档中不存在条目: {0}")]
    EntryNotFound(String),

    #[error("找不到文本: {0}")]
    TextNotFound(String),

    #[error("阅读需要在交互式终端中进行")]
    NotATerminal,

    #[error("配置文件错误: {0}")]
    ConfigError(String),

    #[error("日志初始化失败: {0}")]
    Logging(String),
}
