pub mod archive;
pub mod book;
pub mod container;
pub mod content;
pub mod opf;
pub mod toc;
mod xml;

// 重新导出归档相关
pub use archive::{Archive, MemoryArchive, ZipEpubArchive};

// 重新导出书籍组装
pub use book::{Book, Chapter, assemble};

// 重新导出容器相关
pub use container::{CONTAINER_PATH, Container, RootFile, resolve_opf_path};

// 重新导出正文提取
pub use content::{extract_chapter_title, extract_text};

// 重新导出OPF相关
pub use opf::{DEFAULT_TITLE, Manifest, ManifestItem, Package};

// 重新导出目录相关
pub use toc::{TocEntry, resolve_toc};
