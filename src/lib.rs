pub mod cli;
pub mod config;
pub mod epub;
pub mod error;
pub mod library;
pub mod logging;
pub mod playback;
pub mod store;
pub mod terminal;
pub mod text;

// === 核心API重新导出 ===

/// 书籍组装
pub use epub::{Book, Chapter, assemble};

/// 错误处理
pub use error::{InvalidArchiveReason, LectioError, Result};

/// 配置
pub use config::{LibraryConfig, PlaybackConfig, ReaderConfig};

// === 播放 ===

pub use playback::{
    Command,
    CommandOutcome,
    OrpSplit,
    Phase,
    PlaybackEngine,
    ProgressSink,
    Scheduler,
    SingleShotTimer,
    TimerId,
    TimingProfile,
    delay_multiplier,
    orp_index,
};

// === 书库与持久化 ===

pub use library::{Library, ReadingSession};
pub use store::{FileStore, KeyValueStore, MemoryStore, SavedText, TextStore};

// === 库信息 ===

/// Lectio库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lectio库的描述
pub const DESCRIPTION: &str = "逐词快速阅读引擎：EPUB导入、章节定位与ORP播放";

/// 快速打开EPUB文件并组装为书籍
///
/// # 示例
///
/// ```no_run
/// let book = lectio::open("book.epub")?;
/// println!("书名: {}", book.title);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Book> {
    Book::open(path)
}
