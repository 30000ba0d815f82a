//! 书库
//!
//! 管理已保存的文本：导入EPUB或纯文本、列出、删除，以及打开从上次位置继续的
//! 阅读会话。

use std::fs;
use std::path::Path;

use crate::config::ReaderConfig;
use crate::epub::Book;
use crate::error::{LectioError, Result};
use crate::playback::{PlaybackEngine, SingleShotTimer};
use crate::store::{KeyValueStore, SavedText, StoreCheckpoint, TextStore, now_millis};
use crate::text;

/// 阅读会话使用的引擎类型
pub type SessionEngine<K> = PlaybackEngine<SingleShotTimer, StoreCheckpoint<K>>;

/// 已打开的阅读会话
pub struct ReadingSession<K: KeyValueStore> {
    /// 打开时的文本记录
    pub saved: SavedText,
    pub engine: SessionEngine<K>,
}

/// 书库
pub struct Library<K: KeyValueStore> {
    store: TextStore<K>,
    config: ReaderConfig,
}

impl<K: KeyValueStore + Clone> Library<K> {
    pub fn new(kv: K, config: ReaderConfig) -> Self {
        Self {
            store: TextStore::new(kv),
            config,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// 保存一段纯文本，返回新记录
    pub fn add_text(&mut self, body: &str) -> Result<SavedText> {
        self.insert(body.to_string(), None, None)
    }

    /// 保存已组装的书籍
    pub fn add_book(&mut self, book: Book) -> Result<SavedText> {
        self.insert(book.text, Some(book.title), book.chapters)
    }

    /// 导入EPUB文件
    pub fn import_epub<P: AsRef<Path>>(&mut self, path: P) -> Result<SavedText> {
        let book = Book::open(path)?;
        self.add_book(book)
    }

    /// 按扩展名导入文件：`.epub` 按EPUB处理，其余按UTF-8纯文本处理
    pub fn import_file<P: AsRef<Path>>(&mut self, path: P) -> Result<SavedText> {
        let path = path.as_ref();
        let is_epub = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("epub"));

        if is_epub {
            self.import_epub(path)
        } else {
            let body = fs::read_to_string(path)?;
            self.add_text(&body)
        }
    }

    fn insert(
        &mut self,
        body: String,
        title: Option<String>,
        chapters: Option<Vec<crate::epub::Chapter>>,
    ) -> Result<SavedText> {
        let total_words = text::word_count(&body);
        if total_words == 0 {
            return Err(LectioError::EmptyContent);
        }

        let now = now_millis();
        let saved = SavedText {
            id: generate_id(),
            preview: text::preview(&body, self.config.library.preview_length),
            text: body,
            progress: 0,
            total_words,
            created_at: now,
            updated_at: now,
            title,
            chapters,
        };

        // 新文本放在最前面
        let mut texts = self.store.load();
        texts.insert(0, saved.clone());
        self.store.save(&texts)?;

        tracing::info!(id = %saved.id, words = total_words, "saved text");
        Ok(saved)
    }

    /// 所有已保存文本，最新的在前
    pub fn list(&self) -> Vec<SavedText> {
        self.store.load()
    }

    pub fn find(&self, id: &str) -> Option<SavedText> {
        self.store.load().into_iter().find(|text| text.id == id)
    }

    /// 删除文本；不存在时返回 `false`
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let mut texts = self.store.load();
        let before = texts.len();
        texts.retain(|text| text.id != id);
        if texts.len() == before {
            return Ok(false);
        }
        self.store.save(&texts)?;
        Ok(true)
    }

    /// 打开阅读会话
    ///
    /// 从保存的位置继续（超出范围时限制到最后一个词）并立即开始播放。
    /// `wpm` 为 `None` 时使用配置中的默认速度。
    pub fn open_session(&self, id: &str, wpm: Option<u32>) -> Result<ReadingSession<K>> {
        let saved = self
            .find(id)
            .ok_or_else(|| LectioError::TextNotFound(id.to_string()))?;

        let words = text::to_words(&saved.text);
        let checkpoint =
            StoreCheckpoint::new(TextStore::new(self.store.inner().clone()), &saved.id);
        let mut engine = PlaybackEngine::new(
            words,
            saved.progress,
            wpm,
            self.config.playback.clone(),
            self.config.timing.clone(),
            SingleShotTimer::new(),
            checkpoint,
        );
        engine.play();

        tracing::debug!(id, index = engine.current_index(), wpm = engine.wpm(), "opened session");
        Ok(ReadingSession { saved, engine })
    }
}

/// 生成新的文本标识
fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{Command, Phase};
    use crate::store::MemoryStore;

    fn library() -> Library<MemoryStore> {
        Library::new(MemoryStore::new(), ReaderConfig::default_config())
    }

    #[test]
    fn test_add_text() {
        let mut library = library();
        let saved = library.add_text("  The quick\n\nbrown   fox  ").unwrap();

        assert_eq!(saved.total_words, 4);
        assert_eq!(saved.progress, 0);
        assert_eq!(saved.preview, "The quick brown fox");
        assert_eq!(saved.text, "  The quick\n\nbrown   fox  ");
        assert_eq!(library.find(&saved.id), Some(saved));
    }

    #[test]
    fn test_add_empty_text_is_rejected() {
        let mut library = library();
        assert!(matches!(library.add_text(" \n\t "), Err(LectioError::EmptyContent)));
        assert!(library.list().is_empty());
    }

    #[test]
    fn test_list_newest_first_and_unique_ids() {
        let mut library = library();
        let first = library.add_text("first").unwrap();
        let second = library.add_text("second").unwrap();
        assert_ne!(first.id, second.id);

        let ids: Vec<String> = library.list().into_iter().map(|text| text.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_delete() {
        let mut library = library();
        let saved = library.add_text("delete me").unwrap();
        assert!(library.delete(&saved.id).unwrap());
        assert!(!library.delete(&saved.id).unwrap());
        assert!(library.find(&saved.id).is_none());
    }

    #[test]
    fn test_open_session_unknown_id() {
        let library = library();
        assert!(matches!(
            library.open_session("nope", None),
            Err(LectioError::TextNotFound(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_open_session_resumes_and_plays() {
        let mut library = library();
        let saved = library.add_text("one two three four").unwrap();
        library.store.update_progress(&saved.id, 2).unwrap();

        let session = library.open_session(&saved.id, Some(450)).unwrap();
        assert_eq!(session.engine.current_index(), 2);
        assert_eq!(session.engine.phase(), Phase::Playing);
        assert_eq!(session.engine.wpm(), 450);

        let session = library.open_session(&saved.id, None).unwrap();
        assert_eq!(session.engine.wpm(), 300);
    }

    #[test]
    fn test_open_session_clamps_out_of_range_progress() {
        let mut library = library();
        let saved = library.add_text("one two").unwrap();
        library.store.update_progress(&saved.id, 40).unwrap();

        let session = library.open_session(&saved.id, None).unwrap();
        assert_eq!(session.engine.current_index(), 1);
    }

    #[test]
    fn test_session_checkpoints_progress() {
        let mut library = library();
        let saved = library.add_text("one two three").unwrap();

        let mut session = library.open_session(&saved.id, None).unwrap();
        session.engine.apply(Command::StepForward);
        session.engine.apply(Command::StepForward);
        assert_eq!(library.find(&saved.id).unwrap().progress, 2);

        session.engine.apply(Command::Reset);
        assert_eq!(library.find(&saved.id).unwrap().progress, 0);
    }

    #[test]
    fn test_import_plain_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "plain text notes").unwrap();

        let mut library = library();
        let saved = library.import_file(&path).unwrap();
        assert_eq!(saved.total_words, 3);
        assert_eq!(saved.title, None);
    }
}
