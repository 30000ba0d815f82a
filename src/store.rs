//! 已保存文本的持久化
//!
//! 整个集合以JSON数组的形式保存在键值存储的单个键下，每次进度更新都会整体
//! 读出、修改、写回。两个进程同时写入时后写者会覆盖先写者的进度。

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::epub::Chapter;
use crate::error::Result;
use crate::playback::ProgressSink;

/// 已保存文本集合使用的键
pub const SAVED_TEXTS_KEY: &str = "lectio-saved-texts";

/// 字符串键值存储
pub trait KeyValueStore {
    /// 读取键的值；键不存在时返回 `None`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// 写入键的值
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// 文件存储：数据目录下每个键对应一个 `<key>.json` 文件
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;

        // 先写临时文件再改名，避免中途失败留下半个文件
        let path = self.key_path(key);
        let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

/// 内存存储；克隆出的实例共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 已保存的文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedText {
    pub id: String,
    pub text: String,
    pub preview: String,
    /// 阅读位置（词下标）
    pub progress: usize,
    pub total_words: usize,
    /// 毫秒时间戳
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<Vec<Chapter>>,
}

impl SavedText {
    /// 书库列表中显示的百分比（四舍五入）
    pub fn progress_percent(&self) -> u32 {
        if self.total_words == 0 {
            return 0;
        }
        (self.progress as f64 / self.total_words as f64 * 100.0).round() as u32
    }

    /// 是否已读到最后一个词
    pub fn is_complete(&self) -> bool {
        self.progress + 1 >= self.total_words
    }

    /// 列表中显示的名称：有书名时用书名，否则用预览
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.preview)
    }
}

/// 当前时间的毫秒时间戳
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 已保存文本集合
#[derive(Debug, Clone)]
pub struct TextStore<K: KeyValueStore> {
    kv: K,
}

impl<K: KeyValueStore> TextStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn inner(&self) -> &K {
        &self.kv
    }

    /// 读取整个集合
    ///
    /// 数据缺失、无法读取或格式损坏时返回空集合，不会失败。
    pub fn load(&self) -> Vec<SavedText> {
        let raw = match self.kv.get(SAVED_TEXTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(%err, "saved texts not readable, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(texts) => texts,
            Err(err) => {
                tracing::warn!(%err, "saved texts are corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// 写回整个集合
    pub fn save(&mut self, texts: &[SavedText]) -> Result<()> {
        let raw = serde_json::to_string(texts)?;
        self.kv.set(SAVED_TEXTS_KEY, &raw)
    }

    /// 更新某个文本的阅读位置；文本不存在时返回 `false`
    pub fn update_progress(&mut self, id: &str, progress: usize) -> Result<bool> {
        let mut texts = self.load();
        let Some(text) = texts.iter_mut().find(|text| text.id == id) else {
            return Ok(false);
        };
        text.progress = progress;
        text.updated_at = now_millis();
        self.save(&texts)?;
        Ok(true)
    }
}

/// 把播放位置写回存储；文本标识在打开阅读会话时确定
#[derive(Debug)]
pub struct StoreCheckpoint<K: KeyValueStore> {
    store: TextStore<K>,
    text_id: String,
}

impl<K: KeyValueStore> StoreCheckpoint<K> {
    pub fn new(store: TextStore<K>, text_id: impl Into<String>) -> Self {
        Self {
            store,
            text_id: text_id.into(),
        }
    }

    pub fn text_id(&self) -> &str {
        &self.text_id
    }
}

impl<K: KeyValueStore> ProgressSink for StoreCheckpoint<K> {
    fn checkpoint(&mut self, index: usize) {
        match self.store.update_progress(&self.text_id, index) {
            Ok(true) => {}
            Ok(false) => tracing::debug!(id = %self.text_id, "saved text no longer exists"),
            Err(err) => tracing::warn!(id = %self.text_id, %err, "failed to save progress"),
        }
    }
}
