//! 阅读器配置模块
//!
//! 提供播放参数、时长启发式参数与书库位置的配置管理，支持从YAML文件加载。

use crate::error::{LectioError, Result};
use crate::playback::timing::TimingProfile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "lectio.yaml";

/// 播放参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// 没有指定时的初始速度
    pub default_wpm: u32,
    /// 速度下限
    pub min_wpm: u32,
    /// 速度上限
    pub max_wpm: u32,
    /// 每次调节的步长
    pub wpm_step: u32,
    /// 是否默认启用可变时长
    pub variable_timing: bool,
    /// 上下文视图中当前词之前的词数
    pub context_before: usize,
    /// 上下文视图中当前词之后的词数
    pub context_after: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_wpm: 300,
            min_wpm: 100,
            max_wpm: 1000,
            wpm_step: 25,
            variable_timing: true,
            context_before: 15,
            context_after: 5,
        }
    }
}

impl PlaybackConfig {
    /// 把速度限制在 [min_wpm, max_wpm] 范围内
    pub fn clamp_wpm(&self, wpm: i64) -> u32 {
        wpm.clamp(i64::from(self.min_wpm), i64::from(self.max_wpm)) as u32
    }
}

/// 书库参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// 数据目录
    pub data_dir: PathBuf,
    /// 预览文本的最大字符数
    pub preview_length: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".lectio"),
            preview_length: 60,
        }
    }
}

/// 完整配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub playback: PlaybackConfig,
    pub timing: TimingProfile,
    pub library: LibraryConfig,
}

impl ReaderConfig {
    /// 从配置文件中加载
    ///
    /// # 参数
    /// * `path` - YAML配置文件路径
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| LectioError::ConfigError(format!("无法读取配置文件: {}", e)))?;

        let config: Self = serde_yml::from_str(&content)
            .map_err(|e| LectioError::ConfigError(format!("配置文件格式错误: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 生成默认配置文件
    ///
    /// # 参数
    /// * `path` - 要写入的配置文件路径
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml_content = serde_yml::to_string(&Self::default_config())
            .map_err(|e| LectioError::ConfigError(format!("序列化配置失败: {}", e)))?;

        let content_with_header = format!(
            concat!(
                "# Lectio 配置文件\n",
                "# playback: 播放速度与上下文视图\n",
                "# timing: 可变时长的启发式系数\n",
                "# library: 书库数据目录\n\n{}"
            ),
            yaml_content
        );

        fs::write(path.as_ref(), content_with_header)
            .map_err(|e| LectioError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }

    /// 获取默认配置
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 配置文件存在时加载，否则使用默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                path = %path.as_ref().display(),
                "config file not found, using defaults"
            );
            Ok(Self::default_config())
        }
    }

    /// 检查配置的一致性
    pub fn validate(&self) -> Result<()> {
        let playback = &self.playback;
        if playback.min_wpm == 0 || playback.min_wpm > playback.max_wpm {
            return Err(LectioError::ConfigError(format!(
                "速度范围无效: {}..{}",
                playback.min_wpm, playback.max_wpm
            )));
        }
        if playback.wpm_step == 0 {
            return Err(LectioError::ConfigError("速度步长不能为0".to_string()));
        }
        self.timing.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = ReaderConfig::default_config();
        assert_eq!(config.playback.default_wpm, 300);
        assert_eq!(config.playback.min_wpm, 100);
        assert_eq!(config.playback.max_wpm, 1000);
        assert_eq!(config.playback.wpm_step, 25);
        assert_eq!(config.library.preview_length, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lectio.yaml");

        ReaderConfig::generate_default_config(&path).unwrap();
        let loaded = ReaderConfig::from_file(&path).unwrap();
        assert_eq!(loaded, ReaderConfig::default_config());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.yaml");
        fs::write(&path, "playback:\n  default_wpm: 450\n").unwrap();

        let config = ReaderConfig::from_file(&path).unwrap();
        assert_eq!(config.playback.default_wpm, 450);
        assert_eq!(config.playback.max_wpm, 1000);
        assert_eq!(config.timing, TimingProfile::default());
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");

        fs::write(&path, "playback:\n  min_wpm: 500\n  max_wpm: 200\n").unwrap();
        assert!(matches!(ReaderConfig::from_file(&path), Err(LectioError::ConfigError(_))));

        fs::write(&path, "playback: [not, a, map]\n").unwrap();
        assert!(matches!(ReaderConfig::from_file(&path), Err(LectioError::ConfigError(_))));
    }

    #[test]
    fn test_negative_timing_factor_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timing.yaml");

        fs::write(&path, "timing:\n  sentence_end_factor: -1.5\n").unwrap();
        assert!(matches!(ReaderConfig::from_file(&path), Err(LectioError::ConfigError(_))));

        fs::write(&path, "timing:\n  length_tiers:\n    - factor: -0.5\n").unwrap();
        assert!(matches!(ReaderConfig::from_file(&path), Err(LectioError::ConfigError(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReaderConfig::load_or_default(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, ReaderConfig::default_config());
    }

    #[test]
    fn test_clamp_wpm() {
        let playback = PlaybackConfig::default();
        assert_eq!(playback.clamp_wpm(1015), 1000);
        assert_eq!(playback.clamp_wpm(85), 100);
        assert_eq!(playback.clamp_wpm(-40), 100);
        assert_eq!(playback.clamp_wpm(425), 425);
    }
}
