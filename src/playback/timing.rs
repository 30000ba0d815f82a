//! 逐词显示时长
//!
//! 可变时长模式下，常用词更快、长词更慢、句末和分句标点处稍作停顿。
//! 所有系数都来自 [`TimingProfile`]，可以通过配置文件调整。

use std::collections::BTreeSet;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{LectioError, Result};

/// 默认的常用词表
const COMMON_WORDS: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
    "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
    "what", "so", "up", "out", "if", "about", "who", "get", "which", "go", "me", "when", "make",
    "can", "like", "time", "no", "just", "him", "know", "take", "into", "your", "some", "could",
    "them", "see", "other", "than", "then", "now", "its", "our", "two", "way", "had", "was",
    "were", "been", "has", "is", "am", "are", "did", "does", "done", "got", "went", "come",
    "came", "said", "very", "after", "most", "also", "made", "many", "before", "must",
    "through", "back", "years", "where", "much", "may", "well", "down", "should", "because",
    "each", "those", "people", "how", "too", "any", "same", "us", "need",
];

static DEFAULT_PROFILE: Lazy<TimingProfile> = Lazy::new(TimingProfile::default);

/// 按词长(清理后)划分的时长系数档位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthTier {
    /// 该档位包含的最大长度；`None` 表示不设上限
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    pub factor: f64,
}

impl LengthTier {
    fn new(max_len: Option<usize>, factor: f64) -> Self {
        Self { max_len, factor }
    }
}

/// 可变时长的启发式参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingProfile {
    /// 常用词（小写、只含a-z）
    pub common_words: BTreeSet<String>,
    pub common_word_factor: f64,
    /// 按最大长度升序排列的档位
    pub length_tiers: Vec<LengthTier>,
    /// 句末标点
    pub sentence_end_chars: String,
    pub sentence_end_factor: f64,
    /// 分句标点
    pub clause_end_chars: String,
    pub clause_end_factor: f64,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self {
            common_words: COMMON_WORDS.iter().map(|word| word.to_string()).collect(),
            common_word_factor: 0.8,
            length_tiers: vec![
                LengthTier::new(Some(3), 0.9),
                LengthTier::new(Some(5), 1.0),
                LengthTier::new(Some(8), 1.15),
                LengthTier::new(Some(12), 1.3),
                LengthTier::new(None, 1.5),
            ],
            sentence_end_chars: ".!?".to_string(),
            sentence_end_factor: 1.5,
            clause_end_chars: ",;:".to_string(),
            clause_end_factor: 1.2,
        }
    }
}

impl TimingProfile {
    /// 计算单个词的时长系数，各项系数相乘
    pub fn delay_multiplier(&self, word: &str) -> f64 {
        let cleaned: String = word
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase())
            .collect();

        let mut multiplier = 1.0;

        if self.common_words.contains(&cleaned) {
            multiplier *= self.common_word_factor;
        }

        let length = cleaned.len();
        if let Some(tier) = self
            .length_tiers
            .iter()
            .find(|tier| tier.max_len.is_none_or(|max_len| length <= max_len))
        {
            multiplier *= tier.factor;
        }

        if let Some(last) = word.chars().last() {
            if self.sentence_end_chars.contains(last) {
                multiplier *= self.sentence_end_factor;
            } else if self.clause_end_chars.contains(last) {
                multiplier *= self.clause_end_factor;
            }
        }

        multiplier
    }

    /// 单个词的显示时长（毫秒）
    ///
    /// 固定时长模式下系数恒为1。
    pub fn delay_ms(&self, word: &str, wpm: u32, variable_timing: bool) -> f64 {
        let multiplier = if variable_timing {
            self.delay_multiplier(word)
        } else {
            1.0
        };
        base_interval_ms(wpm) * multiplier
    }

    /// 单个词的显示时长；无法表示的时长按0处理
    pub fn word_delay(&self, word: &str, wpm: u32, variable_timing: bool) -> Duration {
        Duration::try_from_secs_f64(self.delay_ms(word, wpm, variable_timing) / 1000.0)
            .unwrap_or_default()
    }

    /// 检查所有系数都是非负的有限数
    pub fn validate(&self) -> Result<()> {
        let factors = [
            ("common_word_factor", self.common_word_factor),
            ("sentence_end_factor", self.sentence_end_factor),
            ("clause_end_factor", self.clause_end_factor),
        ]
        .into_iter()
        .chain(
            self.length_tiers
                .iter()
                .map(|tier| ("length_tiers.factor", tier.factor)),
        );

        for (name, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(LectioError::ConfigError(format!(
                    "时长系数无效: {} = {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// 每个词的基础间隔：60000 / wpm 毫秒
pub fn base_interval_ms(wpm: u32) -> f64 {
    60_000.0 / f64::from(wpm.max(1))
}

/// 使用默认参数计算时长系数
pub fn delay_multiplier(word: &str) -> f64 {
    DEFAULT_PROFILE.delay_multiplier(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_common_short_word() {
        assert!(approx(delay_multiplier("the"), 0.72));
        assert!(approx(delay_multiplier("The"), 0.72));
    }

    #[test]
    fn test_long_word_with_sentence_end() {
        assert!(approx(delay_multiplier("extraordinary."), 2.25));
    }

    #[test]
    fn test_length_tiers() {
        assert!(approx(delay_multiplier("cat"), 0.9));
        assert!(approx(delay_multiplier("horse"), 1.0));
        assert!(approx(delay_multiplier("pebbles"), 1.15));
        assert!(approx(delay_multiplier("telescope"), 1.3));
        assert!(approx(delay_multiplier("unbelievably"), 1.3));
        assert!(approx(delay_multiplier("unbelievables"), 1.5));
    }

    #[test]
    fn test_punctuation_uses_raw_word() {
        assert!(approx(delay_multiplier("cat,"), 0.9 * 1.2));
        assert!(approx(delay_multiplier("cat;"), 0.9 * 1.2));
        assert!(approx(delay_multiplier("cat?"), 0.9 * 1.5));
        // 句末标点之后还有引号时不算句末
        assert!(approx(delay_multiplier("cat.\""), 0.9));
        // 清理后为空串的词按最短档位计算
        assert!(approx(delay_multiplier("—"), 0.9));
    }

    #[test]
    fn test_fixed_timing_ignores_multiplier() {
        let profile = TimingProfile::default();
        assert!(approx(profile.delay_ms("extraordinary.", 300, false), 200.0));
        assert!(approx(profile.delay_ms("the", 300, true), 200.0 * 0.72));
        assert_eq!(profile.word_delay("word", 600, false), Duration::from_millis(100));
    }

    #[test]
    fn test_validate_rejects_negative_and_nan_factors() {
        assert!(TimingProfile::default().validate().is_ok());

        let mut profile = TimingProfile::default();
        profile.sentence_end_factor = -1.5;
        assert!(matches!(profile.validate(), Err(LectioError::ConfigError(_))));

        let mut profile = TimingProfile::default();
        profile.length_tiers[2].factor = f64::NAN;
        assert!(profile.validate().is_err());

        let mut profile = TimingProfile::default();
        profile.common_word_factor = f64::INFINITY;
        assert!(profile.validate().is_err());

        let mut profile = TimingProfile::default();
        profile.clause_end_factor = 0.0;
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_word_delay_never_panics_on_bad_factors() {
        let mut profile = TimingProfile::default();
        profile.sentence_end_factor = -1.5;
        assert_eq!(profile.word_delay("end.", 300, true), Duration::ZERO);

        profile.sentence_end_factor = f64::NAN;
        assert_eq!(profile.word_delay("end.", 300, true), Duration::ZERO);
        assert_eq!(profile.word_delay("end.", 300, false), Duration::from_millis(200));
    }

    #[test]
    fn test_custom_profile() {
        let mut profile = TimingProfile::default();
        profile.common_words.clear();
        profile.sentence_end_factor = 2.0;
        assert!(approx(profile.delay_multiplier("the."), 0.9 * 2.0));
    }

    proptest! {
        #[test]
        fn prop_delay_decreases_with_wpm(
            word in "[a-zA-Z.,!?]{0,20}",
            wpm in 100u32..1000,
        ) {
            let profile = TimingProfile::default();
            let slower = profile.delay_ms(&word, wpm, true);
            let faster = profile.delay_ms(&word, wpm + 1, true);
            prop_assert!(faster < slower);
            let expected = 60_000.0 / f64::from(wpm) * profile.delay_multiplier(&word);
            prop_assert!(approx(slower, expected));
        }
    }
}
