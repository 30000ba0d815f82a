//! 最佳识别点（ORP）
//!
//! 根据词长选择注视字母，把词切分为前段、焦点字母、后段三部分。
//! 长度按字符（而非字节）计算。

/// 计算词的ORP下标
///
/// 长度 0–1 → 0，2–3 → 1，4–5 → 2，6–9 → 3，10–13 → 4，≥14 → 5。
pub fn orp_index(word: &str) -> usize {
    match word.chars().count() {
        0..=1 => 0,
        2..=3 => 1,
        4..=5 => 2,
        6..=9 => 3,
        10..=13 => 4,
        _ => 5,
    }
}

/// 按ORP切分后的词
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrpSplit<'a> {
    pub before: &'a str,
    pub focus: &'a str,
    pub after: &'a str,
}

impl<'a> OrpSplit<'a> {
    /// 切分词；空词的三部分均为空
    pub fn new(word: &'a str) -> Self {
        let index = orp_index(word);
        let mut boundaries = word.char_indices().map(|(offset, _)| offset).skip(index);

        let start = boundaries.next().unwrap_or(word.len());
        let end = boundaries.next().unwrap_or(word.len());

        Self {
            before: &word[..start],
            focus: &word[start..end],
            after: &word[end..],
        }
    }

    /// 焦点字母之前的字符数
    pub fn focus_offset(&self) -> usize {
        self.before.chars().count()
    }

    /// 焦点字母要落在 `column` 列时，前段之前需要补的空格数
    ///
    /// 前段超过 `column` 时为0。
    pub fn padding(&self, column: usize) -> usize {
        column.saturating_sub(self.focus_offset())
    }
}
