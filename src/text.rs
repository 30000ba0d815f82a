//! 文本处理工具
//!
//! 分词、空白规范化与预览生成。导入流程和播放引擎共用同一个分词函数，
//! 保证章节的词偏移与播放时的词序列一致。

/// 按空白切分文本，只保留非空的词
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// 统计文本中的词数
pub fn word_count(text: &str) -> usize {
    words(text).count()
}

/// 将文本切分为拥有所有权的词序列
pub fn to_words(text: &str) -> Vec<String> {
    words(text).map(str::to_string).collect()
}

/// 把任意空白序列折叠为单个空格并去掉首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    words(text).collect::<Vec<_>>().join(" ")
}

/// 规范化整本书的文本
///
/// 段落之间以空行分隔；段落内部的空白（包括单个换行）折叠为一个空格，
/// 连续的多个空行合并为一个，首尾空白被去除。
pub fn normalize_text(text: &str) -> String {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            continue;
        }

        for word in words(line) {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs.join("\n\n")
}

/// 生成列表中显示的预览文本
///
/// 超过 `max_length` 个字符时截断并追加 `...`。
pub fn preview(text: &str, max_length: usize) -> String {
    let cleaned = collapse_whitespace(text);
    if cleaned.chars().count() <= max_length {
        return cleaned;
    }

    let truncated: String = cleaned.chars().take(max_length).collect();
    format!("{}...", truncated.trim_end())
}
