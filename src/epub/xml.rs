//! quick-xml 的小工具函数

use quick_xml::events::{BytesStart, BytesText};

/// 读取元素属性（按本地名匹配，忽略命名空间前缀）
pub(crate) fn attr_value(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        })
}

/// 解码文本节点；遇到未知实体时退回原始内容
pub(crate) fn text_content(e: &BytesText) -> String {
    match e.unescape() {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(e).into_owned(),
    }
}
