//! # Card 模块
//!
//! 卡牌记录与卡包。
//!
//! 卡牌记录是卡牌文件中的两行文本（元数据行 + 正文行），
//! 作为不可变值直接用作键，没有额外的 id。

use std::fmt;
use std::sync::Arc;

/// 卡牌记录
///
/// 文本形式固定为 `"<metadata>\n<body>\n"`，相等性按完整文本比较。
/// 克隆只复制引用计数。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardRecord {
    text: Arc<str>,
    metadata_len: usize,
}

impl CardRecord {
    /// 由元数据行和正文行构造
    ///
    /// 行尾的 `\r` 会被去掉。
    pub fn new(metadata: &str, body: &str) -> Self {
        let metadata = metadata.trim_end_matches('\r');
        let body = body.trim_end_matches('\r');
        let text = format!("{metadata}\n{body}\n");
        Self {
            text: Arc::from(text),
            metadata_len: metadata.len(),
        }
    }

    /// 完整文本（写出卡包文件时使用）
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// 元数据行（不含换行）
    pub fn metadata(&self) -> &str {
        &self.text[..self.metadata_len]
    }

    /// 正文行（不含换行）
    pub fn body(&self) -> &str {
        let rest = &self.text[self.metadata_len + 1..];
        rest.strip_suffix('\n').unwrap_or(rest)
    }

    /// 元数据中 `mvid:` 之后的标识
    ///
    /// 输入: `// mvid:386616 qty:1 name:Abzan Guide`
    /// 输出: `Some("386616")`
    pub fn multiverse_id(&self) -> Option<&str> {
        let (_, after) = self.metadata().split_once("mvid:")?;
        after.split_whitespace().next()
    }
}

/// 日志中只显示元数据行
impl fmt::Display for CardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metadata())
    }
}

/// 卡包
///
/// 一次 `generate_pack` 构建的有序卡牌序列。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pack {
    cards: Vec<CardRecord>,
}

impl Pack {
    /// 创建空卡包
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, card: CardRecord) {
        self.cards.push(card);
    }

    /// 卡包中是否已有该卡牌
    pub fn contains(&self, card: &CardRecord) -> bool {
        self.cards.contains(card)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[CardRecord] {
        &self.cards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CardRecord> {
        self.cards.iter()
    }

    pub fn into_cards(self) -> Vec<CardRecord> {
        self.cards
    }

    /// 拼接所有卡牌文本，即 `.dec` 文件内容
    pub fn to_text(&self) -> String {
        self.cards.iter().map(CardRecord::as_str).collect()
    }
}

impl FromIterator<CardRecord> for Pack {
    fn from_iter<I: IntoIterator<Item = CardRecord>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Pack {
    type Item = CardRecord;
    type IntoIter = std::vec::IntoIter<CardRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}

impl<'a> IntoIterator for &'a Pack {
    type Item = &'a CardRecord;
    type IntoIter = std::slice::Iter<'a, CardRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_record_parts() {
        let card = CardRecord::new("// mvid:386616 qty:1", "1 Abzan Guide\r");
        assert_eq!(card.metadata(), "// mvid:386616 qty:1");
        assert_eq!(card.body(), "1 Abzan Guide");
        assert_eq!(card.as_str(), "// mvid:386616 qty:1\n1 Abzan Guide\n");
        assert_eq!(card.to_string(), "// mvid:386616 qty:1");
    }

    #[test]
    fn test_card_record_equality_is_by_text() {
        let a = CardRecord::new("m", "b");
        let b = CardRecord::new("m", "b");
        let c = CardRecord::new("m", "c");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_multiverse_id() {
        let card = CardRecord::new("// mvid:386616 qty:1 name:Abzan Guide", "1 Abzan Guide");
        assert_eq!(card.multiverse_id(), Some("386616"));

        let card = CardRecord::new("// no id here", "1 Card");
        assert_eq!(card.multiverse_id(), None);

        let card = CardRecord::new("// mvid:", "1 Card");
        assert_eq!(card.multiverse_id(), None);
    }

    #[test]
    fn test_pack_text_concatenates_records() {
        let mut pack = Pack::new();
        pack.push(CardRecord::new("a", "1"));
        pack.push(CardRecord::new("b", "2"));

        assert_eq!(pack.len(), 2);
        assert!(pack.contains(&CardRecord::new("a", "1")));
        assert_eq!(pack.to_text(), "a\n1\nb\n2\n");
    }
}
