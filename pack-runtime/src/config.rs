//! # Config 模块
//!
//! 引擎行为选项。所有字段都有默认值，可以直接从 JSON 反序列化。
//!
//! 默认为宽松解析、同包重复只告警，跨文件重复的卡牌以后出现的为准。

use serde::{Deserialize, Serialize};

/// 词法/语法错误的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// 记录诊断，丢弃出错的 token 后继续
    #[default]
    Lenient,
    /// 遇到第一个错误就放弃整个解析
    Strict,
}

/// 同一卡包中重复 Add 同一张卡牌时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// 记录警告但允许
    #[default]
    Warn,
    /// 作为错误中止当前卡包
    Reject,
}

/// 相同卡牌文本出现在多个文件中时如何设置剩余数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedPolicy {
    /// 后出现的覆盖为 D
    #[default]
    Overwrite,
    /// 每出现一次加 D
    Accumulate,
}

/// 引擎选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    #[serde(default)]
    pub parse_mode: ParseMode,

    #[serde(default)]
    pub duplicates: DuplicatePolicy,

    #[serde(default)]
    pub seeding: SeedPolicy,

    /// 随机种子，`None` 表示使用系统熵
    #[serde(default)]
    pub seed: Option<u64>,

    /// 卡牌文件扩展名（不含点）
    #[serde(default = "default_card_extension")]
    pub card_extension: String,
}

fn default_card_extension() -> String {
    "dec".to_string()
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            parse_mode: ParseMode::default(),
            duplicates: DuplicatePolicy::default(),
            seeding: SeedPolicy::default(),
            seed: None,
            card_extension: default_card_extension(),
        }
    }
}

impl EngineOptions {
    /// 使用固定种子
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 严格解析
    pub fn strict(mut self) -> Self {
        self.parse_mode = ParseMode::Strict;
        self
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn with_seeding(mut self, policy: SeedPolicy) -> Self {
        self.seeding = policy;
        self
    }
}
