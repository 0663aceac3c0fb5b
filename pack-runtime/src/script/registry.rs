//! # Registry 模块
//!
//! 内置函数与谓词的名称表。
//!
//! 两张表都是封闭枚举，词法分析器的保留字表由它们生成，
//! 因此"未知函数"只可能在解析期以普通标识符的形式出现。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 参数个数约束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// 恰好 n 个
    Exact(usize),
    /// 至少 n 个
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{}", n),
            Self::AtLeast(n) => write!(f, "至少 {}", n),
        }
    }
}

/// 内置函数（值 → 值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    /// `Rotate(list, n)`：循环右移 n 位
    Rotate,
    /// `Following(list, item)`：item 之后的元素，末尾回绕
    Following,
    /// `Zip(list...)`：按最短列表逐元素组成元组
    Zip,
    /// `Concat(list, list)`
    Concat,
    /// `Intersect(list, list)`：去重交集
    Intersect,
    /// `GetColors(card)`：查询颜色
    GetColors,
    /// `GetList(fileKey)`：该文件仍有剩余的卡牌快照
    GetList,
}

impl FunctionKind {
    pub const ALL: [FunctionKind; 7] = [
        Self::Rotate,
        Self::Following,
        Self::Zip,
        Self::Concat,
        Self::Intersect,
        Self::GetColors,
        Self::GetList,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Rotate => "Rotate",
            Self::Following => "Following",
            Self::Zip => "Zip",
            Self::Concat => "Concat",
            Self::Intersect => "Intersect",
            Self::GetColors => "GetColors",
            Self::GetList => "GetList",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Self::Zip => Arity::AtLeast(1),
            Self::GetColors | Self::GetList => Arity::Exact(1),
            Self::Rotate | Self::Following | Self::Concat | Self::Intersect => Arity::Exact(2),
        }
    }
}

/// 内置谓词（→ 布尔）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropositionKind {
    Intersects,
    Subset,
    ContainsAtLeast,
    ContainsExact,
    Contains,
    And,
    Or,
    Not,
    Id,
}

impl PropositionKind {
    pub const ALL: [PropositionKind; 9] = [
        Self::Intersects,
        Self::Subset,
        Self::ContainsAtLeast,
        Self::ContainsExact,
        Self::Contains,
        Self::And,
        Self::Or,
        Self::Not,
        Self::Id,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Intersects => "Intersects",
            Self::Subset => "Subset",
            Self::ContainsAtLeast => "ContainsAtLeast",
            Self::ContainsExact => "ContainsExact",
            Self::Contains => "Contains",
            Self::And => "And",
            Self::Or => "Or",
            Self::Not => "Not",
            Self::Id => "Id",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Self::Intersects | Self::Subset | Self::ContainsAtLeast | Self::ContainsExact => {
                Arity::Exact(2)
            }
            Self::Contains | Self::And | Self::Or => Arity::AtLeast(1),
            Self::Not | Self::Id => Arity::Exact(1),
        }
    }
}
