//! # Token 模块

use std::fmt;

use crate::script::registry::{FunctionKind, PropositionKind};

/// Token 类型（值直接内嵌在变体中）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `rares:`（冒号已去掉）
    RarityName(String),
    /// 普通标识符
    Ident(String),
    /// 非负整数
    Integer(i64),
    /// 字符串（引号已去掉）
    Str(String),
    /// 内置函数名
    Function(FunctionKind),
    /// 内置谓词名
    Proposition(PropositionKind),

    Where,
    And,
    Or,
    Not,
    Add,
    Any,
    Repeat,

    /// `=`
    Assign,
    /// `->`
    Extract,
    /// `/>`
    Split,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    LParen,
    RParen,

    /// 输入结束
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RarityName(name) => write!(f, "稀有度名称 '{}:'", name),
            Self::Ident(name) => write!(f, "标识符 '{}'", name),
            Self::Integer(n) => write!(f, "整数 {}", n),
            Self::Str(s) => write!(f, "字符串 '{}'", s),
            Self::Function(kind) => write!(f, "函数 '{}'", kind.name()),
            Self::Proposition(kind) => write!(f, "谓词 '{}'", kind.name()),
            Self::Where => write!(f, "'where'"),
            Self::And => write!(f, "'and'"),
            Self::Or => write!(f, "'or'"),
            Self::Not => write!(f, "'not'"),
            Self::Add => write!(f, "'Add'"),
            Self::Any => write!(f, "'Any'"),
            Self::Repeat => write!(f, "'Repeat'"),
            Self::Assign => write!(f, "'='"),
            Self::Extract => write!(f, "'->'"),
            Self::Split => write!(f, "'/>'"),
            Self::LBracket => write!(f, "'['"),
            Self::RBracket => write!(f, "']'"),
            Self::LBrace => write!(f, "'{{'"),
            Self::RBrace => write!(f, "'}}'"),
            Self::Comma => write!(f, "','"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::Eof => write!(f, "输入结束"),
        }
    }
}

/// 带位置的 token（行列均从 1 开始）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
