//! # Error 模块
//!
//! 定义 pack-runtime 中使用的错误类型。
//!
//! 所有错误都派生 `Clone + PartialEq`，IO 错误只保留路径与消息文本。

use std::path::PathBuf;

use thiserror::Error;

use crate::color::ColorLookupError;

/// 词法错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    /// 无法识别的字符
    #[error("第 {line} 行第 {column} 列：无法识别的字符 '{ch}'")]
    UnexpectedChar {
        line: usize,
        column: usize,
        ch: char,
    },

    /// 字符串缺少结束引号
    #[error("第 {line} 行第 {column} 列：字符串缺少结束引号")]
    UnterminatedString { line: usize, column: usize },

    /// 块注释缺少 `*/`
    #[error("第 {line} 行第 {column} 列：注释缺少结束标记 '*/'")]
    UnterminatedComment { line: usize, column: usize },

    /// 整数字面量溢出
    #[error("第 {line} 行第 {column} 列：整数 '{text}' 超出范围")]
    IntegerOverflow {
        line: usize,
        column: usize,
        text: String,
    },
}

impl LexError {
    /// 错误位置 `(line, column)`
    pub fn position(&self) -> (usize, usize) {
        match self {
            Self::UnexpectedChar { line, column, .. }
            | Self::UnterminatedString { line, column }
            | Self::UnterminatedComment { line, column }
            | Self::IntegerOverflow { line, column, .. } => (*line, *column),
        }
    }
}

/// 解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 严格模式下的词法错误
    #[error("词法错误: {0}")]
    Lex(#[from] LexError),

    /// 意外的 token
    #[error("第 {line} 行第 {column} 列：意外的 {found}，期望 {expected}")]
    UnexpectedToken {
        line: usize,
        column: usize,
        found: String,
        expected: String,
    },

    /// 输入提前结束
    #[error("脚本意外结束，期望 {expected}")]
    UnexpectedEof { expected: String },

    /// 函数或谓词参数个数不符
    #[error("第 {line} 行第 {column} 列：'{name}' 需要 {expected} 个参数，实际 {found} 个")]
    WrongArity {
        line: usize,
        column: usize,
        name: String,
        expected: String,
        found: usize,
    },

    /// 没有任何稀有度块
    #[error("脚本中没有任何稀有度块")]
    NoRarityBlocks,
}

impl ParseError {
    /// 错误位置（如果可定位）
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Self::Lex(e) => Some(e.position()),
            Self::UnexpectedToken { line, column, .. } | Self::WrongArity { line, column, .. } => {
                Some((*line, *column))
            }
            Self::UnexpectedEof { .. } | Self::NoRarityBlocks => None,
        }
    }
}

/// 求值错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// 从空列表中抽取
    #[error("从空列表中抽取")]
    EmptyList,

    /// 变量未定义
    #[error("变量 '{name}' 未定义")]
    UnboundName { name: String },

    /// 查找失败（如 Following 找不到元素）
    #[error("查找失败: {message}")]
    Lookup { message: String },

    /// 类型不匹配
    #[error("类型不匹配: 期望 {expected}，实际 {actual} ({context})")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
        context: String,
    },

    /// 参数个数不符（手工构造的 AST 未经过解析期检查）
    #[error("'{name}' 需要 {expected} 个参数，实际 {found} 个")]
    ArgumentCount {
        name: &'static str,
        expected: String,
        found: usize,
    },

    /// 剩余数量为 0 时仍然 Add
    #[error("稀有度 '{rarity}' 中的卡牌已耗尽: {card}")]
    PoolUnderflow { rarity: String, card: String },

    /// 同一卡包中重复添加（仅 Reject 策略）
    #[error("卡牌已在当前卡包中: {card}")]
    DuplicateInPack { card: String },

    /// Add 的卡牌不属于当前稀有度
    #[error("卡牌不属于稀有度 '{rarity}': {card}")]
    ForeignRecord { rarity: String, card: String },

    /// 颜色查询失败
    #[error("颜色查询失败: {0}")]
    ColorLookup(#[from] ColorLookupError),
}

/// 单个卡包生成失败
///
/// 带上出错语句所在的稀有度块与行号。
#[derive(Error, Debug, Clone, PartialEq)]
#[error("稀有度 '{rarity}' 第 {line} 行：{kind}")]
pub struct PackError {
    /// 稀有度名称
    pub rarity: String,
    /// 出错语句的行号
    pub line: usize,
    /// 具体错误
    #[source]
    pub kind: EvalError,
}

/// 加载错误（全部为致命错误）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// 脚本文件不存在
    #[error("脚本文件不存在: {}", path.display())]
    ScriptNotFound { path: PathBuf },

    /// 稀有度目录不存在
    #[error("稀有度 '{rarity}' 的目录不存在: {}", path.display())]
    RarityDirNotFound { rarity: String, path: PathBuf },

    /// 卡牌文件行数为奇数
    #[error("卡牌文件 {} 的行数为奇数（{lines} 行），无法按两行一张卡解析", path.display())]
    OddLineCount { path: PathBuf, lines: usize },

    /// IO 错误
    #[error("读取 {} 失败: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// 稀有度块没有对应的卡池
    #[error("稀有度 '{rarity}' 没有对应的卡池")]
    MissingPool { rarity: String },

    /// 脚本解析失败
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// pack-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DraftError {
    /// 加载错误
    #[error("加载错误: {0}")]
    Load(#[from] LoadError),

    /// 卡包生成错误
    #[error("卡包生成错误: {0}")]
    Pack(#[from] PackError),
}

/// Result 类型别名
pub type DraftResult<T> = Result<T, DraftError>;
