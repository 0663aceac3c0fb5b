//! # Value 模块
//!
//! 规则脚本求值过程中的值类型。

use std::fmt;

use crate::card::CardRecord;
use crate::error::EvalError;

/// 脚本变量值
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// 整数
    Int(i64),
    /// 字符串
    Str(String),
    /// 布尔值
    Bool(bool),
    /// 单张卡牌
    Card(CardRecord),
    /// 有序列表（卡牌列表、字符串列表等）
    List(Vec<Value>),
    /// 元组（`Zip` 的元素）
    Tuple(Vec<Value>),
}

impl Value {
    /// 由字符串序列构造列表
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::Str(s.into())).collect())
    }

    /// 由卡牌序列构造列表
    pub fn cards<I>(items: I) -> Self
    where
        I: IntoIterator<Item = CardRecord>,
    {
        Self::List(items.into_iter().map(Self::Card).collect())
    }

    /// 类型名（用于错误信息）
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "Int",
            Self::Str(_) => "String",
            Self::Bool(_) => "Bool",
            Self::Card(_) => "Card",
            Self::List(_) => "List",
            Self::Tuple(_) => "Tuple",
        }
    }

    pub fn as_int(&self, context: &str) -> Result<i64, EvalError> {
        match self {
            Self::Int(n) => Ok(*n),
            other => Err(mismatch("Int", other, context)),
        }
    }

    pub fn as_bool(&self, context: &str) -> Result<bool, EvalError> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(mismatch("Bool", other, context)),
        }
    }

    pub fn as_str(&self, context: &str) -> Result<&str, EvalError> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(mismatch("String", other, context)),
        }
    }

    pub fn as_card(&self, context: &str) -> Result<&CardRecord, EvalError> {
        match self {
            Self::Card(card) => Ok(card),
            other => Err(mismatch("Card", other, context)),
        }
    }

    /// 列表或元组的元素
    pub fn as_sequence(&self, context: &str) -> Result<&[Value], EvalError> {
        match self {
            Self::List(items) | Self::Tuple(items) => Ok(items),
            other => Err(mismatch("List", other, context)),
        }
    }

    /// 取出列表或元组的元素
    pub fn into_sequence(self, context: &str) -> Result<Vec<Value>, EvalError> {
        match self {
            Self::List(items) | Self::Tuple(items) => Ok(items),
            other => Err(mismatch("List", &other, context)),
        }
    }

    /// 是否可以被推导式解构为 `X0..Xn`
    pub fn is_compound(&self) -> bool {
        matches!(self, Self::List(_) | Self::Tuple(_))
    }
}

pub(crate) fn mismatch(expected: &'static str, actual: &Value, context: &str) -> EvalError {
    EvalError::TypeMismatch {
        expected,
        actual: actual.type_name().to_string(),
        context: context.to_string(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "'{}'", s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Card(card) => write!(f, "<{}>", card),
            Self::List(items) => {
                write!(f, "[")?;
                join(f, items)?;
                write!(f, "]")
            }
            Self::Tuple(items) => {
                write!(f, "(")?;
                join(f, items)?;
                write!(f, ")")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<CardRecord> for Value {
    fn from(card: CardRecord) -> Self {
        Self::Card(card)
    }
}
