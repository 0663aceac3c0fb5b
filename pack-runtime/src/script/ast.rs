//! # AST 模块
//!
//! 定义规则脚本的抽象语法树。
//!
//! ## 设计说明
//!
//! AST 由解析器构建一次，之后只读，可以被任意多次求值。
//! 语句、表达式、谓词都是封闭枚举，求值器用穷尽匹配处理。

use serde::{Deserialize, Serialize};

use crate::script::registry::{FunctionKind, PropositionKind};

/// 已解析的脚本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// 脚本标识符（文件名，不含扩展名）
    pub id: String,
    /// 稀有度块，按脚本顺序
    pub blocks: Vec<RarityBlock>,
}

impl Script {
    pub fn new(id: impl Into<String>, blocks: Vec<RarityBlock>) -> Self {
        Self {
            id: id.into(),
            blocks,
        }
    }

    /// 稀有度名称，按脚本顺序（可能重复）
    pub fn rarity_names(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.name.as_str()).collect()
    }

    /// 所有块中语句的总数（含 Repeat 内部）
    pub fn statement_count(&self) -> usize {
        fn count(statements: &[Statement]) -> usize {
            statements
                .iter()
                .map(|s| match &s.kind {
                    StatementKind::Repeat { body, .. } => 1 + count(body),
                    _ => 1,
                })
                .sum()
        }
        self.blocks.iter().map(|b| count(&b.statements)).sum()
    }
}

/// 稀有度块
///
/// 对应 `rares: 2` 头部及其后的语句。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RarityBlock {
    /// 稀有度名称，同时是卡牌目录名
    pub name: String,
    /// 复制因子 D
    pub duplication: u32,
    /// 头部所在行
    pub line: usize,
    pub statements: Vec<Statement>,
}

/// 语句（带行号）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub line: usize,
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(line: usize, kind: StatementKind) -> Self {
        Self { line, kind }
    }
}

/// 语句类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// `id = expr`
    Assign { target: String, value: Expr },

    /// `expr -> id`
    ///
    /// 随机取出一个元素绑定到 `target`。
    Extract { source: Expr, target: String },

    /// `expr /> id1, id2, ...`
    ///
    /// `_` 表示丢弃该位置。
    Split { source: Expr, targets: Vec<String> },

    /// `Add(expr)`
    Add { value: Expr },

    /// `Repeat n { ... }`
    Repeat { count: u32, body: Vec<Statement> },
}

/// 字面量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Str(String),
}

/// 表达式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// 变量引用
    Identifier(String),

    /// 当前稀有度中仍有剩余、且不在当前卡包中的全部卡牌
    Any,

    Literal(Literal),

    /// `[a, b, ...]`
    ListLiteral(Vec<Expr>),

    /// `Function(args...)`
    Call {
        function: FunctionKind,
        args: Vec<Expr>,
    },

    /// `[source where condition]`
    Comprehension {
        source: Box<Expr>,
        condition: Box<Prop>,
    },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    pub fn int(n: i64) -> Self {
        Self::Literal(Literal::Int(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::Literal(Literal::Str(s.into()))
    }

    pub fn call(function: FunctionKind, args: Vec<Expr>) -> Self {
        Self::Call { function, args }
    }

    pub fn comprehension(source: Expr, condition: Prop) -> Self {
        Self::Comprehension {
            source: Box::new(source),
            condition: Box::new(condition),
        }
    }
}

/// 谓词
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Prop {
    /// `Proposition(args...)`
    Call {
        proposition: PropositionKind,
        args: Vec<Expr>,
    },

    Not(Box<Prop>),

    And(Box<Prop>, Box<Prop>),

    Or(Box<Prop>, Box<Prop>),

    /// `( prop )`
    Parenthesized(Box<Prop>),
}

impl Prop {
    pub fn call(proposition: PropositionKind, args: Vec<Expr>) -> Self {
        Self::Call { proposition, args }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Prop) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn and(left: Prop, right: Prop) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Prop, right: Prop) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn parens(inner: Prop) -> Self {
        Self::Parenthesized(Box::new(inner))
    }
}
