//! # Script 模块
//!
//! 规则脚本解析相关功能。
//!
//! ## 模块结构
//!
//! - [`token`]：token 定义
//! - [`registry`]：内置函数与谓词表
//! - [`lexer`]：词法分析器
//! - [`ast`]：抽象语法树定义
//! - [`parser`]：递归下降解析器

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod token;

pub use ast::*;
pub use lexer::{KeywordTable, Lexer};
pub use parser::Parser;
pub use registry::{Arity, FunctionKind, PropositionKind};
pub use token::{Token, TokenKind};
