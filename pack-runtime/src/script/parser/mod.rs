//! # Parser 模块
//!
//! 规则脚本解析器（手写递归下降）。
//!
//! ## 架构
//!
//! ```text
//! 原始文本 → [Lexer] → Vec<Token> → [BlockParser] → Script
//! ```
//!
//! ## 设计原则
//!
//! - 保留字表随 `Parser` 构造一次，之后每次解析复用
//! - 清晰的错误处理和行列追踪
//! - 宽松模式：尽可能解析有效内容，错误记录为诊断
//! - 严格模式：第一个词法/语法错误即失败，不返回部分 AST
//!
//! ## 模块结构
//!
//! - `stream`: token 游标
//! - `expr_parser`: 表达式与谓词解析
//! - `statement`: 块与语句解析、错误恢复

mod expr_parser;
mod statement;
mod stream;


use crate::config::ParseMode;
use crate::diagnostic::{Diagnostic, DiagnosticResult};
use crate::error::{LexError, ParseError};
use crate::script::ast::Script;
use crate::script::lexer::{KeywordTable, Lexer};

use statement::BlockParser;
use stream::TokenStream;

/// 脚本解析器
pub struct Parser {
    keywords: KeywordTable,
    mode: ParseMode,
    /// 最近一次解析产生的诊断
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    /// 创建新的解析器（宽松模式）
    pub fn new() -> Self {
        Self::with_mode(ParseMode::Lenient)
    }

    pub fn with_mode(mode: ParseMode) -> Self {
        Self {
            keywords: KeywordTable::new(),
            mode,
            diagnostics: Vec::new(),
        }
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// 解析脚本文本
    ///
    /// # 参数
    ///
    /// - `script_id`: 脚本标识符，用于诊断输出
    /// - `text`: 脚本文本内容
    ///
    /// # 返回
    ///
    /// 解析后的 `Script`。宽松模式下跳过的错误可通过 [`Parser::diagnostics`] 获取；
    /// 没有任何稀有度块存活时返回 `ParseError::NoRarityBlocks`。
    pub fn parse(&mut self, script_id: &str, text: &str) -> Result<Script, ParseError> {
        self.diagnostics.clear();

        let output = Lexer::new(&self.keywords, self.mode).tokenize(text)?;
        for err in &output.errors {
            self.diagnostics.push(lex_diagnostic(script_id, err));
        }

        let stream = TokenStream::new(output.tokens);
        let blocks =
            BlockParser::new(stream, self.mode, script_id, &mut self.diagnostics).parse_blocks()?;

        if blocks.is_empty() {
            return Err(ParseError::NoRarityBlocks);
        }
        Ok(Script::new(script_id, blocks))
    }

    /// 获取最近一次解析的诊断
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// 取出最近一次解析的诊断
    pub fn take_diagnostics(&mut self) -> DiagnosticResult {
        std::mem::take(&mut self.diagnostics).into_iter().collect()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// 无法识别的字符只是警告，其余词法错误视为错误
fn lex_diagnostic(script_id: &str, err: &LexError) -> Diagnostic {
    let (line, column) = err.position();
    let diagnostic = match err {
        LexError::UnexpectedChar { .. } => Diagnostic::warn(script_id, err.to_string()),
        _ => Diagnostic::error(script_id, err.to_string()),
    };
    diagnostic.with_position(line, column)
}
