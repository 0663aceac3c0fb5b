//! # 块与语句解析
//!
//! 宽松模式下的错误恢复：记录诊断，丢弃出错位置的 token，
//! 从下一个 token 重新开始解析语句。`Eof`、稀有度名称以及
//! Repeat 内部的 `}` 不会被丢弃，它们负责结束当前的语句序列。

use crate::config::ParseMode;
use crate::diagnostic::Diagnostic;
use crate::error::ParseError;
use crate::script::ast::{RarityBlock, Statement, StatementKind};
use crate::script::token::TokenKind;

use super::expr_parser::parse_expr;
use super::stream::TokenStream;

pub(super) struct BlockParser<'a> {
    stream: TokenStream,
    mode: ParseMode,
    script_id: &'a str,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> BlockParser<'a> {
    pub(super) fn new(
        stream: TokenStream,
        mode: ParseMode,
        script_id: &'a str,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            stream,
            mode,
            script_id,
            diagnostics,
        }
    }

    /// 解析全部稀有度块
    pub(super) fn parse_blocks(&mut self) -> Result<Vec<RarityBlock>, ParseError> {
        let mut blocks = Vec::new();
        loop {
            match self.stream.peek().kind {
                TokenKind::Eof => break,
                TokenKind::RarityName(_) => {
                    if let Some(block) = self.parse_block()? {
                        blocks.push(block);
                    }
                }
                _ => {
                    let err = self.stream.unexpected("稀有度名称");
                    self.recover(err)?;
                    self.stream.advance();
                }
            }
        }
        Ok(blocks)
    }

    /// 解析一个块；宽松模式下被丢弃的块返回 `None`
    fn parse_block(&mut self) -> Result<Option<RarityBlock>, ParseError> {
        let header = self.stream.advance();
        let TokenKind::RarityName(name) = header.kind else {
            return Err(self.stream.unexpected("稀有度名称"));
        };

        let duplication = match self.stream.expect_count("复制因子") {
            Ok(d) => d,
            Err(err) => {
                self.recover(err)?;
                self.skip_to_next_block();
                return Ok(None);
            }
        };

        let statements = self.parse_statements(false)?;
        if statements.is_empty() {
            let err = self.stream.unexpected("语句");
            self.recover(err)?;
            self.diagnostics.push(
                Diagnostic::warn(
                    self.script_id,
                    format!("稀有度块 '{}' 没有有效语句，已丢弃", name),
                )
                .with_position(header.line, header.column),
            );
            return Ok(None);
        }

        Ok(Some(RarityBlock {
            name,
            duplication,
            line: header.line,
            statements,
        }))
    }

    /// 解析语句序列，直到 `Eof`、下一个稀有度名称或（Repeat 内部的）`}`
    fn parse_statements(&mut self, in_repeat: bool) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        loop {
            match self.stream.peek().kind {
                TokenKind::Eof | TokenKind::RarityName(_) => break,
                TokenKind::RBrace if in_repeat => break,
                _ => {}
            }

            match self.parse_statement(in_repeat) {
                Ok(statement) => statements.push(statement),
                Err(err) => {
                    let discard = !matches!(err, ParseError::WrongArity { .. });
                    self.recover(err)?;
                    if discard {
                        self.discard_offending(in_repeat);
                    }
                }
            }
        }
        Ok(statements)
    }

    fn parse_statement(&mut self, in_repeat: bool) -> Result<Statement, ParseError> {
        let start = self.stream.peek().clone();
        let line = start.line;

        let kind = match start.kind {
            TokenKind::Ident(target) if self.stream.peek_nth(1).kind == TokenKind::Assign => {
                self.stream.advance();
                self.stream.advance();
                let value = parse_expr(&mut self.stream)?;
                StatementKind::Assign { target, value }
            }
            TokenKind::Add => {
                self.stream.advance();
                self.stream.expect(TokenKind::LParen)?;
                let value = parse_expr(&mut self.stream)?;
                self.stream.expect(TokenKind::RParen)?;
                StatementKind::Add { value }
            }
            TokenKind::Repeat => {
                self.stream.advance();
                let count = self.stream.expect_count("重复次数")?;
                self.stream.expect(TokenKind::LBrace)?;
                let body = self.parse_statements(true)?;
                if body.is_empty() {
                    return Err(self.stream.unexpected("语句"));
                }
                self.stream.expect(TokenKind::RBrace)?;
                StatementKind::Repeat { count, body }
            }
            TokenKind::RBrace if !in_repeat => return Err(self.stream.unexpected("语句")),
            _ => {
                let source = parse_expr(&mut self.stream)?;
                match self.stream.peek().kind {
                    TokenKind::Extract => {
                        self.stream.advance();
                        let target = self.stream.expect_ident()?;
                        StatementKind::Extract { source, target }
                    }
                    TokenKind::Split => {
                        self.stream.advance();
                        let mut targets = vec![self.stream.expect_ident()?];
                        while self.stream.at(&TokenKind::Comma) {
                            self.stream.advance();
                            targets.push(self.stream.expect_ident()?);
                        }
                        StatementKind::Split { source, targets }
                    }
                    _ => return Err(self.stream.unexpected("'->' 或 '/>'")),
                }
            }
        };

        Ok(Statement::new(line, kind))
    }

    /// 严格模式直接返回错误；宽松模式记录为诊断
    fn recover(&mut self, err: ParseError) -> Result<(), ParseError> {
        match self.mode {
            ParseMode::Strict => Err(err),
            ParseMode::Lenient => {
                let mut diagnostic = Diagnostic::error(self.script_id, err.to_string());
                if let Some((line, column)) = err.position() {
                    diagnostic = diagnostic.with_position(line, column);
                }
                self.diagnostics.push(diagnostic);
                Ok(())
            }
        }
    }

    fn discard_offending(&mut self, in_repeat: bool) {
        match self.stream.peek().kind {
            TokenKind::Eof | TokenKind::RarityName(_) => {}
            TokenKind::RBrace if in_repeat => {}
            _ => {
                self.stream.advance();
            }
        }
    }

    fn skip_to_next_block(&mut self) {
        while !matches!(
            self.stream.peek().kind,
            TokenKind::Eof | TokenKind::RarityName(_)
        ) {
            self.stream.advance();
        }
    }
}
