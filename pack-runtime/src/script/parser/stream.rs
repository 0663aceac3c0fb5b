//! # Token 流
//!
//! 带一个 `Eof` 哨兵的只读 token 游标。

use crate::error::ParseError;
use crate::script::token::{Token, TokenKind};

pub(super) struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    /// `tokens` 必须以 `Eof` 结尾
    pub(super) fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(TokenKind::Eof, line, column));
        }
        Self { tokens, pos: 0 }
    }

    pub(super) fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    /// 越过末尾时返回 `Eof`
    pub(super) fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    pub(super) fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    /// 前进一个 token（停在 `Eof` 上）
    pub(super) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    /// 消费指定类型的 token，否则报错
    pub(super) fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.at(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    pub(super) fn expect_ident(&mut self) -> Result<String, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("标识符")),
        }
    }

    /// 消费一个整数 token，并转换为 `u32`
    pub(super) fn expect_count(&mut self, what: &str) -> Result<u32, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Integer(n) => match u32::try_from(n) {
                Ok(count) => {
                    self.advance();
                    Ok(count)
                }
                Err(_) => Err(ParseError::UnexpectedToken {
                    line: token.line,
                    column: token.column,
                    found: token.kind.to_string(),
                    expected: format!("{}（不超过 {} 的整数）", what, u32::MAX),
                }),
            },
            _ => Err(self.unexpected(what)),
        }
    }

    /// 以当前 token 构造"意外 token"错误
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        match token.kind {
            TokenKind::Eof => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
            _ => ParseError::UnexpectedToken {
                line: token.line,
                column: token.column,
                found: token.kind.to_string(),
                expected: expected.to_string(),
            },
        }
    }
}
