//! # Lexer 模块
//!
//! 规则脚本的词法分析器（手写扫描，无 regex 依赖）。
//!
//! - 空格、制表符、`\r` 忽略，换行只用于行号
//! - `/* ... */` 块注释可跨行
//! - 宽松模式下无法识别的字符记录后跳过；严格模式直接失败

use std::collections::HashMap;

use crate::config::ParseMode;
use crate::error::LexError;
use crate::script::registry::{FunctionKind, PropositionKind};
use crate::script::token::{Token, TokenKind};

/// 保留字表
///
/// 固定关键字加上全部内置函数与谓词名，构造一次后可重复使用。
#[derive(Debug, Clone)]
pub struct KeywordTable {
    words: HashMap<&'static str, TokenKind>,
}

impl KeywordTable {
    pub fn new() -> Self {
        let mut words = HashMap::new();
        words.insert("where", TokenKind::Where);
        words.insert("and", TokenKind::And);
        words.insert("or", TokenKind::Or);
        words.insert("not", TokenKind::Not);
        words.insert("Add", TokenKind::Add);
        words.insert("Any", TokenKind::Any);
        words.insert("Repeat", TokenKind::Repeat);
        for function in FunctionKind::ALL {
            words.insert(function.name(), TokenKind::Function(function));
        }
        for proposition in PropositionKind::ALL {
            words.insert(proposition.name(), TokenKind::Proposition(proposition));
        }
        Self { words }
    }

    /// 查找保留字
    pub fn get(&self, word: &str) -> Option<&TokenKind> {
        self.words.get(word)
    }

    pub fn is_reserved(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new()
    }
}

/// 词法分析结果
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    /// token 序列，总是以 `Eof` 结尾
    pub tokens: Vec<Token>,
    /// 宽松模式下跳过的错误
    pub errors: Vec<LexError>,
}

/// 词法分析器
pub struct Lexer<'k> {
    keywords: &'k KeywordTable,
    mode: ParseMode,
}

impl<'k> Lexer<'k> {
    pub fn new(keywords: &'k KeywordTable, mode: ParseMode) -> Self {
        Self { keywords, mode }
    }

    /// 扫描整段文本
    pub fn tokenize(&self, text: &str) -> Result<LexOutput, LexError> {
        let mut cursor = Cursor::new(text);
        let mut output = LexOutput::default();

        loop {
            match self.next_token(&mut cursor) {
                Ok(Some(token)) => {
                    let done = token.kind == TokenKind::Eof;
                    output.tokens.push(token);
                    if done {
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => match self.mode {
                    ParseMode::Strict => return Err(err),
                    ParseMode::Lenient => output.errors.push(err),
                },
            }
        }

        Ok(output)
    }

    /// 读取下一个 token；跳过空白与注释时返回 `Ok(None)`
    fn next_token(&self, cursor: &mut Cursor) -> Result<Option<Token>, LexError> {
        let (line, column) = cursor.position();
        let Some(c) = cursor.peek() else {
            return Ok(Some(Token::new(TokenKind::Eof, line, column)));
        };

        let simple = |kind| Ok(Some(Token::new(kind, line, column)));

        match c {
            ' ' | '\t' | '\r' | '\n' => {
                cursor.bump();
                Ok(None)
            }
            '/' if cursor.peek_nth(1) == Some('*') => {
                cursor.bump();
                cursor.bump();
                loop {
                    match cursor.bump() {
                        Some('*') if cursor.peek() == Some('/') => {
                            cursor.bump();
                            return Ok(None);
                        }
                        Some(_) => {}
                        None => return Err(LexError::UnterminatedComment { line, column }),
                    }
                }
            }
            '/' if cursor.peek_nth(1) == Some('>') => {
                cursor.bump();
                cursor.bump();
                simple(TokenKind::Split)
            }
            '-' if cursor.peek_nth(1) == Some('>') => {
                cursor.bump();
                cursor.bump();
                simple(TokenKind::Extract)
            }
            '=' | '[' | ']' | '{' | '}' | ',' | '(' | ')' => {
                cursor.bump();
                let kind = match c {
                    '=' => TokenKind::Assign,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    ',' => TokenKind::Comma,
                    '(' => TokenKind::LParen,
                    _ => TokenKind::RParen,
                };
                simple(kind)
            }
            '"' | '\'' => {
                cursor.bump();
                let mut value = String::new();
                loop {
                    match cursor.bump() {
                        Some(ch) if ch == c => return simple(TokenKind::Str(value)),
                        Some(ch) => value.push(ch),
                        None => return Err(LexError::UnterminatedString { line, column }),
                    }
                }
            }
            c if c.is_ascii_digit() => {
                let digits = cursor.take_while(|ch| ch.is_ascii_digit());
                match digits.parse::<i64>() {
                    Ok(n) => simple(TokenKind::Integer(n)),
                    Err(_) => Err(LexError::IntegerOverflow {
                        line,
                        column,
                        text: digits,
                    }),
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let word = cursor.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
                if cursor.peek() == Some(':') {
                    cursor.bump();
                    return simple(TokenKind::RarityName(word));
                }
                let kind = match self.keywords.get(&word) {
                    Some(kind) => kind.clone(),
                    None => TokenKind::Ident(word),
                };
                simple(kind)
            }
            other => {
                cursor.bump();
                Err(LexError::UnexpectedChar {
                    line,
                    column,
                    ch: other,
                })
            }
        }
    }
}

/// 带行列追踪的字符游标
struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        let keywords = KeywordTable::new();
        Lexer::new(&keywords, ParseMode::Lenient)
            .tokenize(text)
            .unwrap()
            .tokens
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keyword_table_includes_registries() {
        let table = KeywordTable::new();
        assert_eq!(table.len(), 7 + FunctionKind::ALL.len() + PropositionKind::ALL.len());
        assert_eq!(
            table.get("Rotate"),
            Some(&TokenKind::Function(FunctionKind::Rotate))
        );
        assert_eq!(
            table.get("ContainsExact"),
            Some(&TokenKind::Proposition(PropositionKind::ContainsExact))
        );
        assert!(!table.is_reserved("rotate"));
    }

    #[test]
    fn test_rarity_header() {
        assert_eq!(
            kinds("rares: 3"),
            vec![
                TokenKind::RarityName("rares".to_string()),
                TokenKind::Integer(3),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_punctuation_and_operators() {
        assert_eq!(
            kinds("x = [a, b] -> y /> p, _ { } ( )"),
            vec![
                TokenKind::Ident("x".to_string()),
                TokenKind::Assign,
                TokenKind::LBracket,
                TokenKind::Ident("a".to_string()),
                TokenKind::Comma,
                TokenKind::Ident("b".to_string()),
                TokenKind::RBracket,
                TokenKind::Extract,
                TokenKind::Ident("y".to_string()),
                TokenKind::Split,
                TokenKind::Ident("p".to_string()),
                TokenKind::Comma,
                TokenKind::Ident("_".to_string()),
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_strip_quotes() {
        assert_eq!(
            kinds(r#"'Red' "Blue""#),
            vec![
                TokenKind::Str("Red".to_string()),
                TokenKind::Str("Blue".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_keywords_and_calls() {
        assert_eq!(
            kinds("[Any where not Intersects(GetColors(X), ['Red'])]")[..6],
            [
                TokenKind::LBracket,
                TokenKind::Any,
                TokenKind::Where,
                TokenKind::Not,
                TokenKind::Proposition(PropositionKind::Intersects),
                TokenKind::LParen,
            ]
        );
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let keywords = KeywordTable::new();
        let output = Lexer::new(&keywords, ParseMode::Lenient)
            .tokenize("/* first\n second */ x")
            .unwrap();
        assert_eq!(output.tokens[0].kind, TokenKind::Ident("x".to_string()));
        assert_eq!((output.tokens[0].line, output.tokens[0].column), (2, 12));
    }

    #[test]
    fn test_line_and_column_tracking() {
        let keywords = KeywordTable::new();
        let output = Lexer::new(&keywords, ParseMode::Lenient)
            .tokenize("rares: 1\n  Add(x)")
            .unwrap();
        let add = &output.tokens[2];
        assert_eq!(add.kind, TokenKind::Add);
        assert_eq!((add.line, add.column), (2, 3));
    }

    #[test]
    fn test_lenient_skips_unknown_characters() {
        let keywords = KeywordTable::new();
        let output = Lexer::new(&keywords, ParseMode::Lenient)
            .tokenize("a # b")
            .unwrap();
        assert_eq!(output.tokens.len(), 3);
        assert_eq!(
            output.errors,
            vec![LexError::UnexpectedChar {
                line: 1,
                column: 3,
                ch: '#'
            }]
        );
    }

    #[test]
    fn test_strict_fails_on_unknown_character() {
        let keywords = KeywordTable::new();
        let err = Lexer::new(&keywords, ParseMode::Strict)
            .tokenize("a - b")
            .unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedChar {
                line: 1,
                column: 3,
                ch: '-'
            }
        );
    }

    #[test]
    fn test_unterminated_string_and_comment() {
        let keywords = KeywordTable::new();
        let lexer = Lexer::new(&keywords, ParseMode::Strict);
        assert!(matches!(
            lexer.tokenize("x = 'Red"),
            Err(LexError::UnterminatedString { line: 1, column: 5 })
        ));
        assert!(matches!(
            lexer.tokenize("/* never closed"),
            Err(LexError::UnterminatedComment { line: 1, column: 1 })
        ));
    }

    #[test]
    fn test_integer_overflow() {
        let keywords = KeywordTable::new();
        let lexer = Lexer::new(&keywords, ParseMode::Strict);
        assert!(matches!(
            lexer.tokenize("99999999999999999999999"),
            Err(LexError::IntegerOverflow { .. })
        ));
    }
}
