//! # 表达式解析器
//!
//! 递归下降解析表达式与谓词。
//!
//! 谓词优先级：`not` 最高（右结合），`and` / `or` 同级左结合，
//! 因此 `not A and B or C` 等价于 `((not A) and B) or C`。

use crate::error::ParseError;
use crate::script::ast::{Expr, Prop};
use crate::script::registry::Arity;
use crate::script::token::{Token, TokenKind};

use super::stream::TokenStream;

/// 解析一个表达式
pub(super) fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let token = stream.peek().clone();
    match token.kind {
        TokenKind::Ident(name) => {
            // 未注册的函数名只会以普通标识符出现
            if stream.peek_nth(1).kind == TokenKind::LParen {
                return Err(ParseError::UnexpectedToken {
                    line: token.line,
                    column: token.column,
                    found: format!("未知函数 '{}'", name),
                    expected: "已注册的函数名".to_string(),
                });
            }
            stream.advance();
            Ok(Expr::Identifier(name))
        }
        TokenKind::Any => {
            stream.advance();
            Ok(Expr::Any)
        }
        TokenKind::Str(s) => {
            stream.advance();
            Ok(Expr::string(s))
        }
        TokenKind::Integer(n) => {
            stream.advance();
            Ok(Expr::int(n))
        }
        TokenKind::Function(function) => {
            stream.advance();
            let args = parse_args(stream)?;
            check_arity(&token, function.name(), function.arity(), args.len())?;
            Ok(Expr::call(function, args))
        }
        TokenKind::LBracket => {
            stream.advance();
            parse_bracketed(stream)
        }
        _ => Err(stream.unexpected("表达式")),
    }
}

/// `[` 之后：列表字面量或推导式
fn parse_bracketed(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let first = parse_expr(stream)?;

    if stream.at(&TokenKind::Where) {
        stream.advance();
        let condition = parse_prop(stream)?;
        stream.expect(TokenKind::RBracket)?;
        return Ok(Expr::comprehension(first, condition));
    }

    let mut items = vec![first];
    while stream.at(&TokenKind::Comma) {
        stream.advance();
        items.push(parse_expr(stream)?);
    }
    if !stream.at(&TokenKind::RBracket) {
        return Err(stream.unexpected("',' 、 ']' 或 'where'"));
    }
    stream.advance();
    Ok(Expr::ListLiteral(items))
}

/// `( expr (, expr)* )`
fn parse_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(TokenKind::LParen)?;
    let mut args = vec![parse_expr(stream)?];
    while stream.at(&TokenKind::Comma) {
        stream.advance();
        args.push(parse_expr(stream)?);
    }
    stream.expect(TokenKind::RParen)?;
    Ok(args)
}

fn check_arity(name_token: &Token, name: &str, arity: Arity, found: usize) -> Result<(), ParseError> {
    if arity.accepts(found) {
        Ok(())
    } else {
        Err(ParseError::WrongArity {
            line: name_token.line,
            column: name_token.column,
            name: name.to_string(),
            expected: arity.to_string(),
            found,
        })
    }
}

/// 解析谓词（`and` / `or` 左结合）
pub(super) fn parse_prop(stream: &mut TokenStream) -> Result<Prop, ParseError> {
    let mut left = parse_prop_unary(stream)?;
    loop {
        match stream.peek().kind {
            TokenKind::And => {
                stream.advance();
                let right = parse_prop_unary(stream)?;
                left = Prop::and(left, right);
            }
            TokenKind::Or => {
                stream.advance();
                let right = parse_prop_unary(stream)?;
                left = Prop::or(left, right);
            }
            _ => return Ok(left),
        }
    }
}

fn parse_prop_unary(stream: &mut TokenStream) -> Result<Prop, ParseError> {
    let token = stream.peek().clone();
    match token.kind {
        TokenKind::Not => {
            stream.advance();
            Ok(Prop::not(parse_prop_unary(stream)?))
        }
        TokenKind::LParen => {
            stream.advance();
            let inner = parse_prop(stream)?;
            stream.expect(TokenKind::RParen)?;
            Ok(Prop::parens(inner))
        }
        TokenKind::Proposition(proposition) => {
            stream.advance();
            let args = parse_args(stream)?;
            check_arity(&token, proposition.name(), proposition.arity(), args.len())?;
            Ok(Prop::call(proposition, args))
        }
        _ => Err(stream.unexpected("谓词")),
    }
}
