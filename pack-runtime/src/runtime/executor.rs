//! # Executor 模块
//!
//! 在一个稀有度块上执行语句。
//!
//! ## 职责
//!
//! - 读取 Statement，更新 Environment
//! - `Add` 把卡牌放入卡包，并扣减卡池
//! - 求值表达式与谓词
//!
//! 只有 `Add` 会修改卡池；`->` 只从求值得到的列表中移除元素。

use tracing::{debug, warn};

use crate::card::{CardRecord, Pack};
use crate::color::ColorLookup;
use crate::config::DuplicatePolicy;
use crate::diagnostic::{Diagnostic, DiagnosticResult};
use crate::error::{EvalError, PackError};
use crate::pool::RarityPool;
use crate::rng::PackRng;
use crate::runtime::env::Environment;
use crate::runtime::functions::{call_function, call_proposition};
use crate::script::{Expr, Literal, Prop, RarityBlock, Statement, StatementKind};
use crate::value::{Value, mismatch};

/// 每个块开始时绑定的文件键列表
pub const FILE_NAMES: &str = "FileNames";

/// 语句执行器
///
/// 借用一次卡包生成所需的全部状态，每个稀有度块构造一个。
pub struct Executor<'a> {
    pub pool: &'a mut RarityPool,
    pub pack: &'a mut Pack,
    pub env: &'a mut Environment,
    pub rng: &'a mut PackRng,
    pub colors: &'a mut dyn ColorLookup,
    pub duplicates: DuplicatePolicy,
    pub diagnostics: &'a mut DiagnosticResult,
    pub script_id: &'a str,
}

impl Executor<'_> {
    /// 执行整个稀有度块
    pub fn run_block(&mut self, block: &RarityBlock) -> Result<(), PackError> {
        let file_names = Value::strings(self.pool.file_names());
        self.env.set(FILE_NAMES, file_names);

        self.execute_all(&block.statements)
            .map_err(|(line, kind)| PackError {
                rarity: block.name.clone(),
                line,
                kind,
            })
    }

    /// 顺序执行语句，错误带上最内层语句的行号
    fn execute_all(&mut self, statements: &[Statement]) -> Result<(), (usize, EvalError)> {
        for statement in statements {
            match &statement.kind {
                StatementKind::Repeat { count, body } => {
                    for _ in 0..*count {
                        self.execute_all(body)?;
                    }
                }
                _ => self
                    .execute(statement)
                    .map_err(|err| (statement.line, err))?,
            }
        }
        Ok(())
    }

    /// 执行单条（非 Repeat）语句
    pub fn execute(&mut self, statement: &Statement) -> Result<(), EvalError> {
        match &statement.kind {
            StatementKind::Assign { target, value } => {
                let value = self.eval(value)?;
                self.env.set(target.as_str(), value);
            }

            StatementKind::Extract { source, target } => {
                let items = match self.eval(source)? {
                    Value::List(items) => items,
                    other => return Err(mismatch("List", &other, "->")),
                };
                let (picked, rest) = self.pick(items)?;

                // 源是变量时写回缩短后的列表，Repeat 中不会重复抽到同一元素
                if let Expr::Identifier(name) = source
                    && let Some(slot) = self.env.get_mut(name)
                {
                    *slot = Value::List(rest);
                }
                self.env.set(target.as_str(), picked);
            }

            StatementKind::Split { source, targets } => {
                let items = self.eval(source)?.into_sequence("/>")?;
                if items.len() < targets.len() {
                    warn!(
                        line = statement.line,
                        elements = items.len(),
                        targets = targets.len(),
                        "拆分的元素不足"
                    );
                    self.diagnostics.push(
                        Diagnostic::warn(
                            self.script_id,
                            format!(
                                "拆分的元素不足：{} 个元素，{} 个目标",
                                items.len(),
                                targets.len()
                            ),
                        )
                        .with_line(statement.line),
                    );
                }
                for (item, target) in items.into_iter().zip(targets) {
                    if target != "_" {
                        self.env.set(target.as_str(), item);
                    }
                }
            }

            StatementKind::Add { value } => {
                let card = match self.eval(value)? {
                    Value::Card(card) => card,
                    other => return Err(mismatch("Card", &other, "Add")),
                };
                self.add(card, statement.line)?;
            }

            StatementKind::Repeat { count, body } => {
                for _ in 0..*count {
                    self.execute_all(body).map_err(|(_, err)| err)?;
                }
            }
        }
        Ok(())
    }

    /// 均匀随机取出一个元素
    fn pick(&mut self, mut items: Vec<Value>) -> Result<(Value, Vec<Value>), EvalError> {
        if items.is_empty() {
            return Err(EvalError::EmptyList);
        }
        let index = self.rng.index(items.len());
        let picked = items.remove(index);
        Ok((picked, items))
    }

    /// 扣减卡池并加入卡包（两步一起成功或一起失败）
    fn add(&mut self, card: CardRecord, line: usize) -> Result<(), EvalError> {
        if self.pack.contains(&card) {
            match self.duplicates {
                DuplicatePolicy::Reject => {
                    return Err(EvalError::DuplicateInPack {
                        card: card.metadata().to_string(),
                    });
                }
                DuplicatePolicy::Warn => {
                    warn!(rarity = %self.pool.name(), card = %card, "卡牌重复加入同一卡包");
                    self.diagnostics.push(
                        Diagnostic::warn(
                            self.script_id,
                            format!("卡牌重复加入同一卡包: {}", card),
                        )
                        .with_line(line),
                    );
                }
            }
        }

        let remaining = self.pool.take(&card)?;
        debug!(rarity = %self.pool.name(), card = %card, remaining, "Add");
        self.pack.push(card);
        Ok(())
    }

    /// 求值表达式
    pub fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Identifier(name) => self.env.lookup(name).cloned(),

            Expr::Any => {
                let pack = &*self.pack;
                Ok(Value::cards(
                    self.pool
                        .available()
                        .filter(|card| !pack.contains(card))
                        .cloned(),
                ))
            }

            Expr::Literal(Literal::Int(n)) => Ok(Value::Int(*n)),
            Expr::Literal(Literal::Str(s)) => Ok(Value::Str(s.clone())),

            Expr::ListLiteral(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),

            Expr::Call { function, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                call_function(*function, args, self.pool, &mut *self.colors)
            }

            Expr::Comprehension { source, condition } => {
                let items = self.eval(source)?.into_sequence("where")?;
                let mut kept = Vec::new();
                for item in items {
                    if self.test_element(&item, condition)? {
                        kept.push(item);
                    }
                }
                Ok(Value::List(kept))
            }
        }
    }

    /// 在新作用域中绑定元素并测试谓词
    fn test_element(&mut self, item: &Value, condition: &Prop) -> Result<bool, EvalError> {
        self.env.push_scope();
        match item {
            Value::List(parts) | Value::Tuple(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    self.env.set(format!("X{}", i), part.clone());
                }
            }
            scalar => self.env.set("X", scalar.clone()),
        }
        let result = self.eval_prop(condition);
        self.env.pop_scope();
        result
    }

    /// 求值谓词（`and` / `or` 短路）
    pub fn eval_prop(&mut self, prop: &Prop) -> Result<bool, EvalError> {
        match prop {
            Prop::Call { proposition, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                call_proposition(*proposition, args)
            }
            Prop::Not(inner) => Ok(!self.eval_prop(inner)?),
            Prop::And(left, right) => Ok(self.eval_prop(left)? && self.eval_prop(right)?),
            Prop::Or(left, right) => Ok(self.eval_prop(left)? || self.eval_prop(right)?),
            Prop::Parenthesized(inner) => self.eval_prop(inner),
        }
    }
}
