//! # Environment 模块
//!
//! 一次卡包生成期间的变量绑定。
//!
//! 作用域是一个栈：最底层是用户变量，推导式为每个元素压入一层，
//! 保存 `X` / `X0..Xn`，元素处理完立即弹出。查找从栈顶向下进行，
//! 因此内层绑定只会遮蔽外层同名变量，不会覆盖它。

use std::collections::HashMap;

use crate::error::EvalError;
use crate::value::Value;

/// 变量环境
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<HashMap<String, Value>>,
}

impl Environment {
    /// 创建只有基础作用域的环境
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// 查找变量，未绑定时返回 `UnboundName`
    pub fn lookup(&self, name: &str) -> Result<&Value, EvalError> {
        self.get(name).ok_or_else(|| EvalError::UnboundName {
            name: name.to_string(),
        })
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 在最内层作用域绑定或覆盖变量
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    /// 从最内层开始删除第一个同名绑定
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.remove(name))
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// 弹出最内层作用域（基础作用域不会被弹出）
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// 当前作用域层数（基础作用域为 1）
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
