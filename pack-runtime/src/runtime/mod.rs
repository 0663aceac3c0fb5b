//! # Runtime 模块
//!
//! 规则执行引擎，负责卡包生成和库存扣减。
//!
//! ## 模块结构
//!
//! - [`engine`]：规则集与卡包生成入口
//! - [`executor`]：语句执行与表达式求值
//! - [`env`]：带作用域栈的变量环境
//! - [`functions`]：内置函数与谓词实现

pub mod engine;
pub mod env;
pub mod executor;
pub mod functions;

pub use engine::CompiledRuleSet;
pub use env::Environment;
pub use executor::{Executor, FILE_NAMES};
