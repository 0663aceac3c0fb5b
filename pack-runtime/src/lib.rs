//! # Pack Runtime
//!
//! 轮抽卡包生成器的核心运行时库。
//!
//! ## 架构概述
//!
//! `pack-runtime` 解释一种小型规则语言：按稀有度分块，
//! 用赋值、随机抽取、拆分、重复和带条件的推导式描述"每个卡包放哪些卡"。
//! 每个稀有度有一个有限的卡池（每张卡 D 份），卡包生成会持续扣减库存。
//!
//! ```text
//! 规则脚本 ──► Lexer ──► Parser ──► Script (AST，只解析一次)
//!                                       │
//!         卡牌目录 ──► RarityPool ──────┤
//!                                       ▼
//!                           CompiledRuleSet::generate_pack()
//!                                       │
//!                                       ▼
//!                                     Pack
//! ```
//!
//! ## 核心类型
//!
//! - [`CompiledRuleSet`]：驱动程序使用的入口
//! - [`RarityPool`]：单个稀有度的库存
//! - [`CardRecord`] / [`Pack`]：卡牌记录与卡包
//! - [`Value`] / [`Environment`]：求值期间的值与变量环境
//! - [`ColorLookup`]：颜色查询服务边界
//!
//! ## 使用示例
//!
//! ```ignore
//! use pack_runtime::{CompiledRuleSet, EngineOptions};
//!
//! let mut rules = CompiledRuleSet::load("cube/rules.txt", EngineOptions::default().with_seed(42))?;
//! for _ in 0..players * packs_per_player {
//!     let pack = rules.generate_pack()?;
//!     // 分发 pack...
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`script`]：词法、语法分析与 AST
//! - [`runtime`]：执行引擎
//! - [`pool`]：卡池库存
//! - [`diagnostic`]：诊断与静态检查
//! - [`color`]：颜色查询
//! - [`error`]：错误类型定义

pub mod card;
pub mod color;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod pool;
pub mod rng;
pub mod runtime;
pub mod script;
pub mod value;

use std::path::Path;

// 重导出核心类型
pub use card::{CardRecord, Pack};
pub use color::{
    ColorLookup, ColorLookupError, ColorTag, MemoizedColorLookup, OfflineColorLookup,
    StaticColorLookup,
};
pub use config::{DuplicatePolicy, EngineOptions, ParseMode, SeedPolicy};
pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_rules};
pub use error::{
    DraftError, DraftResult, EvalError, LexError, LoadError, PackError, ParseError,
};
pub use pool::{PoolCheckpoint, RarityPool};
pub use rng::PackRng;
pub use runtime::{CompiledRuleSet, Environment};
pub use script::{FunctionKind, Parser, PropositionKind, Script};
pub use value::Value;

/// 使用默认选项加载规则脚本
pub fn load(script_path: impl AsRef<Path>) -> Result<CompiledRuleSet, LoadError> {
    CompiledRuleSet::load(script_path, EngineOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // 验证所有公共类型都可以正常使用
        let _options = EngineOptions::default().with_seed(1);
        let _pack = Pack::new();
        let _env = Environment::new();
        let _pool = RarityPool::new("rares", 1);
        let _value = Value::strings(["Red"]);
        let _parser = Parser::new();
    }
}
