//! # Engine 模块
//!
//! 规则集执行引擎，驱动程序只与这里打交道。
//!
//! ## 执行模型
//!
//! ```text
//! load(script) -> CompiledRuleSet
//! generate_pack() -> Pack   （重复 玩家数 × 每人卡包数 次）
//! ```
//!
//! 1. 为每个卡池记录快照
//! 2. 创建新的 Environment，按脚本顺序执行每个稀有度块
//! 3. 成功则返回卡包；失败则回滚所有卡池后返回错误
//!
//! 卡池在多次 `generate_pack` 之间持续扣减，`&mut self` 保证调用是串行的。

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::card::Pack;
use crate::color::{ColorLookup, OfflineColorLookup};
use crate::config::EngineOptions;
use crate::diagnostic::DiagnosticResult;
use crate::error::{LoadError, PackError};
use crate::pool::RarityPool;
use crate::rng::PackRng;
use crate::runtime::env::Environment;
use crate::runtime::executor::Executor;
use crate::script::{Parser, Script};

/// 已编译的规则集
///
/// 持有解析后的脚本、每个稀有度块对应的卡池、随机数源和颜色查询服务。
pub struct CompiledRuleSet {
    script: Script,
    /// 与 `script.blocks` 一一对应
    pools: Vec<RarityPool>,
    rng: PackRng,
    colors: Box<dyn ColorLookup>,
    options: EngineOptions,
    /// 加载期（解析）诊断
    diagnostics: DiagnosticResult,
    /// 最近一次 `generate_pack` 的诊断，每次调用前清空
    pack_diagnostics: DiagnosticResult,
    /// 所有卡包累计的诊断条数
    pack_diagnostic_count: usize,
    packs_generated: usize,
}

impl CompiledRuleSet {
    /// 加载脚本，卡牌目录相对于脚本所在目录
    pub fn load(script_path: impl AsRef<Path>, options: EngineOptions) -> Result<Self, LoadError> {
        let script_path = script_path.as_ref();
        let cards_root = script_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        Self::load_with_root(script_path, cards_root, options)
    }

    /// 加载脚本，卡牌目录相对于 `cards_root`
    pub fn load_with_root(
        script_path: impl AsRef<Path>,
        cards_root: impl AsRef<Path>,
        options: EngineOptions,
    ) -> Result<Self, LoadError> {
        let script_path = script_path.as_ref();
        if !script_path.is_file() {
            return Err(LoadError::ScriptNotFound {
                path: script_path.to_path_buf(),
            });
        }
        let text =
            fs::read_to_string(script_path).map_err(|e| LoadError::io(script_path, &e))?;
        let script_id = script_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("script");

        Self::from_source(script_id, &text, cards_root, options)
    }

    /// 从脚本文本加载
    pub fn from_source(
        script_id: &str,
        text: &str,
        cards_root: impl AsRef<Path>,
        options: EngineOptions,
    ) -> Result<Self, LoadError> {
        let cards_root = cards_root.as_ref();
        let mut parser = Parser::with_mode(options.parse_mode);
        let script = parser.parse(script_id, text)?;
        let diagnostics = parser.take_diagnostics();
        for diag in diagnostics.iter() {
            warn!(diagnostic = %diag, "脚本解析诊断");
        }

        let mut pools = Vec::with_capacity(script.blocks.len());
        for block in &script.blocks {
            pools.push(RarityPool::load_dir(
                &block.name,
                block.duplication,
                &cards_root.join(&block.name),
                &options.card_extension,
                options.seeding,
            )?);
        }

        let mut rule_set = Self::from_parts(script, pools, options)?;
        rule_set.diagnostics.merge(diagnostics);
        Ok(rule_set)
    }

    /// 由已解析的脚本和内存中的卡池组装
    ///
    /// 每个稀有度块按顺序认领第一个同名且未被认领的卡池。
    pub fn from_parts(
        script: Script,
        pools: Vec<RarityPool>,
        options: EngineOptions,
    ) -> Result<Self, LoadError> {
        let mut unclaimed: Vec<Option<RarityPool>> = pools.into_iter().map(Some).collect();
        let mut ordered = Vec::with_capacity(script.blocks.len());
        for block in &script.blocks {
            let pool = unclaimed
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|p| p.name() == block.name))
                .and_then(Option::take)
                .ok_or_else(|| LoadError::MissingPool {
                    rarity: block.name.clone(),
                })?;
            ordered.push(pool);
        }

        let rng = match options.seed {
            Some(seed) => PackRng::new(seed),
            None => PackRng::from_entropy(),
        };
        info!(
            script = %script.id,
            blocks = script.blocks.len(),
            seed = rng.seed(),
            "规则集加载完成"
        );

        Ok(Self {
            script,
            pools: ordered,
            rng,
            colors: Box::new(OfflineColorLookup),
            options,
            diagnostics: DiagnosticResult::new(),
            pack_diagnostics: DiagnosticResult::new(),
            pack_diagnostic_count: 0,
            packs_generated: 0,
        })
    }

    /// 替换颜色查询服务
    pub fn with_color_lookup(mut self, colors: impl ColorLookup + 'static) -> Self {
        self.colors = Box::new(colors);
        self
    }

    /// 生成一个卡包
    ///
    /// 失败时所有卡池回滚到调用前的状态。
    pub fn generate_pack(&mut self) -> Result<Pack, PackError> {
        let checkpoints: Vec<_> = self.pools.iter().map(RarityPool::checkpoint).collect();
        self.pack_diagnostics = DiagnosticResult::new();

        let result = self.run_blocks();
        self.pack_diagnostic_count += self.pack_diagnostics.len();
        match result {
            Ok(pack) => {
                self.packs_generated += 1;
                debug!(index = self.packs_generated, cards = pack.len(), "卡包生成完成");
                Ok(pack)
            }
            Err(err) => {
                for (pool, checkpoint) in self.pools.iter_mut().zip(checkpoints) {
                    pool.restore(checkpoint);
                }
                warn!(error = %err, "卡包生成失败，卡池已回滚");
                Err(err)
            }
        }
    }

    fn run_blocks(&mut self) -> Result<Pack, PackError> {
        let mut pack = Pack::new();
        let mut env = Environment::new();

        for (block, pool) in self.script.blocks.iter().zip(self.pools.iter_mut()) {
            let mut executor = Executor {
                pool,
                pack: &mut pack,
                env: &mut env,
                rng: &mut self.rng,
                colors: self.colors.as_mut(),
                duplicates: self.options.duplicates,
                diagnostics: &mut self.pack_diagnostics,
                script_id: &self.script.id,
            };
            executor.run_block(block)?;
        }

        Ok(pack)
    }

    /// 生成 `count` 个卡包，遇到错误立即停止
    pub fn generate_packs(&mut self, count: usize) -> Result<Vec<Pack>, PackError> {
        (0..count).map(|_| self.generate_pack()).collect()
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    /// 卡池，顺序与稀有度块一致
    pub fn pools(&self) -> &[RarityPool] {
        &self.pools
    }

    /// 第一个同名卡池
    pub fn pool(&self, name: &str) -> Option<&RarityPool> {
        self.pools.iter().find(|p| p.name() == name)
    }

    /// 加载期的解析诊断
    pub fn diagnostics(&self) -> &DiagnosticResult {
        &self.diagnostics
    }

    /// 最近一次 `generate_pack` 产生的诊断（失败的卡包也保留）
    pub fn pack_diagnostics(&self) -> &DiagnosticResult {
        &self.pack_diagnostics
    }

    /// 本次运行中所有卡包的诊断总条数
    pub fn pack_diagnostic_count(&self) -> usize {
        self.pack_diagnostic_count
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// 实际使用的种子
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// 已成功生成的卡包数量
    pub fn packs_generated(&self) -> usize {
        self.packs_generated
    }
}

impl std::fmt::Debug for CompiledRuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRuleSet")
            .field("script", &self.script.id)
            .field("pools", &self.pools.len())
            .field("seed", &self.rng.seed())
            .field("packs_generated", &self.packs_generated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedPolicy;
    use crate::diagnostic::DiagnosticLevel;
    use crate::error::{EvalError, ParseError};

    const CARDS: &str = "// mvid:1\n1 Alpha\n// mvid:2\n1 Beta\n";

    fn rule_set(text: &str, duplication: u32) -> CompiledRuleSet {
        let script = Parser::new().parse("test", text).unwrap();
        let pool =
            RarityPool::from_sources("rares", duplication, [("a", CARDS)], SeedPolicy::Overwrite)
                .unwrap();
        CompiledRuleSet::from_parts(script, vec![pool], EngineOptions::default().with_seed(1))
            .unwrap()
    }

    #[test]
    fn test_generate_pack_depletes_pool_across_calls() {
        let mut rules = rule_set("rares: 1\n Any -> r\n Add(r)\n", 1);
        assert_eq!(rules.generate_pack().unwrap().len(), 1);
        assert_eq!(rules.generate_pack().unwrap().len(), 1);
        assert_eq!(rules.pool("rares").unwrap().total_remaining(), 0);

        let err = rules.generate_pack().unwrap_err();
        assert_eq!(err.kind, EvalError::EmptyList);
        assert_eq!(rules.packs_generated(), 2);
    }

    #[test]
    fn test_failed_pack_rolls_back() {
        let mut rules = rule_set("rares: 2\n Any /> a, b\n Add(a)\n Add(b)\n Add(a)\n", 1);
        let err = rules.generate_pack().unwrap_err();
        assert!(matches!(err.kind, EvalError::PoolUnderflow { .. }));
        assert_eq!(err.line, 5);
        assert_eq!(rules.pool("rares").unwrap().total_remaining(), 2);
    }

    #[test]
    fn test_file_names_bound_per_block() {
        let mut rules = rule_set("rares: 2\n FileNames -> f\n GetList(f) -> r\n Add(r)\n", 2);
        let pack = rules.generate_pack().unwrap();
        assert_eq!(pack.len(), 1);
        assert_eq!(rules.pool("rares").unwrap().total_remaining(), 3);
    }

    #[test]
    fn test_pack_diagnostics_reset_per_pack() {
        let mut rules = rule_set("rares: 2
 Any /> a, b, c
 Add(a)
", 2);
        rules.generate_pack().unwrap();
        assert_eq!(rules.pack_diagnostics().count(DiagnosticLevel::Warn), 1);
        rules.generate_pack().unwrap();
        assert_eq!(rules.pack_diagnostics().count(DiagnosticLevel::Warn), 1);
        assert_eq!(rules.pack_diagnostic_count(), 2);
        assert!(rules.diagnostics().is_empty());
    }

    #[test]
    fn test_missing_pool() {
        let script = Parser::new()
            .parse("test", "uncommons: 1\n Any -> u\n Add(u)\n")
            .unwrap();
        let err = CompiledRuleSet::from_parts(script, Vec::new(), EngineOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            LoadError::MissingPool {
                rarity: "uncommons".to_string()
            }
        );
    }

    #[test]
    fn test_from_source_strict_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CompiledRuleSet::from_source(
            "test",
            "rares: 1\n Any -> \n",
            dir.path(),
            EngineOptions::default().strict(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Parse(ParseError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_load_missing_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = CompiledRuleSet::load(&path, EngineOptions::default()).unwrap_err();
        assert_eq!(err, LoadError::ScriptNotFound { path });
    }
}
