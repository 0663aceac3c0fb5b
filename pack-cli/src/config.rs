//! # Config 模块
//!
//! 卡包生成的运行配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件（`--config draft.json`）
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use pack_runtime::{DuplicatePolicy, EngineOptions, ParseMode, SeedPolicy};
use serde::{Deserialize, Serialize};

/// 轮抽配置
///
/// 引擎选项直接展开在顶层，例如：
///
/// ```json
/// { "seed": 42, "duplicates": "reject", "dest": "out", "color_cache": "color.json" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftConfig {
    #[serde(flatten)]
    pub engine: EngineOptions,

    /// 卡牌目录根路径，未配置时使用脚本所在目录
    #[serde(default)]
    pub cards_root: Option<PathBuf>,

    /// 输出目录
    #[serde(default = "default_dest")]
    pub dest: PathBuf,

    /// 颜色缓存文件，未配置时不查询颜色缓存
    #[serde(default)]
    pub color_cache: Option<PathBuf>,
}

fn default_dest() -> PathBuf {
    PathBuf::from("results")
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            engine: EngineOptions::default(),
            cards_root: None,
            dest: default_dest(),
            color_cache: None,
        }
    }
}

/// 命令行给出的覆盖项，`None`/`false` 表示未指定
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub cards_root: Option<PathBuf>,
    pub dest: Option<PathBuf>,
    pub color_cache: Option<PathBuf>,
    pub strict: bool,
    pub reject_duplicates: bool,
    pub accumulate_duplicates: bool,
}

impl DraftConfig {
    /// 加载配置文件
    ///
    /// 与宿主配置不同，这里的配置文件是显式指定的，读取或解析失败都直接报错。
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("配置文件读取失败: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("配置文件解析失败: {}", path.display()))?;
        Ok(config)
    }

    /// 可选的配置文件，`None` 时使用默认配置
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// 应用命令行覆盖项
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(seed) = overrides.seed {
            self.engine.seed = Some(seed);
        }
        if let Some(root) = overrides.cards_root {
            self.cards_root = Some(root);
        }
        if let Some(dest) = overrides.dest {
            self.dest = dest;
        }
        if let Some(cache) = overrides.color_cache {
            self.color_cache = Some(cache);
        }
        if overrides.strict {
            self.engine.parse_mode = ParseMode::Strict;
        }
        if overrides.reject_duplicates {
            self.engine.duplicates = DuplicatePolicy::Reject;
        }
        if overrides.accumulate_duplicates {
            self.engine.seeding = SeedPolicy::Accumulate;
        }
        self
    }

    /// 脚本对应的卡牌目录根路径
    pub fn cards_root_for(&self, script: &Path) -> PathBuf {
        match &self.cards_root {
            Some(root) => root.clone(),
            None => script
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
        }
    }
}
