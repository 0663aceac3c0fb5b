//! # Pool 模块
//!
//! 单个稀有度的卡池库存。
//!
//! ## 数据布局
//!
//! - `records` 按首次出现顺序保存不重复的卡牌记录
//! - `remaining` 与 `records` 一一对应，是剩余份数
//! - `files` 按文件名排序保存文件键及其包含的记录下标
//!
//! 库存只会减少。`generate_pack` 失败时通过 [`PoolCheckpoint`] 整体回滚。

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::card::CardRecord;
use crate::config::SeedPolicy;
use crate::error::{EvalError, LoadError};

/// 单个源文件的记录分组
#[derive(Debug, Clone)]
struct FileGroup {
    key: String,
    members: Vec<usize>,
}

/// 稀有度卡池
#[derive(Debug, Clone)]
pub struct RarityPool {
    name: String,
    duplication: u32,
    records: Vec<CardRecord>,
    remaining: Vec<u32>,
    index: HashMap<CardRecord, usize>,
    files: Vec<FileGroup>,
}

/// 库存快照，只包含剩余份数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolCheckpoint {
    remaining: Vec<u32>,
}

impl RarityPool {
    /// 创建空卡池
    pub fn new(name: impl Into<String>, duplication: u32) -> Self {
        Self {
            name: name.into(),
            duplication,
            records: Vec::new(),
            remaining: Vec::new(),
            index: HashMap::new(),
            files: Vec::new(),
        }
    }

    /// 从内存中的 `(文件键, 文件内容)` 构造卡池
    ///
    /// 与 [`RarityPool::load_dir`] 使用相同的解析规则，按给定顺序读取。
    pub fn from_sources<I, K, T>(
        name: impl Into<String>,
        duplication: u32,
        sources: I,
        policy: SeedPolicy,
    ) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = (K, T)>,
        K: AsRef<str>,
        T: AsRef<str>,
    {
        let mut pool = Self::new(name, duplication);
        for (key, text) in sources {
            let key = key.as_ref();
            pool.ingest(key, text.as_ref(), policy)
                .map_err(|lines| LoadError::OddLineCount {
                    path: key.into(),
                    lines,
                })?;
        }
        Ok(pool)
    }

    /// 从稀有度目录加载卡池
    ///
    /// 只读取目录下（不递归）扩展名为 `extension` 的文件，按文件名排序。
    /// 文件键是文件名中第一个 `.` 之前的部分。
    pub fn load_dir(
        name: impl Into<String>,
        duplication: u32,
        dir: &Path,
        extension: &str,
        policy: SeedPolicy,
    ) -> Result<Self, LoadError> {
        let name = name.into();
        if !dir.is_dir() {
            return Err(LoadError::RarityDirNotFound {
                rarity: name,
                path: dir.to_path_buf(),
            });
        }

        let mut pool = Self::new(name, duplication);
        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in entries {
            let entry = entry.map_err(|e| LoadError::Io {
                path: e.path().unwrap_or(dir).to_path_buf(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(extension)
            {
                continue;
            }

            let Some(key) = file_key(path) else {
                continue;
            };
            let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, &e))?;
            pool.ingest(&key, &text, policy)
                .map_err(|lines| LoadError::OddLineCount {
                    path: path.to_path_buf(),
                    lines,
                })?;
        }

        debug!(
            rarity = %pool.name,
            files = pool.files.len(),
            records = pool.records.len(),
            "卡池加载完成"
        );
        Ok(pool)
    }

    /// 解析一个文件的内容
    ///
    /// 行数为奇数时返回 `Err(行数)`，此时卡池不做任何修改。
    fn ingest(&mut self, key: &str, text: &str, policy: SeedPolicy) -> Result<(), usize> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() % 2 != 0 {
            return Err(lines.len());
        }

        let group = match self.files.iter().position(|g| g.key == key) {
            Some(i) => i,
            None => {
                self.files.push(FileGroup {
                    key: key.to_string(),
                    members: Vec::new(),
                });
                self.files.len() - 1
            }
        };

        for pair in lines.chunks_exact(2) {
            let card = CardRecord::new(pair[0], pair[1]);
            let slot = match self.index.get(&card) {
                Some(&slot) => {
                    match policy {
                        SeedPolicy::Overwrite => self.remaining[slot] = self.duplication,
                        // 份数封顶在 u32::MAX
                        SeedPolicy::Accumulate => {
                            self.remaining[slot] =
                                self.remaining[slot].saturating_add(self.duplication);
                        }
                    }
                    slot
                }
                None => {
                    let slot = self.records.len();
                    self.records.push(card.clone());
                    self.remaining.push(self.duplication);
                    self.index.insert(card, slot);
                    slot
                }
            };
            self.files[group].members.push(slot);
        }
        Ok(())
    }

    /// 稀有度名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 复制因子 D
    pub fn duplication(&self) -> u32 {
        self.duplication
    }

    /// 有序的文件键（`FileNames`）
    pub fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|g| g.key.as_str()).collect()
    }

    /// 不重复的卡牌数量
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 卡牌是否属于本卡池
    pub fn contains(&self, card: &CardRecord) -> bool {
        self.index.contains_key(card)
    }

    /// 卡牌剩余份数，不属于本卡池时为 `None`
    pub fn remaining(&self, card: &CardRecord) -> Option<u32> {
        self.index.get(card).map(|&slot| self.remaining[slot])
    }

    /// 所有剩余份数之和
    pub fn total_remaining(&self) -> u64 {
        self.remaining.iter().map(|&n| u64::from(n)).sum()
    }

    /// 剩余份数大于 0 的卡牌，按插入顺序
    pub fn available(&self) -> impl Iterator<Item = &CardRecord> + '_ {
        self.records
            .iter()
            .zip(&self.remaining)
            .filter(|(_, n)| **n > 0)
            .map(|(card, _)| card)
    }

    /// 某个文件中剩余份数大于 0 的卡牌快照
    ///
    /// 未知文件键返回空列表。
    pub fn file_available(&self, key: &str) -> Vec<CardRecord> {
        self.files
            .iter()
            .find(|g| g.key == key)
            .map(|g| {
                g.members
                    .iter()
                    .filter(|&&slot| self.remaining[slot] > 0)
                    .map(|&slot| self.records[slot].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 取走一份卡牌
    ///
    /// 剩余为 0 时返回 `PoolUnderflow`，不会出现负数。
    pub(crate) fn take(&mut self, card: &CardRecord) -> Result<u32, EvalError> {
        let slot = *self
            .index
            .get(card)
            .ok_or_else(|| EvalError::ForeignRecord {
                rarity: self.name.clone(),
                card: card.metadata().to_string(),
            })?;

        let left = &mut self.remaining[slot];
        if *left == 0 {
            return Err(EvalError::PoolUnderflow {
                rarity: self.name.clone(),
                card: card.metadata().to_string(),
            });
        }
        *left -= 1;
        Ok(*left)
    }

    /// 记录当前剩余份数
    pub fn checkpoint(&self) -> PoolCheckpoint {
        PoolCheckpoint {
            remaining: self.remaining.clone(),
        }
    }

    /// 回滚到快照
    pub fn restore(&mut self, checkpoint: PoolCheckpoint) {
        debug_assert_eq!(checkpoint.remaining.len(), self.remaining.len());
        self.remaining = checkpoint.remaining;
    }
}

/// 文件名中第一个 `.` 之前的部分
fn file_key(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let key = name.split('.').next().unwrap_or(name);
    Some(key.to_string())
}
