//! # Color 模块
//!
//! 颜色查询服务的边界。
//!
//! 真实的查询（按元数据中的 multiverse id 访问网络）不属于本库，
//! 这里只提供：
//!
//! - [`ColorLookup`] trait
//! - [`MemoizedColorLookup`]：以卡牌完整文本为键的磁盘缓存（JSON）
//! - [`OfflineColorLookup`]：缓存未命中时直接失败
//! - [`StaticColorLookup`]：内存表，供测试和嵌入使用

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::card::CardRecord;

/// 颜色标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ColorTag {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl ColorTag {
    /// 全部标签，按 WUBRG + 无色 顺序
    pub const ALL: [ColorTag; 6] = [
        Self::White,
        Self::Blue,
        Self::Black,
        Self::Red,
        Self::Green,
        Self::Colorless,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Blue => "Blue",
            Self::Black => "Black",
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Colorless => "Colorless",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.name() == name)
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 颜色查询错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorLookupError {
    /// 没有可用的颜色信息
    #[error("没有卡牌的颜色信息: {card}")]
    Unavailable { card: String },

    /// 缓存文件读写失败
    #[error("颜色缓存 {} 读写失败: {message}", path.display())]
    Cache { path: PathBuf, message: String },
}

/// 颜色查询服务
pub trait ColorLookup {
    /// 查询卡牌的颜色标签集合
    fn lookup(&mut self, card: &CardRecord) -> Result<BTreeSet<ColorTag>, ColorLookupError>;
}

/// 离线查询：总是失败
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineColorLookup;

impl ColorLookup for OfflineColorLookup {
    fn lookup(&mut self, card: &CardRecord) -> Result<BTreeSet<ColorTag>, ColorLookupError> {
        Err(ColorLookupError::Unavailable {
            card: card.metadata().to_string(),
        })
    }
}

/// 内存表查询
#[derive(Debug, Clone, Default)]
pub struct StaticColorLookup {
    colors: HashMap<CardRecord, BTreeSet<ColorTag>>,
}

impl StaticColorLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一张卡牌的颜色
    pub fn with(mut self, card: CardRecord, tags: impl IntoIterator<Item = ColorTag>) -> Self {
        self.insert(card, tags);
        self
    }

    pub fn insert(&mut self, card: CardRecord, tags: impl IntoIterator<Item = ColorTag>) {
        self.colors.insert(card, tags.into_iter().collect());
    }
}

impl ColorLookup for StaticColorLookup {
    fn lookup(&mut self, card: &CardRecord) -> Result<BTreeSet<ColorTag>, ColorLookupError> {
        self.colors
            .get(card)
            .cloned()
            .ok_or_else(|| ColorLookupError::Unavailable {
                card: card.metadata().to_string(),
            })
    }
}

/// 带磁盘缓存的查询
///
/// 缓存键是卡牌完整文本，未命中时委托给内层查询，
/// 成功后立即写回缓存文件。
#[derive(Debug)]
pub struct MemoizedColorLookup<L> {
    inner: L,
    path: PathBuf,
    cache: BTreeMap<String, BTreeSet<ColorTag>>,
}

impl<L: ColorLookup> MemoizedColorLookup<L> {
    /// 打开缓存文件；文件不存在时从空缓存开始
    pub fn open(path: impl AsRef<Path>, inner: L) -> Result<Self, ColorLookupError> {
        let path = path.as_ref().to_path_buf();
        let cache = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|e| cache_error(&path, e))?;
            serde_json::from_str(&text).map_err(|e| cache_error(&path, e))?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = cache.len(), "颜色缓存已加载");
        Ok(Self { inner, path, cache })
    }

    /// 缓存条目数
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn persist(&self) -> Result<(), ColorLookupError> {
        let json = serde_json::to_string_pretty(&self.cache).map_err(|e| cache_error(&self.path, e))?;
        fs::write(&self.path, json).map_err(|e| cache_error(&self.path, e))
    }
}

impl<L: ColorLookup> ColorLookup for MemoizedColorLookup<L> {
    fn lookup(&mut self, card: &CardRecord) -> Result<BTreeSet<ColorTag>, ColorLookupError> {
        if let Some(tags) = self.cache.get(card.as_str()) {
            return Ok(tags.clone());
        }

        let tags = self.inner.lookup(card)?;
        self.cache.insert(card.as_str().to_string(), tags.clone());
        self.persist()?;
        Ok(tags)
    }
}

fn cache_error(path: &Path, err: impl fmt::Display) -> ColorLookupError {
    ColorLookupError::Cache {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
