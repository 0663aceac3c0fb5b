//! # Generate 命令
//!
//! 加载规则脚本，生成 玩家数 × 每人卡包数 个卡包，洗牌后分发给玩家并写出：
//!
//! ```text
//! <dest>/
//!   player-1/
//!     pack-1.dec
//!     pack-2.dec
//!     pool.dec      （该玩家所有卡包的拼接）
//!   player-2/
//!     ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use pack_runtime::{
    CompiledRuleSet, MemoizedColorLookup, OfflineColorLookup, Pack, PackRng,
};
use tracing::{debug, info};

use crate::config::DraftConfig;

/// 分发洗牌使用的派生流编号
const DISTRIBUTE_STREAM: u64 = 1;

/// 一次生成的统计
#[derive(Debug)]
pub struct GenerateSummary {
    pub seed: u64,
    pub packs: usize,
    pub cards: usize,
    /// 被移走的旧输出目录
    pub backup: Option<PathBuf>,
    pub diagnostics: usize,
}

/// 执行 generate 命令
pub fn generate(
    script: &Path,
    players: usize,
    packs_per_player: usize,
    config: &DraftConfig,
) -> anyhow::Result<GenerateSummary> {
    if players == 0 || packs_per_player == 0 {
        bail!("玩家数和每人卡包数都必须大于 0");
    }
    let total = players
        .checked_mul(packs_per_player)
        .context("卡包总数溢出")?;

    let cards_root = config.cards_root_for(script);
    let mut rules = CompiledRuleSet::load_with_root(script, &cards_root, config.engine.clone())
        .with_context(|| format!("加载规则脚本失败: {}", script.display()))?;
    if let Some(cache) = &config.color_cache {
        let colors = MemoizedColorLookup::open(cache, OfflineColorLookup)
            .with_context(|| format!("打开颜色缓存失败: {}", cache.display()))?;
        rules = rules.with_color_lookup(colors);
    }

    let mut packs = Vec::with_capacity(total);
    for index in 1..=total {
        let pack = rules
            .generate_pack()
            .with_context(|| format!("第 {index}/{total} 个卡包生成失败"))?;
        packs.push(pack);
    }
    let cards = packs.iter().map(Pack::len).sum();

    let mut rng = PackRng::new(rules.seed()).derive(DISTRIBUTE_STREAM);
    let hands = distribute(packs, players, packs_per_player, &mut rng);

    // 全部卡包生成成功后才动输出目录
    let backup = backup_existing(&config.dest)?;
    write_players(&config.dest, &hands)?;
    info!(dest = %config.dest.display(), players, packs = total, "卡包已写出");

    Ok(GenerateSummary {
        seed: rules.seed(),
        packs: total,
        cards,
        backup,
        diagnostics: rules.diagnostics().len() + rules.pack_diagnostic_count(),
    })
}

/// 洗牌后依次从末尾取出卡包分给每个玩家
///
/// 调用方保证 `packs.len() == players * packs_per_player`。
pub fn distribute(
    mut packs: Vec<Pack>,
    players: usize,
    packs_per_player: usize,
    rng: &mut PackRng,
) -> Vec<Vec<Pack>> {
    rng.shuffle(&mut packs);
    let mut hands = Vec::with_capacity(players);
    for _ in 0..players {
        let hand: Vec<Pack> = (0..packs_per_player).filter_map(|_| packs.pop()).collect();
        hands.push(hand);
    }
    hands
}

/// 已存在的输出目录移到 `<dest>.bak`，更早的备份会被删除
pub fn backup_existing(dest: &Path) -> anyhow::Result<Option<PathBuf>> {
    if !dest.exists() {
        return Ok(None);
    }

    let mut backup = dest.as_os_str().to_owned();
    backup.push(".bak");
    let backup = PathBuf::from(backup);

    if backup.exists() {
        println!("🗑️  删除旧备份: {}", backup.display());
        fs::remove_dir_all(&backup)
            .with_context(|| format!("删除旧备份失败: {}", backup.display()))?;
    }
    println!("📁 移动 {} -> {}", dest.display(), backup.display());
    fs::rename(dest, &backup)
        .with_context(|| format!("移动输出目录失败: {}", dest.display()))?;
    Ok(Some(backup))
}

/// 写出每个玩家的卡包与合并后的卡池
pub fn write_players(dest: &Path, hands: &[Vec<Pack>]) -> anyhow::Result<()> {
    for (player, hand) in hands.iter().enumerate() {
        let dir = dest.join(format!("player-{}", player + 1));
        fs::create_dir_all(&dir).with_context(|| format!("创建目录失败: {}", dir.display()))?;

        let mut pool = String::new();
        for (index, pack) in hand.iter().enumerate() {
            let text = pack.to_text();
            let path = dir.join(format!("pack-{}.dec", index + 1));
            fs::write(&path, &text).with_context(|| format!("写入失败: {}", path.display()))?;
            debug!(path = %path.display(), cards = pack.len(), "写出卡包");
            pool.push_str(&text);
        }

        let path = dir.join("pool.dec");
        fs::write(&path, pool).with_context(|| format!("写入失败: {}", path.display()))?;
    }
    Ok(())
}
