//! # Merge 命令
//!
//! 为每个稀有度生成完整卡表：`rares/*.dec` 拼接为同级的 `rares.dec`。
//!
//! 只处理名称以 `s` 结尾的直接子目录；没有任何卡牌文件的目录不会产生输出。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;
use walkdir::WalkDir;

/// 一个稀有度目录的合并结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub rarity: String,
    pub output: PathBuf,
    pub files: usize,
}

/// 合并 `root` 下所有稀有度目录
pub fn merge_rarities(root: &Path, extension: &str) -> anyhow::Result<Vec<MergeOutcome>> {
    if !root.is_dir() {
        anyhow::bail!("目录不存在: {}", root.display());
    }

    let mut outcomes = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("遍历目录失败: {}", root.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(rarity) = entry.file_name().to_str() else {
            continue;
        };
        if !rarity.ends_with('s') {
            continue;
        }

        let output = root.join(format!("{rarity}.{extension}"));
        if let Some(files) = merge_one(entry.path(), &output, extension)? {
            outcomes.push(MergeOutcome {
                rarity: rarity.to_string(),
                output,
                files,
            });
        }
    }
    Ok(outcomes)
}

/// 拼接一个目录中的卡牌文件，返回参与合并的文件数
fn merge_one(dir: &Path, output: &Path, extension: &str) -> anyhow::Result<Option<usize>> {
    let mut merged = String::new();
    let mut files = 0;

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("遍历目录失败: {}", dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|x| x.to_str()) != Some(extension)
        {
            continue;
        }

        let text =
            fs::read_to_string(path).with_context(|| format!("读取失败: {}", path.display()))?;
        merged.push_str(&text);
        // 缺少末尾换行时补上，避免两张卡粘在同一行
        if !text.is_empty() && !text.ends_with('\n') {
            merged.push('\n');
        }
        files += 1;
    }

    if merged.is_empty() {
        return Ok(None);
    }
    fs::write(output, merged).with_context(|| format!("写入失败: {}", output.display()))?;
    debug!(output = %output.display(), files, "稀有度卡表已合并");
    Ok(Some(files))
}
