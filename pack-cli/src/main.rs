//! # Pack CLI
//!
//! 轮抽卡包生成器命令行工具。
//!
//! ## 用法
//!
//! ```bash
//! # 8 名玩家，每人 3 包，输出到 results/
//! pack-cli generate cube/rules.txt 8 3
//! pack-cli generate cube/rules.txt 8 3 out --seed 42 --reject-duplicates
//! pack-cli generate cube/rules.txt 8 3 --config draft.json --color-cache color.json
//!
//! # 只检查脚本
//! pack-cli check cube/rules.txt
//!
//! # 合并每个稀有度目录为完整卡表（rares/ -> rares.dec）
//! pack-cli merge cube
//! ```

mod check;
mod config;
mod generate;
mod merge;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use pack_runtime::{DiagnosticLevel, ParseMode};
use tracing::Level;

use crate::config::{DraftConfig, Overrides};

#[derive(Parser)]
#[command(name = "pack-cli")]
#[command(about = "轮抽卡包生成器 - 按规则脚本从卡池目录生成随机卡包")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 日志详细程度（-v 为 info，-vv 为 debug）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// 生成卡包并分发给玩家
    Generate(GenerateArgs),

    /// 检查规则脚本（语法、静态规则、卡牌目录）
    Check {
        /// 规则脚本路径
        #[arg(required = true)]
        scripts: Vec<PathBuf>,

        /// 卡牌目录根路径（默认：脚本所在目录）
        #[arg(long)]
        cards_root: Option<PathBuf>,

        /// 严格模式：遇到第一个错误即停止
        #[arg(long)]
        strict: bool,
    },

    /// 将每个稀有度目录合并为完整卡表
    Merge {
        /// 卡牌目录（默认：当前目录）
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// 卡牌文件扩展名
        #[arg(long, default_value = "dec")]
        extension: String,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// 规则脚本路径
    script: PathBuf,

    /// 玩家数
    players: usize,

    /// 每名玩家的卡包数
    packs_per_player: usize,

    /// 输出目录（默认：results）
    dest: Option<PathBuf>,

    /// 随机种子，相同种子与输入产生完全相同的结果
    #[arg(long)]
    seed: Option<u64>,

    /// JSON 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 卡牌目录根路径（默认：脚本所在目录）
    #[arg(long)]
    cards_root: Option<PathBuf>,

    /// 严格解析
    #[arg(long)]
    strict: bool,

    /// 同一卡包中重复的卡牌视为错误
    #[arg(long)]
    reject_duplicates: bool,

    /// 多个文件中的同一卡牌累加份数
    #[arg(long)]
    accumulate_duplicates: bool,

    /// 颜色缓存文件
    #[arg(long)]
    color_cache: Option<PathBuf>,
}

impl GenerateArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            seed: self.seed,
            cards_root: self.cards_root.clone(),
            dest: self.dest.clone(),
            color_cache: self.color_cache.clone(),
            strict: self.strict,
            reject_duplicates: self.reject_duplicates,
            accumulate_duplicates: self.accumulate_duplicates,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = real_main(cli.command) {
        eprintln!("❌ {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn real_main(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Generate(args) => run_generate(&args),
        Commands::Check {
            scripts,
            cards_root,
            strict,
        } => run_check(&scripts, cards_root, strict),
        Commands::Merge { dir, extension } => run_merge(&dir, &extension),
    }
}

fn run_generate(args: &GenerateArgs) -> anyhow::Result<()> {
    let config = DraftConfig::load_or_default(args.config.as_deref())?.apply(args.overrides());

    println!(
        "🎲 生成卡包: {} ({} 名玩家 × {} 包)",
        args.script.display(),
        args.players,
        args.packs_per_player
    );
    let summary = generate::generate(&args.script, args.players, args.packs_per_player, &config)?;

    println!();
    println!("✅ 生成完成！");
    println!("   种子: {}", summary.seed);
    println!("   卡包数: {}", summary.packs);
    println!("   卡牌数: {}", summary.cards);
    if summary.diagnostics > 0 {
        println!("   诊断: {} 条（使用 -v 查看）", summary.diagnostics);
    }
    if let Some(backup) = &summary.backup {
        println!("   旧结果: {}", backup.display());
    }
    println!("   输出目录: {}", config.dest.display());
    Ok(())
}

fn run_check(scripts: &[PathBuf], cards_root: Option<PathBuf>, strict: bool) -> anyhow::Result<()> {
    let mode = if strict {
        ParseMode::Strict
    } else {
        ParseMode::Lenient
    };
    let defaults = DraftConfig {
        cards_root,
        ..DraftConfig::default()
    };

    let mut failed = 0;
    let mut errors = 0;
    let mut warnings = 0;
    for script in scripts {
        println!("🔍 检查脚本: {}", script.display());
        let report = check::check_script(
            script,
            &defaults.cards_root_for(script),
            mode,
            &defaults.engine.card_extension,
        )?;

        for diag in report.diagnostics.iter() {
            println!("  {diag}");
        }
        if report.has_errors() {
            failed += 1;
        }
        errors += report.diagnostics.count(DiagnosticLevel::Error);
        warnings += report.diagnostics.count(DiagnosticLevel::Warn);
        if report.parsed {
            println!("  {} 个稀有度块", report.blocks);
        }
    }

    println!();
    println!(
        "检查了 {} 个脚本: {} 个错误, {} 个警告",
        scripts.len(),
        errors,
        warnings
    );
    if failed > 0 {
        anyhow::bail!("{failed} 个脚本未通过检查");
    }
    println!("✅ 检查通过");
    Ok(())
}

fn run_merge(dir: &std::path::Path, extension: &str) -> anyhow::Result<()> {
    println!("📦 合并稀有度目录: {}", dir.display());
    let outcomes = merge::merge_rarities(dir, extension)?;
    for outcome in &outcomes {
        println!(
            "  + {} ({} 个文件) -> {}",
            outcome.rarity,
            outcome.files,
            outcome.output.display()
        );
    }
    println!();
    println!("✅ 合并完成，共 {} 个稀有度", outcomes.len());
    Ok(())
}
