//! # Check 命令
//!
//! 只检查规则脚本，不生成卡包：
//!
//! - 词法/语法诊断（宽松模式下全部收集）
//! - 静态规则诊断（先读后写、未使用的变量、`Repeat 0` 等）
//! - 每个稀有度块对应的卡牌目录是否存在

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use pack_runtime::{
    Diagnostic, DiagnosticResult, ParseError, ParseMode, Parser, analyze_rules,
};
use walkdir::WalkDir;

/// 单个脚本的检查结果
#[derive(Debug)]
pub struct CheckReport {
    pub script: PathBuf,
    /// 解析是否产生了 AST
    pub parsed: bool,
    pub blocks: usize,
    pub diagnostics: DiagnosticResult,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        !self.parsed || self.diagnostics.has_errors()
    }
}

/// 检查一个脚本
pub fn check_script(
    script: &Path,
    cards_root: &Path,
    mode: ParseMode,
    card_extension: &str,
) -> anyhow::Result<CheckReport> {
    let text = fs::read_to_string(script)
        .with_context(|| format!("读取脚本失败: {}", script.display()))?;
    let script_id = script
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("script");

    let mut parser = Parser::with_mode(mode);
    let parsed = parser.parse(script_id, &text);
    let mut diagnostics = parser.take_diagnostics();

    let ast = match parsed {
        Ok(ast) => ast,
        Err(err) => {
            diagnostics.push(parse_failure(script_id, &err));
            return Ok(CheckReport {
                script: script.to_path_buf(),
                parsed: false,
                blocks: 0,
                diagnostics,
            });
        }
    };

    diagnostics.merge(analyze_rules(&ast));

    for block in &ast.blocks {
        let dir = cards_root.join(&block.name);
        if !dir.is_dir() {
            diagnostics.push(
                Diagnostic::error(
                    script_id,
                    format!("稀有度 '{}' 的卡牌目录不存在", block.name),
                )
                .with_line(block.line)
                .with_detail(dir.display().to_string()),
            );
            continue;
        }
        if !has_card_files(&dir, card_extension)? {
            diagnostics.push(
                Diagnostic::warn(
                    script_id,
                    format!("稀有度 '{}' 的目录中没有 .{card_extension} 文件", block.name),
                )
                .with_line(block.line),
            );
        }
    }

    Ok(CheckReport {
        script: script.to_path_buf(),
        parsed: true,
        blocks: ast.blocks.len(),
        diagnostics,
    })
}

fn parse_failure(script_id: &str, err: &ParseError) -> Diagnostic {
    let diagnostic = Diagnostic::error(script_id, err.to_string());
    match err.position() {
        Some((line, column)) => diagnostic.with_position(line, column),
        None => diagnostic,
    }
}

fn has_card_files(dir: &Path, extension: &str) -> anyhow::Result<bool> {
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("遍历目录失败: {}", dir.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|x| x.to_str()) == Some(extension)
        {
            return Ok(true);
        }
    }
    Ok(false)
}
