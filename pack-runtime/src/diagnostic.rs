//! # 诊断模块
//!
//! 提供规则脚本的诊断类型和静态检查 API，不依赖 IO。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 复用 parser/AST，不重复解析逻辑
//!
//! 宽松模式下的词法/语法错误、求值过程中的非致命异常（如拆分元素不足）
//! 也以 [`Diagnostic`] 的形式收集。

use std::collections::{HashMap, HashSet};

use crate::script::{Expr, Prop, Script, Statement, StatementKind};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 脚本 ID
    pub script_id: String,
    /// 行号（如果可定位，从 1 开始）
    pub line: Option<usize>,
    /// 列号（如果可定位，从 1 开始）
    pub column: Option<usize>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选）
    pub detail: Option<String>,
}

impl Diagnostic {
    fn with_level(
        level: DiagnosticLevel,
        script_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            script_id: script_id.into(),
            line: None,
            column: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 创建错误诊断
    pub fn error(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, script_id, message)
    }

    /// 创建警告诊断
    pub fn warn(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, script_id, message)
    }

    /// 创建信息诊断
    pub fn info(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, script_id, message)
    }

    /// 设置行号
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// 设置行列
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.script_id)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(column) = self.column {
                write!(f, ":{}", column)?;
            }
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 一组诊断，按产生顺序保存
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    items: Vec<Diagnostic>,
}

impl DiagnosticResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// 追加另一组诊断（解析诊断 + 规则诊断）
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.items.extend(other.items);
    }

    /// 指定级别的条数
    pub fn count(&self, level: DiagnosticLevel) -> usize {
        self.at_level(level).count()
    }

    /// 恰好为指定级别的诊断
    pub fn at_level(&self, level: DiagnosticLevel) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.items.iter().filter(move |d| d.level == level)
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.level == DiagnosticLevel::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }
}

impl FromIterator<Diagnostic> for DiagnosticResult {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

//=============================================================================
// 规则静态分析 API
//=============================================================================

/// 每个稀有度块开始时由引擎绑定的名称
const BLOCK_BINDINGS: [&str; 1] = ["FileNames"];

/// 分析规则脚本，返回诊断结果
///
/// 执行以下检查：
/// - 变量在赋值前被读取（按一次卡包生成的执行顺序，跨块累积）
/// - `Repeat 0`
/// - 抽取/拆分/赋值的目标从未被读取
/// - 重复的稀有度名称（各自独立建池）
pub fn analyze_rules(script: &Script) -> DiagnosticResult {
    let mut walker = RuleWalker {
        script_id: &script.id,
        bound: BLOCK_BINDINGS.iter().map(|s| s.to_string()).collect(),
        reads: HashSet::new(),
        targets: Vec::new(),
        result: DiagnosticResult::new(),
    };

    let mut seen_names: HashMap<&str, usize> = HashMap::new();
    for block in &script.blocks {
        if let Some(first_line) = seen_names.insert(block.name.as_str(), block.line) {
            walker.result.push(
                Diagnostic::warn(
                    &script.id,
                    format!("稀有度 '{}' 重复定义，两个块使用各自独立的库存", block.name),
                )
                .with_line(block.line)
                .with_detail(format!("首次定义在第 {} 行", first_line)),
            );
        }
        walker.walk_statements(&block.statements);
    }

    let RuleWalker {
        script_id,
        reads,
        targets,
        mut result,
        ..
    } = walker;

    for (name, line) in targets {
        if !reads.contains(&name) {
            result.push(
                Diagnostic::info(script_id, format!("变量 '{}' 赋值后从未被读取", name))
                    .with_line(line),
            );
        }
    }

    result
}

struct RuleWalker<'a> {
    script_id: &'a str,
    bound: HashSet<String>,
    reads: HashSet<String>,
    targets: Vec<(String, usize)>,
    result: DiagnosticResult,
}

impl RuleWalker<'_> {
    fn walk_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.walk_statement(statement);
        }
    }

    fn walk_statement(&mut self, statement: &Statement) {
        let line = statement.line;
        match &statement.kind {
            StatementKind::Assign { target, value } => {
                self.walk_expr(value, line, false);
                self.bind(target, line);
            }
            StatementKind::Extract { source, target } => {
                self.walk_expr(source, line, false);
                self.bind(target, line);
            }
            StatementKind::Split { source, targets } => {
                self.walk_expr(source, line, false);
                for target in targets {
                    if target != "_" {
                        self.bind(target, line);
                    }
                }
            }
            StatementKind::Add { value } => self.walk_expr(value, line, false),
            StatementKind::Repeat { count, body } => {
                if *count == 0 {
                    self.result.push(
                        Diagnostic::info(self.script_id, "Repeat 0 的循环体永远不会执行")
                            .with_line(line),
                    );
                }
                self.walk_statements(body);
            }
        }
    }

    fn bind(&mut self, name: &str, line: usize) {
        self.bound.insert(name.to_string());
        if !self.targets.iter().any(|(n, _)| n == name) {
            self.targets.push((name.to_string(), line));
        }
    }

    /// `in_comprehension` 为真时 `X`、`X0..Xn` 视为已绑定
    fn walk_expr(&mut self, expr: &Expr, line: usize, in_comprehension: bool) {
        match expr {
            Expr::Identifier(name) => {
                self.reads.insert(name.clone());
                let synthetic = in_comprehension && is_comprehension_binding(name);
                if !synthetic && !self.bound.contains(name) {
                    self.result.push(
                        Diagnostic::warn(self.script_id, format!("变量 '{}' 可能在赋值前被读取", name))
                            .with_line(line),
                    );
                }
            }
            Expr::Any | Expr::Literal(_) => {}
            Expr::ListLiteral(items) => {
                for item in items {
                    self.walk_expr(item, line, in_comprehension);
                }
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    self.walk_expr(arg, line, in_comprehension);
                }
            }
            Expr::Comprehension { source, condition } => {
                self.walk_expr(source, line, in_comprehension);
                self.walk_prop(condition, line);
            }
        }
    }

    fn walk_prop(&mut self, prop: &Prop, line: usize) {
        match prop {
            Prop::Call { args, .. } => {
                for arg in args {
                    self.walk_expr(arg, line, true);
                }
            }
            Prop::Not(inner) | Prop::Parenthesized(inner) => self.walk_prop(inner, line),
            Prop::And(left, right) | Prop::Or(left, right) => {
                self.walk_prop(left, line);
                self.walk_prop(right, line);
            }
        }
    }
}

/// `X` 或 `X0`、`X1`...
pub(crate) fn is_comprehension_binding(name: &str) -> bool {
    match name.strip_prefix('X') {
        Some("") => true,
        Some(rest) => rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Parser;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("rules", "意外的 ']'")
            .with_position(10, 4)
            .with_detail("x = [Any");

        let display = format!("{}", diag);
        assert!(display.contains("[ERROR]"));
        assert!(display.contains("rules:10:4"));
        assert!(display.contains("意外的"));
        assert!(display.contains("  | x = [Any"));
    }

    #[test]
    fn test_diagnostic_result_counts() {
        let mut result: DiagnosticResult = [
            Diagnostic::warn("test", "拆分元素不足"),
            Diagnostic::info("test", "Repeat 0"),
        ]
        .into_iter()
        .collect();
        assert!(!result.has_errors());

        result.push(Diagnostic::error("test", "意外的 token"));
        assert!(result.has_errors());
        assert_eq!(result.count(DiagnosticLevel::Error), 1);
        assert_eq!(result.count(DiagnosticLevel::Warn), 1);
        assert_eq!(result.count(DiagnosticLevel::Info), 1);
        assert_eq!(
            result.at_level(DiagnosticLevel::Info).next().unwrap().message,
            "Repeat 0"
        );
    }

    #[test]
    fn test_analyze_clean_rules() {
        let mut parser = Parser::new();
        let text = r#"
rares: 1
    pool = [Any where ContainsAtLeast(GetColors(X), 1)]
    pool -> card
    Add(card)
"#;
        let script = parser.parse("rules", text).unwrap();
        let result = analyze_rules(&script);
        assert!(result.is_empty(), "{result:?}");
    }

    #[test]
    fn test_analyze_read_before_assignment() {
        let mut parser = Parser::new();
        let text = r#"
rares: 1
    Add(card)
    Any -> card
"#;
        let script = parser.parse("rules", text).unwrap();
        let result = analyze_rules(&script);

        assert_eq!(result.count(DiagnosticLevel::Warn), 1);
        let diag = result.iter().next().unwrap();
        assert!(diag.message.contains("card"));
        assert_eq!(diag.line, Some(3));
    }

    #[test]
    fn test_analyze_bindings_carry_across_blocks() {
        let mut parser = Parser::new();
        let text = r#"
rares: 1
    colors = ['Red']
    Any -> r
    Add(r)
commons: 2
    [Any where Intersects(GetColors(X), colors)] -> c
    Add(c)
"#;
        let script = parser.parse("rules", text).unwrap();
        let result = analyze_rules(&script);
        assert_eq!(result.count(DiagnosticLevel::Warn), 0);
    }

    #[test]
    fn test_analyze_unused_target_and_repeat_zero() {
        let mut parser = Parser::new();
        let text = r#"
rares: 1
    Any /> a, _, b
    Add(a)
    Repeat 0 {
        Add(a)
    }
"#;
        let script = parser.parse("rules", text).unwrap();
        let result = analyze_rules(&script);

        let infos = result
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Info)
            .map(|d| d.message.clone())
            .collect::<Vec<_>>();
        assert_eq!(infos.len(), 2);
        assert!(infos.iter().any(|m| m.contains("Repeat 0")));
        assert!(infos.iter().any(|m| m.contains("'b'")));
    }

    #[test]
    fn test_analyze_duplicate_rarity() {
        let mut parser = Parser::new();
        let text = "rares: 1\n Any -> a\n Add(a)\nrares: 1\n Any -> b\n Add(b)\n";
        let script = parser.parse("rules", text).unwrap();
        let result = analyze_rules(&script);

        assert_eq!(result.count(DiagnosticLevel::Warn), 1);
        assert_eq!(result.iter().next().unwrap().line, Some(4));
    }

    #[test]
    fn test_comprehension_binding_names() {
        assert!(is_comprehension_binding("X"));
        assert!(is_comprehension_binding("X0"));
        assert!(is_comprehension_binding("X12"));
        assert!(!is_comprehension_binding("Xa"));
        assert!(!is_comprehension_binding("card"));
    }
}
