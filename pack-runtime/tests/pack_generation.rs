//! # 卡包生成集成测试
//!
//! 测试 脚本 → Parser → CompiledRuleSet → Pack 的完整链路，
//! 包括磁盘上的卡牌目录加载。

use std::fs;
use std::path::Path;

use pack_runtime::{
    CardRecord, ColorTag, CompiledRuleSet, DiagnosticLevel, DuplicatePolicy, EngineOptions, EvalError, LoadError,
    MemoizedColorLookup, Pack, Parser, RarityPool, SeedPolicy, StaticColorLookup,
};

/// 生成 `count` 张卡的文件内容，metadata 中带 mvid
fn card_file(prefix: &str, ids: std::ops::Range<u32>) -> String {
    ids.map(|i| format!("// mvid:{i} {prefix}\n1 {prefix} {i}\n"))
        .collect()
}

fn card(prefix: &str, i: u32) -> CardRecord {
    CardRecord::new(&format!("// mvid:{i} {prefix}"), &format!("1 {prefix} {i}"))
}

fn in_memory(text: &str, pools: Vec<RarityPool>, options: EngineOptions) -> CompiledRuleSet {
    let script = Parser::new().parse("test", text).unwrap();
    CompiledRuleSet::from_parts(script, pools, options).unwrap()
}

fn pool(name: &str, duplication: u32, files: &[(&str, String)]) -> RarityPool {
    RarityPool::from_sources(
        name,
        duplication,
        files.iter().map(|(k, v)| (*k, v.as_str())),
        SeedPolicy::Overwrite,
    )
    .unwrap()
}

/// 在临时目录中写出一套规则与卡牌
fn write_cube(root: &Path) -> std::path::PathBuf {
    let rules = r#"
/* 每包：1 张稀有，3 张非普通（每种颜色最多一张），6 张普通 */
rares: 1
    Any -> r
    Add(r)
uncommons: 2
    colors = FileNames
    Repeat 3 {
        colors -> c
        GetList(c) -> u
        Add(u)
    }
commons: 3
    Repeat 6 {
        Any -> c
        Add(c)
    }
"#;
    let script = root.join("rules.txt");
    fs::write(&script, rules).unwrap();

    fs::create_dir_all(root.join("rares")).unwrap();
    fs::write(root.join("rares/all.dec"), card_file("Rare", 0..12)).unwrap();

    fs::create_dir_all(root.join("uncommons")).unwrap();
    for (i, color) in ["white", "blue", "black", "red", "green"].iter().enumerate() {
        let start = i as u32 * 10;
        fs::write(
            root.join(format!("uncommons/{color}.dec")),
            card_file(color, start..start + 6),
        )
        .unwrap();
    }
    // 非卡牌文件被忽略
    fs::write(root.join("uncommons/notes.txt"), "not a card list").unwrap();

    fs::create_dir_all(root.join("commons")).unwrap();
    fs::write(root.join("commons/a.dec"), card_file("Common", 0..20)).unwrap();
    fs::write(root.join("commons/b.dec"), card_file("Common", 20..40)).unwrap();

    script
}

fn pack_texts(packs: &[Pack]) -> Vec<String> {
    packs.iter().map(Pack::to_text).collect()
}

#[test]
fn test_pool_never_goes_negative() {
    let mut rules = in_memory(
        "rares: 2\n x = Any\n x -> a\n Add(a)\n Add(a)\n Add(a)\n",
        vec![pool("rares", 2, &[("a", card_file("Rare", 0..1))])],
        EngineOptions::default().with_seed(3),
    );

    let err = rules.generate_pack().unwrap_err();
    assert!(matches!(err.kind, EvalError::PoolUnderflow { .. }));
    assert_eq!(err.line, 6);
    assert_eq!(
        rules.pool("rares").unwrap().remaining(&card("Rare", 0)),
        Some(2)
    );
}

#[test]
fn test_parse_is_idempotent_under_same_seed() {
    let text = "commons: 2\n Repeat 3 {\n Any -> c\n Add(c)\n }\n";
    let files = [("a", card_file("Common", 0..10))];

    let mut first = in_memory(
        text,
        vec![pool("commons", 2, &files)],
        EngineOptions::default().with_seed(11),
    );
    let mut second = in_memory(
        text,
        vec![pool("commons", 2, &files)],
        EngineOptions::default().with_seed(11),
    );

    let a = first.generate_packs(4).unwrap();
    let b = second.generate_packs(4).unwrap();
    assert_eq!(pack_texts(&a), pack_texts(&b));
}

#[test]
fn test_comprehension_bindings_do_not_leak() {
    let colors = StaticColorLookup::new()
        .with(card("Rare", 0), [ColorTag::Red])
        .with(card("Rare", 1), [ColorTag::Blue]);
    let mut rules = in_memory(
        "rares: 1\n reds = [Any where Intersects(GetColors(X), ['Red'])]\n Add(X)\n",
        vec![pool("rares", 1, &[("a", card_file("Rare", 0..2))])],
        EngineOptions::default().with_seed(1),
    )
    .with_color_lookup(colors);

    let err = rules.generate_pack().unwrap_err();
    assert_eq!(
        err.kind,
        EvalError::UnboundName {
            name: "X".to_string()
        }
    );
    assert_eq!(err.line, 3);
}

#[test]
fn test_comprehension_selects_by_color() {
    let colors = StaticColorLookup::new()
        .with(card("Rare", 0), [ColorTag::Red])
        .with(card("Rare", 1), [ColorTag::Blue])
        .with(card("Rare", 2), [ColorTag::Red, ColorTag::Green]);
    let mut rules = in_memory(
        "rares: 1\n Repeat 2 {\n [Any where Intersects(GetColors(X), ['Red'])] -> r\n Add(r)\n }\n",
        vec![pool("rares", 1, &[("a", card_file("Rare", 0..3))])],
        EngineOptions::default().with_seed(5),
    )
    .with_color_lookup(colors);

    let pack = rules.generate_pack().unwrap();
    assert_eq!(pack.len(), 2);
    assert!(pack.contains(&card("Rare", 0)));
    assert!(pack.contains(&card("Rare", 2)));
}

#[test]
fn test_first_pack_drains_pool_then_empty_list() {
    let mut rules = in_memory(
        "rares: 1\n Repeat 4 {\n Any -> v\n Add(v)\n }\n",
        vec![pool("rares", 1, &[("a", card_file("Rare", 0..4))])],
        EngineOptions::default().with_seed(9),
    );

    let pack = rules.generate_pack().unwrap();
    assert_eq!(pack.len(), 4);
    assert_eq!(rules.pool("rares").unwrap().total_remaining(), 0);

    let err = rules.generate_pack().unwrap_err();
    assert_eq!(err.kind, EvalError::EmptyList);
    assert_eq!(err.line, 3);
}

#[test]
fn test_split_adds_exactly_one() {
    let mut rules = in_memory(
        "rares: 3\n x = Any\n x /> a, b\n Add(a)\n",
        vec![pool("rares", 3, &[("a", card_file("Rare", 0..4))])],
        EngineOptions::default().with_seed(2),
    );

    let pack = rules.generate_pack().unwrap();
    assert_eq!(pack.len(), 1);
    let pool = rules.pool("rares").unwrap();
    // Any 按插入顺序返回，a 是第一张
    assert_eq!(pack.cards()[0], card("Rare", 0));
    assert_eq!(pool.remaining(&card("Rare", 0)), Some(2));
    assert_eq!(pool.remaining(&card("Rare", 1)), Some(3));
    assert_eq!(pool.total_remaining(), 11);
}

#[test]
fn test_end_to_end_determinism() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_cube(dir.path());

    let run = || {
        let mut rules =
            CompiledRuleSet::load(&script, EngineOptions::default().with_seed(20240101)).unwrap();
        rules.generate_packs(8).unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(pack_texts(&first), pack_texts(&second));
    assert!(first.iter().all(|p| p.len() == 10));

    let other =
        CompiledRuleSet::load(&script, EngineOptions::default().with_seed(7)).unwrap()
            .generate_packs(8)
            .unwrap();
    assert_ne!(pack_texts(&first), pack_texts(&other));
}

#[test]
fn test_loaded_pools_follow_directory_layout() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_cube(dir.path());
    let rules = CompiledRuleSet::load(&script, EngineOptions::default().with_seed(1)).unwrap();

    assert_eq!(rules.script().id, "rules");
    let uncommons = rules.pool("uncommons").unwrap();
    assert_eq!(
        uncommons.file_names(),
        vec!["black", "blue", "green", "red", "white"]
    );
    assert_eq!(uncommons.len(), 30);
    assert_eq!(uncommons.total_remaining(), 60);
    assert_eq!(rules.pool("commons").unwrap().total_remaining(), 120);
}

#[test]
fn test_uncommons_come_from_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_cube(dir.path());
    let mut rules = CompiledRuleSet::load(&script, EngineOptions::default().with_seed(4)).unwrap();

    for pack in rules.generate_packs(5).unwrap() {
        let colors: std::collections::HashSet<_> = pack.cards()[1..4]
            .iter()
            .map(|c| c.metadata().rsplit(' ').next().unwrap().to_string())
            .collect();
        assert_eq!(colors.len(), 3);
    }
}

#[test]
fn test_failed_pack_leaves_counts_unchanged() {
    let mut rules = in_memory(
        "rares: 1\n Any -> r\n Add(r)\ncommons: 1\n Repeat 3 {\n Any -> c\n Add(c)\n }\n",
        vec![
            pool("rares", 1, &[("a", card_file("Rare", 0..5))]),
            pool("commons", 1, &[("a", card_file("Common", 0..4))]),
        ],
        EngineOptions::default().with_seed(8),
    );

    rules.generate_pack().unwrap();
    let before: Vec<u64> = rules.pools().iter().map(RarityPool::total_remaining).collect();
    assert_eq!(before, vec![4, 1]);

    let err = rules.generate_pack().unwrap_err();
    assert_eq!(err.rarity, "commons");
    let after: Vec<u64> = rules.pools().iter().map(RarityPool::total_remaining).collect();
    assert_eq!(after, before);
}

#[test]
fn test_seed_policies_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("rules.txt"), "rares: 2\n Any -> r\n Add(r)\n").unwrap();
    fs::create_dir_all(dir.path().join("rares")).unwrap();
    fs::write(dir.path().join("rares/a.dec"), card_file("Rare", 0..2)).unwrap();
    fs::write(dir.path().join("rares/b.dec"), card_file("Rare", 1..3)).unwrap();
    let script = dir.path().join("rules.txt");

    let overwrite = CompiledRuleSet::load(&script, EngineOptions::default().with_seed(1)).unwrap();
    let rares = overwrite.pool("rares").unwrap();
    assert_eq!(rares.remaining(&card("Rare", 1)), Some(2));
    assert_eq!(rares.file_names(), vec!["a", "b"]);

    let accumulate = CompiledRuleSet::load(
        &script,
        EngineOptions::default()
            .with_seed(1)
            .with_seeding(SeedPolicy::Accumulate),
    )
    .unwrap();
    let rares = accumulate.pool("rares").unwrap();
    assert_eq!(rares.remaining(&card("Rare", 1)), Some(4));
    assert_eq!(rares.remaining(&card("Rare", 2)), Some(2));
}

#[test]
fn test_duplicate_policies() {
    let text = "rares: 2\n Any -> r\n Add(r)\n Add(r)\n";
    let files = [("a", card_file("Rare", 0..3))];

    let mut warn = in_memory(
        text,
        vec![pool("rares", 2, &files)],
        EngineOptions::default().with_seed(6),
    );
    let pack = warn.generate_pack().unwrap();
    assert_eq!(pack.len(), 2);
    assert_eq!(pack.cards()[0], pack.cards()[1]);
    assert_eq!(warn.pack_diagnostics().count(DiagnosticLevel::Warn), 1);

    let mut reject = in_memory(
        text,
        vec![pool("rares", 2, &files)],
        EngineOptions::default()
            .with_seed(6)
            .with_duplicates(DuplicatePolicy::Reject),
    );
    let err = reject.generate_pack().unwrap_err();
    assert!(matches!(err.kind, EvalError::DuplicateInPack { .. }));
    assert_eq!(reject.pool("rares").unwrap().total_remaining(), 6);
}

#[test]
fn test_load_errors() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("rules.txt");
    fs::write(&script, "mythics: 1\n Any -> m\n Add(m)\n").unwrap();

    let err = CompiledRuleSet::load(&script, EngineOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::RarityDirNotFound { ref rarity, .. } if rarity == "mythics"));

    fs::create_dir_all(dir.path().join("mythics")).unwrap();
    fs::write(dir.path().join("mythics/odd.dec"), "// mvid:1\n1 Alpha\n// mvid:2\n").unwrap();
    let err = CompiledRuleSet::load(&script, EngineOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::OddLineCount { lines: 3, .. }));
}

#[test]
fn test_cards_root_override() {
    let scripts = tempfile::tempdir().unwrap();
    let cards = tempfile::tempdir().unwrap();
    let script = scripts.path().join("rules.txt");
    fs::write(&script, "rares: 1\n Any -> r\n Add(r)\n").unwrap();
    fs::create_dir_all(cards.path().join("rares")).unwrap();
    fs::write(cards.path().join("rares/set.dec"), card_file("Rare", 0..3)).unwrap();

    assert!(CompiledRuleSet::load(&script, EngineOptions::default()).is_err());
    let mut rules =
        CompiledRuleSet::load_with_root(&script, cards.path(), EngineOptions::default().with_seed(1))
            .unwrap();
    assert_eq!(rules.generate_pack().unwrap().len(), 1);
}

#[test]
fn test_memoized_colors_written_during_generation() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("colors.json");
    let inner = StaticColorLookup::new()
        .with(card("Rare", 0), [ColorTag::Green])
        .with(card("Rare", 1), [ColorTag::Green, ColorTag::Colorless]);
    let colors = MemoizedColorLookup::open(&cache, inner).unwrap();

    let mut rules = in_memory(
        "rares: 1\n [Any where Contains(GetColors(X), 'Green')] -> g\n Add(g)\n",
        vec![pool("rares", 1, &[("a", card_file("Rare", 0..2))])],
        EngineOptions::default().with_seed(1),
    )
    .with_color_lookup(colors);
    rules.generate_pack().unwrap();

    let reopened =
        MemoizedColorLookup::open(&cache, pack_runtime::OfflineColorLookup).unwrap();
    assert_eq!(reopened.len(), 2);
}
