//! Benchmarks for rule matching
//!
//! Tests performance of classifying file facts against the rule table.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ps_core::{RuleAction, RuleCategory};
use ps_rules::{Condition, FileFacts, FormatRule, RuleEngine};

/// Facts shaped the way the classifier builds them: consensus extension
/// first, on-disk extension second, empty fallback last.
fn facts_for(consensus: &str, original: &str) -> FileFacts {
    FileFacts {
        extension_candidates: vec![consensus.to_string(), original.to_string(), String::new()],
        original_extension: original.to_string(),
        size_bytes: 4 * 1024 * 1024,
        ..FileFacts::default()
    }
}

/// A plain JPEG, the extension-only fast path.
fn jpeg_facts() -> FileFacts {
    facts_for(".jpg", ".jpg")
}

/// An animated PNG; matching has to consult the animated flag.
fn apng_facts() -> FileFacts {
    let mut facts = facts_for(".png", ".png");
    facts.animated = true;
    facts
}

/// A CMYK Photoshop file; matching walks the color mode conditions.
fn psd_cmyk_facts() -> FileFacts {
    let mut facts = facts_for(".psd", ".psd");
    facts.color_mode = Some("cmyk".to_string());
    facts
}

/// A probed Matroska file; matching evaluates stream token conditions.
fn matroska_facts() -> FileFacts {
    let mut facts = facts_for(".mkv", ".mkv");
    facts.stream_tokens = vec![
        "container:matroska".to_string(),
        "video:h264".to_string(),
        "audio:aac".to_string(),
    ];
    facts
}

/// An unrecognized extension; the worst case walks the whole table for
/// every candidate.
fn unknown_facts() -> FileFacts {
    facts_for(".xyz", ".xyz")
}

/// An extension-only rule.
fn extension_rule() -> FormatRule {
    FormatRule {
        rule_id: "jpeg_import".to_string(),
        category: RuleCategory::Image,
        extensions: vec![".jpg".to_string(), ".jpeg".to_string()],
        conditions: vec![],
        action: RuleAction::Import,
        notes: String::new(),
    }
}

/// A rule with a full condition stack over the probed streams.
fn condition_rule() -> FormatRule {
    FormatRule {
        rule_id: "matroska_h264_aac_rewrap".to_string(),
        category: RuleCategory::Video,
        extensions: vec![".mkv".to_string(), ".webm".to_string()],
        conditions: vec![
            Condition::StreamToken {
                token: "container:matroska".to_string(),
            },
            Condition::StreamToken {
                token: "video:h264".to_string(),
            },
            Condition::StreamToken {
                token: "audio:aac".to_string(),
            },
        ],
        action: RuleAction::RewrapToMp4,
        notes: String::new(),
    }
}

/// A table of `n` extension-only filler rules that never match media files.
fn filler_rules(n: usize) -> Vec<FormatRule> {
    (0..n)
        .map(|i| FormatRule {
            rule_id: format!("filler_{i}"),
            category: RuleCategory::Image,
            extensions: vec![format!(".z{i:02}")],
            conditions: vec![],
            action: RuleAction::Import,
            notes: String::new(),
        })
        .collect()
}

fn bench_single_rule_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_rule_matching");

    let jpeg = jpeg_facts();
    let mkv = matroska_facts();
    let ext_rule = extension_rule();
    let cond_rule = condition_rule();

    // Extension-only rule
    group.bench_function("extension_rule/hit", |b| {
        b.iter(|| black_box(&ext_rule).matches(black_box(".jpg"), black_box(&jpeg)));
    });

    group.bench_function("extension_rule/miss", |b| {
        b.iter(|| black_box(&ext_rule).matches(black_box(".mkv"), black_box(&mkv)));
    });

    // Rule with three stream token conditions
    group.bench_function("condition_rule/hit", |b| {
        b.iter(|| black_box(&cond_rule).matches(black_box(".mkv"), black_box(&mkv)));
    });

    group.bench_function("condition_rule/token_miss", |b| {
        b.iter(|| black_box(&cond_rule).matches(black_box(".mkv"), black_box(&jpeg)));
    });

    group.finish();
}

fn bench_builtin_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("builtin_table");

    let engine = RuleEngine::builtin();
    let jpeg = jpeg_facts();
    let apng = apng_facts();
    let psd = psd_cmyk_facts();
    let mkv = matroska_facts();
    let unknown = unknown_facts();

    group.bench_function("extension_only/jpeg", |b| {
        b.iter(|| engine.find_matching_rule(black_box(&jpeg)));
    });

    group.bench_function("animated_flag/apng", |b| {
        b.iter(|| engine.find_matching_rule(black_box(&apng)));
    });

    group.bench_function("color_mode/psd_cmyk", |b| {
        b.iter(|| engine.find_matching_rule(black_box(&psd)));
    });

    group.bench_function("stream_tokens/matroska", |b| {
        b.iter(|| engine.find_matching_rule(black_box(&mkv)));
    });

    group.bench_function("no_match/unknown", |b| {
        b.iter(|| engine.find_matching_rule(black_box(&unknown)));
    });

    group.finish();
}

fn bench_table_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_size");

    let mkv = matroska_facts();
    let unknown = unknown_facts();

    // The matching rule sits at the end, so the walk covers the whole table.
    for n in [10usize, 50, 200] {
        let mut rules = filler_rules(n);
        rules.push(condition_rule());
        let engine = RuleEngine::new(rules);

        group.bench_with_input(
            BenchmarkId::new("last_rule_hit", format!("{}_rules", n + 1)),
            &(&mkv, &engine),
            |b, (facts, engine)| {
                b.iter(|| engine.find_matching_rule(black_box(facts)));
            },
        );
    }

    let no_match_engine = RuleEngine::new(filler_rules(50));
    group.bench_with_input(
        BenchmarkId::new("no_match", "50_rules"),
        &(&unknown, &no_match_engine),
        |b, (facts, engine)| {
            b.iter(|| engine.find_matching_rule(black_box(facts)));
        },
    );

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    let engine = RuleEngine::builtin();
    let jpeg = jpeg_facts();
    let svg = facts_for(".svg", ".svg");
    let unknown = unknown_facts();

    group.bench_function("import_match", |b| {
        b.iter(|| engine.classify(black_box(&jpeg)));
    });

    // Skip rules build a rejection error
    group.bench_function("vector_rejection", |b| {
        b.iter(|| engine.classify(black_box(&svg)));
    });

    group.bench_function("unmatched_rejection", |b| {
        b.iter(|| engine.classify(black_box(&unknown)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_rule_matching,
    bench_builtin_table,
    bench_table_size,
    bench_classify
);
criterion_main!(benches);
