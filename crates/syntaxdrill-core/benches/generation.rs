use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use syntaxdrill_core::model::{Exercise, ExerciseKind, Language};
use syntaxdrill_core::rng::SeededRng;
use syntaxdrill_core::{create_seed, render_exercise, GeneratorRegistry};

fn bench_seed(c: &mut Criterion) {
    let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
    c.bench_function("create_seed", |b| {
        b.iter(|| create_seed(black_box("user-123"), black_box("list-slice"), date))
    });
}

fn bench_rng(c: &mut Criterion) {
    let mut group = c.benchmark_group("rng");

    group.bench_function("from_seed", |b| {
        b.iter(|| SeededRng::new(black_box("user-123:list-slice:2026-01-15")))
    });

    let mut rng = SeededRng::new("bench");
    group.bench_function("int", |b| b.iter(|| rng.int(black_box(0), black_box(100))));

    let items: Vec<i64> = (0..64).collect();
    let mut rng = SeededRng::new("bench");
    group.bench_function("shuffle_64", |b| b.iter(|| rng.shuffle(black_box(&items))));

    group.finish();
}

fn bench_generators(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let registry = GeneratorRegistry::with_builtins();

    for name in ["string-slice-dynamic", "dict-access", "list-comprehension-filter"] {
        group.bench_function(name, |b| {
            b.iter(|| registry.generate(black_box(name), black_box("seed-0")))
        });
    }

    group.bench_function("self_check_10", |b| b.iter(|| registry.self_check(black_box(10))));

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let registry = GeneratorRegistry::with_builtins();
    let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
    let exercise = Exercise {
        slug: "string-slice-dynamic".into(),
        title: "Slice {{var}}".into(),
        kind: ExerciseKind::Write,
        language: Language::Python,
        prompt: "Given {{var}} = '{{word}}', get characters {{start}} up to {{end}}.".into(),
        expected_answer: "{{var}}[{{start}}:{{end}}]".into(),
        accepted_solutions: vec!["{{var}}[{{start}}:{{end}}:1]".into()],
        generator: Some("string-slice-dynamic".into()),
        verification_template: Some("{{var}} = '{{word}}'\nprint({{answer}})".into()),
        code: None,
        target_construct: None,
        tags: vec![],
        timeout_ms: None,
    };

    c.bench_function("render_exercise", |b| {
        b.iter(|| render_exercise(black_box(&exercise), &registry, "user-123", date))
    });
}

criterion_group!(benches, bench_seed, bench_rng, bench_generators, bench_render);
criterion_main!(benches);
