use criterion::{black_box, criterion_group, criterion_main, Criterion};

use syntaxdrill_core::grading::{
    check_predict_answer, find_exact_match, normalize_output, normalize_predicted_output,
};
use syntaxdrill_core::ExerciseKind;

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let short = "  [1, 2, 3]\r\n\n";
    let long = {
        let mut s = String::new();
        for i in 0..500 {
            s.push_str(&format!("line {i}   \r\n"));
        }
        s
    };

    group.bench_function("predicted_short", |b| {
        b.iter(|| normalize_predicted_output(black_box(short)))
    });
    group.bench_function("output_500_lines", |b| {
        b.iter(|| normalize_output(black_box(&long)))
    });

    group.finish();
}

fn bench_exact(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact_match");

    let accepted: Vec<String> = (0..20).map(|i| format!("items[{i}:3]")).collect();

    group.bench_function("expected_hit", |b| {
        b.iter(|| {
            find_exact_match(
                ExerciseKind::Write,
                black_box("items[:3]"),
                "items[:3]",
                &accepted,
            )
        })
    });

    group.bench_function("last_alternative", |b| {
        b.iter(|| {
            find_exact_match(
                ExerciseKind::Write,
                black_box("items[19:3]"),
                "items[:3]",
                &accepted,
            )
        })
    });

    group.bench_function("predict_miss", |b| {
        b.iter(|| check_predict_answer(black_box("TEN"), "10", &accepted))
    });

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_exact);
criterion_main!(benches);
