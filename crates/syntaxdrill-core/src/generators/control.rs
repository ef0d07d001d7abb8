//! Loop generators.

use super::{holds, int_list, FnGenerator};
use crate::model::GeneratorParams;
use crate::rng::SeededRng;

pub(super) fn generators() -> Vec<FnGenerator> {
    vec![
        FnGenerator {
            name: "for-loop-accumulate",
            description: "total += x over a list",
            generate: gen_accumulate,
            validate: |p| check_accumulate(p).is_some(),
        },
        FnGenerator {
            name: "while-countdown",
            description: "while n > 0: collect n; n -= 1",
            generate: gen_countdown,
            validate: |p| check_countdown(p).is_some(),
        },
    ]
}

fn gen_accumulate(rng: &mut SeededRng) -> GeneratorParams {
    let len = rng.int(3, 6);
    let items = int_list(rng, len, 1, 20);
    let total: i64 = items.iter().sum();
    GeneratorParams::new()
        .with("items", items)
        .with("result", total)
}

fn check_accumulate(p: &GeneratorParams) -> Option<()> {
    let items = p.int_list("items")?;
    holds((3..=6).contains(&items.len()))?;
    holds(items.iter().all(|v| (1..=20).contains(v)))?;
    holds(p.int("result")? == items.iter().sum::<i64>())
}

fn countdown(start: i64) -> Vec<i64> {
    (1..=start).rev().collect()
}

fn gen_countdown(rng: &mut SeededRng) -> GeneratorParams {
    let start = rng.int(3, 7);
    GeneratorParams::new()
        .with("start", start)
        .with("result", countdown(start))
}

fn check_countdown(p: &GeneratorParams) -> Option<()> {
    let start = p.int("start")?;
    holds((3..=7).contains(&start))?;
    holds(p.int_list("result")? == countdown(start))
}
