//! Arithmetic, range, and boolean generators.

use super::{choose, holds, FnGenerator};
use crate::model::GeneratorParams;
use crate::rng::SeededRng;

const BOOL_OPS: &[&str] = &["and", "or"];

pub(super) fn generators() -> Vec<FnGenerator> {
    vec![
        FnGenerator {
            name: "range-sum",
            description: "sum(range(start, stop))",
            generate: gen_range_sum,
            validate: |p| check_range_sum(p).is_some(),
        },
        FnGenerator {
            name: "range-step",
            description: "list(range(start, stop, step))",
            generate: gen_range_step,
            validate: |p| check_range_step(p).is_some(),
        },
        FnGenerator {
            name: "arithmetic-floor-div-mod",
            description: "a // b and a % b",
            generate: gen_floor_div_mod,
            validate: |p| check_floor_div_mod(p).is_some(),
        },
        FnGenerator {
            name: "arithmetic-power",
            description: "base ** exp",
            generate: gen_power,
            validate: |p| check_power(p).is_some(),
        },
        FnGenerator {
            name: "boolean-logic",
            description: "a and b / a or b",
            generate: gen_boolean_logic,
            validate: |p| check_boolean_logic(p).is_some(),
        },
        FnGenerator {
            name: "comparison-chain",
            description: "low < x < high",
            generate: gen_comparison_chain,
            validate: |p| check_comparison_chain(p).is_some(),
        },
    ]
}

fn gen_range_sum(rng: &mut SeededRng) -> GeneratorParams {
    let start = rng.int(0, 5);
    let stop = rng.int(start + 2, start + 8);
    GeneratorParams::new()
        .with("start", start)
        .with("stop", stop)
        .with("result", (start..stop).sum::<i64>())
}

fn check_range_sum(p: &GeneratorParams) -> Option<()> {
    let (start, stop) = (p.int("start")?, p.int("stop")?);
    holds((0..=5).contains(&start))?;
    holds(stop >= start + 2 && stop <= start + 8)?;
    holds(p.int("result")? == (start..stop).sum::<i64>())
}

fn stepped(start: i64, stop: i64, step: i64) -> Vec<i64> {
    (start..stop).step_by(step as usize).collect()
}

fn gen_range_step(rng: &mut SeededRng) -> GeneratorParams {
    let start = rng.int(0, 4);
    let stop = rng.int(start + 6, start + 15);
    let step = rng.int(2, 4);
    GeneratorParams::new()
        .with("start", start)
        .with("stop", stop)
        .with("step", step)
        .with("result", stepped(start, stop, step))
}

fn check_range_step(p: &GeneratorParams) -> Option<()> {
    let (start, stop, step) = (p.int("start")?, p.int("stop")?, p.int("step")?);
    holds((0..=4).contains(&start) && (2..=4).contains(&step))?;
    holds(stop >= start + 6 && stop <= start + 15)?;
    holds(p.int_list("result")? == stepped(start, stop, step))
}

fn gen_floor_div_mod(rng: &mut SeededRng) -> GeneratorParams {
    let a = rng.int(10, 99);
    let b = rng.int(2, 9);
    GeneratorParams::new()
        .with("a", a)
        .with("b", b)
        .with("quotient", a.div_euclid(b))
        .with("remainder", a.rem_euclid(b))
}

fn check_floor_div_mod(p: &GeneratorParams) -> Option<()> {
    let (a, b) = (p.int("a")?, p.int("b")?);
    holds((10..=99).contains(&a) && (2..=9).contains(&b))?;
    holds(p.int("quotient")? == a.div_euclid(b) && p.int("remainder")? == a.rem_euclid(b))
}

fn gen_power(rng: &mut SeededRng) -> GeneratorParams {
    let base = rng.int(2, 5);
    let exp = rng.int(2, 4);
    GeneratorParams::new()
        .with("base", base)
        .with("exp", exp)
        .with("result", base.pow(exp as u32))
}

fn check_power(p: &GeneratorParams) -> Option<()> {
    let (base, exp) = (p.int("base")?, p.int("exp")?);
    holds((2..=5).contains(&base) && (2..=4).contains(&exp))?;
    holds(p.int("result")? == base.pow(exp as u32))
}

fn apply_bool(op: &str, a: bool, b: bool) -> Option<bool> {
    match op {
        "and" => Some(a && b),
        "or" => Some(a || b),
        _ => None,
    }
}

fn gen_boolean_logic(rng: &mut SeededRng) -> GeneratorParams {
    let a = rng.bool();
    let b = rng.bool();
    let op = choose(rng, BOOL_OPS);
    GeneratorParams::new()
        .with("a", a)
        .with("b", b)
        .with("op", op)
        .with("result", apply_bool(op, a, b).unwrap_or_default())
}

fn check_boolean_logic(p: &GeneratorParams) -> Option<()> {
    let (a, b) = (p.bool("a")?, p.bool("b")?);
    let op = p.str("op")?;
    holds(p.bool("result")? == apply_bool(op, a, b)?)
}

fn gen_comparison_chain(rng: &mut SeededRng) -> GeneratorParams {
    let low = rng.int(0, 10);
    let high = rng.int(low + 5, low + 20);
    let x = rng.int(low - 5, high + 5);
    GeneratorParams::new()
        .with("low", low)
        .with("high", high)
        .with("x", x)
        .with("result", low < x && x < high)
}

fn check_comparison_chain(p: &GeneratorParams) -> Option<()> {
    let (low, high, x) = (p.int("low")?, p.int("high")?, p.int("x")?);
    holds((0..=10).contains(&low))?;
    holds(high >= low + 5 && high <= low + 20)?;
    holds(x >= low - 5 && x <= high + 5)?;
    holds(p.bool("result")? == (low < x && x < high))
}
