//! List, dict, tuple, and set generators.

use super::{choose, holds, int_list, FnGenerator};
use crate::model::GeneratorParams;
use crate::rng::SeededRng;

const FRUITS: &[&str] = &["apple", "banana", "cherry", "mango", "pear", "plum", "kiwi"];

const TUPLE_NAMES: &[&str] = &["a", "b", "c"];

pub(super) fn generators() -> Vec<FnGenerator> {
    vec![
        FnGenerator {
            name: "list-index",
            description: "items[index] on a 4-6 element list",
            generate: gen_list_index,
            validate: |p| check_list_index(p).is_some(),
        },
        FnGenerator {
            name: "list-negative-index",
            description: "items[-k] on a 4-6 element list",
            generate: gen_list_negative_index,
            validate: |p| check_list_negative_index(p).is_some(),
        },
        FnGenerator {
            name: "list-slice",
            description: "items[start:end] on a 5-8 element list",
            generate: gen_list_slice,
            validate: |p| check_list_slice(p).is_some(),
        },
        FnGenerator {
            name: "list-append",
            description: "items.append(value)",
            generate: gen_list_append,
            validate: |p| check_list_append(p).is_some(),
        },
        FnGenerator {
            name: "list-len",
            description: "len(items)",
            generate: gen_list_len,
            validate: |p| check_list_len(p).is_some(),
        },
        FnGenerator {
            name: "list-comprehension-square",
            description: "[i * i for i in range(n)]",
            generate: gen_comprehension_square,
            validate: |p| check_comprehension_square(p).is_some(),
        },
        FnGenerator {
            name: "list-comprehension-filter",
            description: "[x for x in items if x > threshold]",
            generate: gen_comprehension_filter,
            validate: |p| check_comprehension_filter(p).is_some(),
        },
        FnGenerator {
            name: "list-sum-max",
            description: "sum/max/min of a list",
            generate: gen_sum_max,
            validate: |p| check_sum_max(p).is_some(),
        },
        FnGenerator {
            name: "dict-access",
            description: "prices[key] on a three-entry dict",
            generate: gen_dict_access,
            validate: |p| check_dict_access(p).is_some(),
        },
        FnGenerator {
            name: "dict-get-default",
            description: "prices.get(missing, default)",
            generate: gen_dict_get_default,
            validate: |p| check_dict_get_default(p).is_some(),
        },
        FnGenerator {
            name: "tuple-unpack",
            description: "a, b, c = (x, y, z); print one of them",
            generate: gen_tuple_unpack,
            validate: |p| check_tuple_unpack(p).is_some(),
        },
        FnGenerator {
            name: "set-dedupe",
            description: "sorted(set(items)) on a list with duplicates",
            generate: gen_set_dedupe,
            validate: |p| check_set_dedupe(p).is_some(),
        },
    ]
}

fn gen_list_index(rng: &mut SeededRng) -> GeneratorParams {
    let len = rng.int(4, 6);
    let items = int_list(rng, len, 1, 99);
    let index = rng.int(0, len - 1);
    let result = items[index as usize];
    GeneratorParams::new()
        .with("items", items)
        .with("index", index)
        .with("result", result)
}

fn check_list_index(p: &GeneratorParams) -> Option<()> {
    let items = p.int_list("items")?;
    let index = p.int("index")?;
    holds((4..=6).contains(&items.len()))?;
    holds(items.iter().all(|v| (1..=99).contains(v)))?;
    holds(index >= 0 && (index as usize) < items.len())?;
    holds(p.int("result")? == items[index as usize])
}

fn gen_list_negative_index(rng: &mut SeededRng) -> GeneratorParams {
    let len = rng.int(4, 6);
    let items = int_list(rng, len, 1, 99);
    let k = rng.int(1, len);
    let result = items[(len - k) as usize];
    GeneratorParams::new()
        .with("items", items)
        .with("k", k)
        .with("result", result)
}

fn check_list_negative_index(p: &GeneratorParams) -> Option<()> {
    let items = p.int_list("items")?;
    let k = p.int("k")?;
    let len = items.len() as i64;
    holds((4..=6).contains(&len))?;
    holds(k >= 1 && k <= len)?;
    holds(p.int("result")? == items[(len - k) as usize])
}

fn gen_list_slice(rng: &mut SeededRng) -> GeneratorParams {
    let len = rng.int(5, 8);
    let items = int_list(rng, len, 1, 99);
    let start = rng.int(0, 3);
    let end = rng.int(start + 1, len);
    let result = items[start as usize..end as usize].to_vec();
    GeneratorParams::new()
        .with("items", items)
        .with("start", start)
        .with("end", end)
        .with("result", result)
}

fn check_list_slice(p: &GeneratorParams) -> Option<()> {
    let items = p.int_list("items")?;
    let (start, end) = (p.int("start")?, p.int("end")?);
    let len = items.len() as i64;
    holds((5..=8).contains(&len))?;
    holds((0..=3).contains(&start) && end > start && end <= len)?;
    holds(p.int_list("result")? == items[start as usize..end as usize])
}

fn gen_list_append(rng: &mut SeededRng) -> GeneratorParams {
    let len = rng.int(3, 5);
    let items = int_list(rng, len, 1, 99);
    let value = rng.int(1, 99);
    let mut result = items.clone();
    result.push(value);
    GeneratorParams::new()
        .with("items", items)
        .with("value", value)
        .with("result", result)
}

fn check_list_append(p: &GeneratorParams) -> Option<()> {
    let items = p.int_list("items")?;
    let value = p.int("value")?;
    holds((3..=5).contains(&items.len()))?;
    let result = p.int_list("result")?;
    holds(result.len() == items.len() + 1)?;
    holds(result[..items.len()] == items[..] && result.last() == Some(&value))
}

fn gen_list_len(rng: &mut SeededRng) -> GeneratorParams {
    let len = rng.int(2, 9);
    let items = int_list(rng, len, 1, 99);
    GeneratorParams::new()
        .with("items", items)
        .with("result", len)
}

fn check_list_len(p: &GeneratorParams) -> Option<()> {
    let items = p.int_list("items")?;
    holds((2..=9).contains(&items.len()))?;
    holds(p.int("result")? == items.len() as i64)
}

fn squares(n: i64) -> Vec<i64> {
    (0..n).map(|i| i * i).collect()
}

fn gen_comprehension_square(rng: &mut SeededRng) -> GeneratorParams {
    let n = rng.int(3, 6);
    GeneratorParams::new()
        .with("n", n)
        .with("result", squares(n))
}

fn check_comprehension_square(p: &GeneratorParams) -> Option<()> {
    let n = p.int("n")?;
    holds((3..=6).contains(&n))?;
    holds(p.int_list("result")? == squares(n))
}

fn gen_comprehension_filter(rng: &mut SeededRng) -> GeneratorParams {
    let len = rng.int(5, 8);
    let items = int_list(rng, len, 1, 50);
    let threshold = rng.int(10, 40);
    let result: Vec<i64> = items.iter().copied().filter(|x| *x > threshold).collect();
    GeneratorParams::new()
        .with("items", items)
        .with("threshold", threshold)
        .with("result", result)
}

fn check_comprehension_filter(p: &GeneratorParams) -> Option<()> {
    let items = p.int_list("items")?;
    let threshold = p.int("threshold")?;
    holds((5..=8).contains(&items.len()) && (10..=40).contains(&threshold))?;
    let expected: Vec<i64> = items.iter().copied().filter(|x| *x > threshold).collect();
    holds(p.int_list("result")? == expected)
}

fn gen_sum_max(rng: &mut SeededRng) -> GeneratorParams {
    let len = rng.int(3, 7);
    let items = int_list(rng, len, -20, 50);
    let total: i64 = items.iter().sum();
    let max = items.iter().copied().max().unwrap_or_default();
    let min = items.iter().copied().min().unwrap_or_default();
    GeneratorParams::new()
        .with("items", items)
        .with("sum", total)
        .with("max", max)
        .with("min", min)
}

fn check_sum_max(p: &GeneratorParams) -> Option<()> {
    let items = p.int_list("items")?;
    holds((3..=7).contains(&items.len()))?;
    holds(p.int("sum")? == items.iter().sum::<i64>())?;
    holds(p.int("max")? == items.iter().copied().max()?)?;
    holds(p.int("min")? == items.iter().copied().min()?)
}

fn dict_literal(keys: &[&str], values: &[i64]) -> String {
    let entries: Vec<String> = keys
        .iter()
        .zip(values)
        .map(|(k, v)| format!("'{k}': {v}"))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// Three distinct fruits with prices, plus a fruit not among them.
fn gen_prices(rng: &mut SeededRng) -> (Vec<&'static str>, Vec<i64>, &'static str) {
    let shuffled = rng.shuffle(FRUITS);
    let keys = shuffled[..3].to_vec();
    let values = int_list(rng, 3, 1, 9);
    (keys, values, shuffled[3])
}

fn check_prices<'a>(p: &'a GeneratorParams) -> Option<(Vec<&'a str>, Vec<i64>)> {
    let keys = p.str_list("keys")?;
    let values = p.int_list("values")?;
    holds(keys.len() == 3 && values.len() == 3)?;
    holds(keys[0] != keys[1] && keys[0] != keys[2] && keys[1] != keys[2])?;
    holds(values.iter().all(|v| (1..=9).contains(v)))?;
    holds(p.str("dict_literal")? == dict_literal(&keys, &values))?;
    Some((keys, values))
}

fn gen_dict_access(rng: &mut SeededRng) -> GeneratorParams {
    let (keys, values, _) = gen_prices(rng);
    let index = rng.int(0, 2) as usize;
    GeneratorParams::new()
        .with("dict_literal", dict_literal(&keys, &values))
        .with("key", keys[index])
        .with("result", values[index])
        .with("keys", keys)
        .with("values", values)
}

fn check_dict_access(p: &GeneratorParams) -> Option<()> {
    let (keys, values) = check_prices(p)?;
    let key = p.str("key")?;
    let index = keys.iter().position(|k| *k == key)?;
    holds(p.int("result")? == values[index])
}

fn gen_dict_get_default(rng: &mut SeededRng) -> GeneratorParams {
    let (keys, values, missing) = gen_prices(rng);
    let default = rng.int(0, 9);
    GeneratorParams::new()
        .with("dict_literal", dict_literal(&keys, &values))
        .with("missing", missing)
        .with("default", default)
        .with("result", default)
        .with("keys", keys)
        .with("values", values)
}

fn check_dict_get_default(p: &GeneratorParams) -> Option<()> {
    let (keys, _) = check_prices(p)?;
    let missing = p.str("missing")?;
    holds(!keys.contains(&missing))?;
    let default = p.int("default")?;
    holds((0..=9).contains(&default) && p.int("result")? == default)
}

fn gen_tuple_unpack(rng: &mut SeededRng) -> GeneratorParams {
    let values = int_list(rng, 3, 1, 20);
    let index = rng.int(0, 2) as usize;
    GeneratorParams::new()
        .with("x", values[0])
        .with("y", values[1])
        .with("z", values[2])
        .with("target", TUPLE_NAMES[index])
        .with("result", values[index])
}

fn check_tuple_unpack(p: &GeneratorParams) -> Option<()> {
    let values = [p.int("x")?, p.int("y")?, p.int("z")?];
    holds(values.iter().all(|v| (1..=20).contains(v)))?;
    let target = p.str("target")?;
    let index = TUPLE_NAMES.iter().position(|n| *n == target)?;
    holds(p.int("result")? == values[index])
}

fn dedupe(items: &[i64]) -> Vec<i64> {
    let mut unique = items.to_vec();
    unique.sort_unstable();
    unique.dedup();
    unique
}

fn gen_set_dedupe(rng: &mut SeededRng) -> GeneratorParams {
    // More items than distinct values guarantees at least one duplicate.
    let len = rng.int(6, 9);
    let items = int_list(rng, len, 1, 5);
    let unique = dedupe(&items);
    GeneratorParams::new()
        .with("count", unique.len())
        .with("items", items)
        .with("result", unique)
}

fn check_set_dedupe(p: &GeneratorParams) -> Option<()> {
    let items = p.int_list("items")?;
    holds((6..=9).contains(&items.len()))?;
    holds(items.iter().all(|v| (1..=5).contains(v)))?;
    let unique = dedupe(&items);
    holds(unique.len() < items.len())?;
    holds(p.int_list("result")? == unique && p.int("count")? == unique.len() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_literal_is_python_syntax() {
        assert_eq!(
            dict_literal(&["apple", "kiwi"], &[3, 7]),
            "{'apple': 3, 'kiwi': 7}"
        );
    }

    #[test]
    fn dict_get_default_uses_missing_key() {
        let mut rng = SeededRng::new("dict");
        let params = gen_dict_get_default(&mut rng);
        let keys = params.str_list("keys").unwrap();
        assert!(!keys.contains(&params.str("missing").unwrap()));
        assert!(check_dict_get_default(&params).is_some());
    }

    #[test]
    fn list_slice_rejects_tampered_result() {
        let mut rng = SeededRng::new("slice");
        let params = gen_list_slice(&mut rng).with("result", vec![0i64]);
        assert!(check_list_slice(&params).is_none());
    }

    #[test]
    fn set_dedupe_always_has_duplicates() {
        for i in 0..50 {
            let mut rng = SeededRng::new(&format!("dedupe-{i}"));
            let params = gen_set_dedupe(&mut rng);
            assert!(params.int("count").unwrap() < params.int_list("items").unwrap().len() as i64);
        }
    }
}
