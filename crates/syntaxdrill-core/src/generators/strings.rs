//! String indexing, slicing, and formatting generators.

use super::{choose, holds, FnGenerator};
use crate::model::GeneratorParams;
use crate::rng::SeededRng;

const WORDS: &[&str] = &[
    "python", "syntax", "keyboard", "variable", "function", "iterator", "lambda", "string",
    "program", "compile",
];

const VARIABLES: &[&str] = &["text", "word", "s", "name", "label"];

const PHRASES: &[&str] = &[
    "hello world",
    "data science",
    "python rocks",
    "good morning",
    "open source",
];

const METHODS: &[&str] = &["upper", "lower", "title", "capitalize"];

const SHORT_WORDS: &[&str] = &["ab", "ha", "na", "go", "hey"];

const NAMES: &[&str] = &["Ada", "Grace", "Linus", "Guido", "Barbara", "Alan"];

pub(super) fn generators() -> Vec<FnGenerator> {
    vec![
        FnGenerator {
            name: "string-slice",
            description: "word[start:end] with start in [0,4] and end capped at 7",
            generate: gen_string_slice,
            validate: |p| check_string_slice(p).is_some(),
        },
        FnGenerator {
            name: "string-slice-dynamic",
            description: "slice a named string variable between generated bounds",
            generate: gen_string_slice_dynamic,
            validate: |p| check_string_slice_dynamic(p).is_some(),
        },
        FnGenerator {
            name: "string-negative-index",
            description: "word[-k] for k within the word length",
            generate: gen_negative_index,
            validate: |p| check_negative_index(p).is_some(),
        },
        FnGenerator {
            name: "string-step-slice",
            description: "word[::step] with step 2 or 3",
            generate: gen_step_slice,
            validate: |p| check_step_slice(p).is_some(),
        },
        FnGenerator {
            name: "string-reverse",
            description: "word[::-1]",
            generate: gen_reverse,
            validate: |p| check_reverse(p).is_some(),
        },
        FnGenerator {
            name: "string-method",
            description: "upper/lower/title/capitalize on a phrase",
            generate: gen_method,
            validate: |p| check_method(p).is_some(),
        },
        FnGenerator {
            name: "string-concat-repeat",
            description: "word * times",
            generate: gen_repeat,
            validate: |p| check_repeat(p).is_some(),
        },
        FnGenerator {
            name: "fstring-format",
            description: "f\"{name} is {age}\"",
            generate: gen_fstring,
            validate: |p| check_fstring(p).is_some(),
        },
    ]
}

fn slice_chars(word: &str, start: usize, end: usize) -> String {
    word.chars().skip(start).take(end.saturating_sub(start)).collect()
}

fn slice_bounds(rng: &mut SeededRng, len: i64) -> (i64, i64) {
    let start = rng.int(0, 4);
    let end = rng.int(start + 1, len.min(7));
    (start, end)
}

fn check_bounds(word: &str, start: i64, end: i64) -> Option<()> {
    let len = word.chars().count() as i64;
    holds((0..=4).contains(&start))?;
    holds(end > start && end <= len.min(7))
}

fn gen_string_slice(rng: &mut SeededRng) -> GeneratorParams {
    let word = choose(rng, WORDS);
    let (start, end) = slice_bounds(rng, word.len() as i64);
    GeneratorParams::new()
        .with("word", word)
        .with("start", start)
        .with("end", end)
        .with("result", slice_chars(word, start as usize, end as usize))
}

fn check_string_slice(p: &GeneratorParams) -> Option<()> {
    let word = p.str("word")?;
    let (start, end) = (p.int("start")?, p.int("end")?);
    check_bounds(word, start, end)?;
    holds(p.str("result")? == slice_chars(word, start as usize, end as usize))
}

fn gen_string_slice_dynamic(rng: &mut SeededRng) -> GeneratorParams {
    let var = choose(rng, VARIABLES);
    gen_string_slice(rng).with("var", var)
}

fn check_string_slice_dynamic(p: &GeneratorParams) -> Option<()> {
    let var = p.str("var")?;
    holds(VARIABLES.contains(&var))?;
    check_string_slice(p)
}

fn gen_negative_index(rng: &mut SeededRng) -> GeneratorParams {
    let word = choose(rng, WORDS);
    let len = word.chars().count() as i64;
    let k = rng.int(1, len);
    let result: String = word
        .chars()
        .nth((len - k) as usize)
        .map(String::from)
        .unwrap_or_default();
    GeneratorParams::new()
        .with("word", word)
        .with("k", k)
        .with("result", result)
}

fn check_negative_index(p: &GeneratorParams) -> Option<()> {
    let word = p.str("word")?;
    let k = p.int("k")?;
    let len = word.chars().count() as i64;
    holds(k >= 1 && k <= len)?;
    let expected = word.chars().nth((len - k) as usize)?;
    holds(p.str("result")? == expected.to_string())
}

fn step_chars(word: &str, step: usize) -> String {
    word.chars().step_by(step).collect()
}

fn gen_step_slice(rng: &mut SeededRng) -> GeneratorParams {
    let word = choose(rng, WORDS);
    let step = rng.int(2, 3);
    GeneratorParams::new()
        .with("word", word)
        .with("step", step)
        .with("result", step_chars(word, step as usize))
}

fn check_step_slice(p: &GeneratorParams) -> Option<()> {
    let word = p.str("word")?;
    let step = p.int("step")?;
    holds((2..=3).contains(&step) && !word.is_empty())?;
    holds(p.str("result")? == step_chars(word, step as usize))
}

fn gen_reverse(rng: &mut SeededRng) -> GeneratorParams {
    let word = choose(rng, WORDS);
    GeneratorParams::new()
        .with("word", word)
        .with("result", word.chars().rev().collect::<String>())
}

fn check_reverse(p: &GeneratorParams) -> Option<()> {
    let word = p.str("word")?;
    holds(word.chars().count() >= 3)?;
    holds(p.str("result")? == word.chars().rev().collect::<String>())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn title(s: &str) -> String {
    s.split(' ').map(capitalize).collect::<Vec<_>>().join(" ")
}

fn apply_method(method: &str, input: &str) -> Option<String> {
    match method {
        "upper" => Some(input.to_uppercase()),
        "lower" => Some(input.to_lowercase()),
        "title" => Some(title(input)),
        "capitalize" => Some(capitalize(input)),
        _ => None,
    }
}

fn gen_method(rng: &mut SeededRng) -> GeneratorParams {
    let phrase = choose(rng, PHRASES);
    let method = choose(rng, METHODS);
    // lower() on an already-lowercase phrase would be a no-op exercise.
    let input = if method == "lower" {
        phrase.to_uppercase()
    } else {
        phrase.to_string()
    };
    let result = apply_method(method, &input).unwrap_or_default();
    GeneratorParams::new()
        .with("text", input)
        .with("method", method)
        .with("result", result)
}

fn check_method(p: &GeneratorParams) -> Option<()> {
    let text = p.str("text")?;
    let method = p.str("method")?;
    holds(METHODS.contains(&method))?;
    holds(text != apply_method(method, text)?)?;
    holds(p.str("result")? == apply_method(method, text)?)
}

fn gen_repeat(rng: &mut SeededRng) -> GeneratorParams {
    let word = choose(rng, SHORT_WORDS);
    let times = rng.int(2, 4);
    GeneratorParams::new()
        .with("word", word)
        .with("times", times)
        .with("result", word.repeat(times as usize))
}

fn check_repeat(p: &GeneratorParams) -> Option<()> {
    let word = p.str("word")?;
    let times = p.int("times")?;
    holds((2..=4).contains(&times) && !word.is_empty())?;
    holds(p.str("result")? == word.repeat(times as usize))
}

fn gen_fstring(rng: &mut SeededRng) -> GeneratorParams {
    let name = choose(rng, NAMES);
    let age = rng.int(18, 80);
    GeneratorParams::new()
        .with("name", name)
        .with("age", age)
        .with("result", format!("{name} is {age}"))
}

fn check_fstring(p: &GeneratorParams) -> Option<()> {
    let name = p.str("name")?;
    let age = p.int("age")?;
    holds((18..=80).contains(&age) && !name.is_empty())?;
    holds(p.str("result")? == format!("{name} is {age}"))
}
