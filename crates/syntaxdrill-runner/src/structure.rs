//! Structural comparison of Python answers.
//!
//! Coarser than token comparison: literals are compared by value rather than
//! spelling, and punctuation that never changes meaning is dropped. The
//! normalizations are:
//!
//! - quote style and escaped quotes in string literals (`'it\'s'` == `"it's"`)
//! - numeric spelling (`0xff` == `255`, `1_000` == `1000`, `1.` == `1.0`)
//! - trailing commas in lists, dicts, sets and calls (`[1, 2,]` == `[1, 2]`)
//! - parentheses around the whole answer (`(a + b)` == `a + b`)
//!
//! A one-element tuple keeps its comma, and ints never equal floats.
//! `items[:3]` and `items[0:3]` stay different.

use syntaxdrill_core::runtime::{AstCompareResult, Token, TokenKind};

use crate::tokenizer::tokenize;

/// Words after which `(` opens a group rather than a call.
const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "await", "del", "elif", "else", "for", "from", "if", "import", "in",
    "is", "lambda", "not", "or", "return", "while", "with", "yield",
];

/// Canonical form of one significant token.
type Shape = Vec<(TokenKind, String)>;

/// Compare an answer against the expected answer and alternatives.
pub fn compare_structure(user: &str, expected: &str, alternatives: &[String]) -> AstCompareResult {
    let user = match normalize(user) {
        Ok(shape) => shape,
        Err(e) => return AstCompareResult::parse_failure(format!("answer does not parse: {e}")),
    };

    match normalize(expected) {
        Ok(shape) if shape == user => return AstCompareResult::matched(None),
        Ok(_) => {}
        Err(e) => tracing::warn!("expected answer does not parse: {e}"),
    }

    for alternative in alternatives {
        match normalize(alternative) {
            Ok(shape) if shape == user => {
                return AstCompareResult::matched(Some(alternative.clone()));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("accepted solution does not parse: {e}"),
        }
    }

    AstCompareResult::mismatch()
}

/// Reduce code to its canonical token shape.
pub fn normalize(code: &str) -> Result<Shape, String> {
    let tokens = tokenize(code).ok_or("unterminated string literal")?;
    let significant: Vec<Token> = tokens.into_iter().filter(|t| !t.kind.is_trivia()).collect();

    check_balance(&significant)?;

    let canonical: Vec<Token> = significant
        .into_iter()
        .map(|t| match t.kind {
            TokenKind::String => Token::new(t.kind, canonical_string(&t.text)),
            TokenKind::Number => Token::new(t.kind, canonical_number(&t.text)),
            _ => t,
        })
        .collect();

    let without_commas = drop_trailing_commas(canonical);
    let stripped = strip_outer_parens(&without_commas);

    Ok(stripped.iter().map(|t| (t.kind, t.text.clone())).collect())
}

fn closer_for(opener: &str) -> Option<&'static str> {
    match opener {
        "(" => Some(")"),
        "[" => Some("]"),
        "{" => Some("}"),
        _ => None,
    }
}

fn is_closer(text: &str) -> bool {
    matches!(text, ")" | "]" | "}")
}

/// Every bracket closes in order.
pub fn check_balance(tokens: &[Token]) -> Result<(), String> {
    let mut stack: Vec<&str> = Vec::new();
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Operator) {
        let text = token.text.as_str();
        if let Some(closer) = closer_for(text) {
            stack.push(closer);
        } else if is_closer(text) {
            match stack.pop() {
                Some(expected) if expected == text => {}
                Some(expected) => return Err(format!("expected '{expected}', found '{text}'")),
                None => return Err(format!("unmatched '{text}'")),
            }
        }
    }
    match stack.last() {
        Some(closer) => Err(format!("missing '{closer}'")),
        None => Ok(()),
    }
}

/// `prefix:content` with quote style and escaped quotes normalized.
fn canonical_string(text: &str) -> String {
    let prefix_len = text.find(['\'', '"']).unwrap_or(0);
    let prefix = text[..prefix_len].to_lowercase().replace('u', "");
    let body = &text[prefix_len..];

    let quote_len = if body.starts_with("'''") || body.starts_with("\"\"\"") {
        3
    } else {
        1
    };
    let content = body
        .get(quote_len..body.len().saturating_sub(quote_len))
        .unwrap_or_default();

    let content = if prefix.contains('r') {
        content.to_string()
    } else {
        content.replace("\\'", "'").replace("\\\"", "\"")
    };
    format!("{prefix}:{content}")
}

/// `int:N`, `float:F` or `complex:...` by value.
fn canonical_number(text: &str) -> String {
    let cleaned = text.replace('_', "").to_lowercase();

    if cleaned.ends_with('j') {
        return format!("complex:{cleaned}");
    }
    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(digits) = cleaned.strip_prefix(prefix) {
            return match i128::from_str_radix(digits, radix) {
                Ok(v) => format!("int:{v}"),
                Err(_) => cleaned,
            };
        }
    }
    if cleaned.contains(['.', 'e']) {
        return match cleaned.parse::<f64>() {
            Ok(v) => format!("float:{v:?}"),
            Err(_) => cleaned,
        };
    }
    match cleaned.parse::<i128>() {
        Ok(v) => format!("int:{v}"),
        Err(_) => cleaned,
    }
}

struct Group {
    opener: String,
    /// `(` directly after a callable: `f(`, `x[0](`.
    call: bool,
    commas: usize,
}

fn opens_call(previous: Option<&Token>) -> bool {
    match previous {
        Some(t) if t.kind == TokenKind::Name => !KEYWORDS.contains(&t.text.as_str()),
        Some(t) if t.kind == TokenKind::String => true,
        Some(t) => matches!(t.text.as_str(), ")" | "]"),
        None => false,
    }
}

/// Drop a comma right before a closing bracket, unless it makes a tuple.
fn drop_trailing_commas(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut groups: Vec<Group> = Vec::new();

    for token in tokens {
        if token.kind == TokenKind::Operator {
            let text = token.text.as_str();
            if closer_for(text).is_some() {
                groups.push(Group {
                    opener: text.to_string(),
                    call: opens_call(out.last()),
                    commas: 0,
                });
            } else if text == "," {
                if let Some(group) = groups.last_mut() {
                    group.commas += 1;
                }
            } else if is_closer(text) {
                if let Some(group) = groups.pop() {
                    let tuple = group.opener == "(" && !group.call && group.commas == 1;
                    let trailing = out
                        .last()
                        .is_some_and(|t| t.kind == TokenKind::Operator && t.text == ",");
                    if trailing && !tuple {
                        out.pop();
                    }
                }
            }
        }
        out.push(token);
    }
    out
}

/// Index of the bracket closing the opener at `open`.
fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.kind != TokenKind::Operator {
            continue;
        }
        if closer_for(&token.text).is_some() {
            depth += 1;
        } else if is_closer(&token.text) {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn has_top_level_comma(tokens: &[Token]) -> bool {
    let mut depth = 0usize;
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Operator) {
        match token.text.as_str() {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            "," if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

/// Remove parentheses that wrap the entire answer, repeatedly.
fn strip_outer_parens(tokens: &[Token]) -> &[Token] {
    let mut slice = tokens;
    while slice.len() > 2
        && slice[0].kind == TokenKind::Operator
        && slice[0].text == "("
        && matching_close(slice, 0) == Some(slice.len() - 1)
    {
        let inner = &slice[1..slice.len() - 1];
        if has_top_level_comma(inner) {
            break;
        }
        slice = inner;
    }
    slice
}
