//! Lexer for the subset of Python that drill answers use.
//!
//! Produces the token stream for whitespace- and comment-tolerant
//! comparison. Indentation is not tracked; leading whitespace is an
//! ordinary `Whitespace` token.

use syntaxdrill_core::runtime::{Token, TokenKind};

const THREE_CHAR_OPS: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];
const TWO_CHAR_OPS: &[&str] = &[
    "==", "!=", "<=", ">=", "**", "//", "<<", ">>", "->", ":=", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "@=",
];
const ONE_CHAR_OPS: &str = "+-*/%@&|^~<>()[]{},:.;=!";

/// String prefixes Python accepts, lowercase.
const STRING_PREFIXES: &[&str] = &["rb", "br", "fr", "rf", "r", "b", "f", "u"];

/// Tokenize Python source.
///
/// Returns `None` if a string literal is never closed.
pub fn tokenize(code: &str) -> Option<Vec<Token>> {
    let chars: Vec<char> = code.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let start = i;
        let c = chars[i];

        let kind = if c == '\n' || c == '\r' {
            i += 1;
            if c == '\r' && chars.get(i) == Some(&'\n') {
                i += 1;
            }
            TokenKind::Newline
        } else if c == '\\' && matches!(chars.get(i + 1), Some('\n') | Some('\r')) {
            // Explicit line continuation.
            i += 2;
            if chars[i - 1] == '\r' && chars.get(i) == Some(&'\n') {
                i += 1;
            }
            TokenKind::Whitespace
        } else if c.is_whitespace() {
            while i < chars.len() && chars[i].is_whitespace() && chars[i] != '\n' && chars[i] != '\r'
            {
                i += 1;
            }
            TokenKind::Whitespace
        } else if c == '#' {
            while i < chars.len() && chars[i] != '\n' && chars[i] != '\r' {
                i += 1;
            }
            TokenKind::Comment
        } else if let Some(prefix_len) = string_prefix_len(&chars, i) {
            i = scan_string(&chars, i + prefix_len)?;
            TokenKind::String
        } else if c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            i = scan_number(&chars, i);
            TokenKind::Number
        } else if c.is_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            TokenKind::Name
        } else if let Some(len) = operator_len(&chars, i) {
            i += len;
            TokenKind::Operator
        } else {
            i += 1;
            TokenKind::Unknown
        };

        tokens.push(Token::new(kind, chars[start..i].iter().collect::<String>()));
    }

    Some(tokens)
}

/// Length of the string prefix at `i` if a string literal starts there.
fn string_prefix_len(chars: &[char], i: usize) -> Option<usize> {
    if matches!(chars.get(i), Some('\'') | Some('"')) {
        return Some(0);
    }
    // A prefix only counts at the start of a word: `bar'x'` is not a string.
    if i > 0 && (chars[i - 1].is_alphanumeric() || chars[i - 1] == '_') {
        return None;
    }
    STRING_PREFIXES.iter().find_map(|prefix| {
        let len = prefix.len();
        let candidate: String = chars.get(i..i + len)?.iter().collect();
        let quote = chars.get(i + len)?;
        (candidate.to_lowercase() == *prefix && (*quote == '\'' || *quote == '"')).then_some(len)
    })
}

/// Scan a string literal whose opening quote is at `i`. Returns the index
/// just past the closing quote, or `None` if unterminated.
fn scan_string(chars: &[char], i: usize) -> Option<usize> {
    let quote = chars[i];
    let triple = chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote);
    let mut j = if triple { i + 3 } else { i + 1 };

    while j < chars.len() {
        let c = chars[j];
        if c == '\\' {
            j += 2;
            continue;
        }
        if triple {
            if c == quote && chars.get(j + 1) == Some(&quote) && chars.get(j + 2) == Some(&quote) {
                return Some(j + 3);
            }
        } else if c == quote {
            return Some(j + 1);
        } else if c == '\n' {
            return None;
        }
        j += 1;
    }
    None
}

fn scan_number(chars: &[char], mut i: usize) -> usize {
    let radix_prefix = chars[i] == '0'
        && chars
            .get(i + 1)
            .is_some_and(|c| matches!(c, 'x' | 'X' | 'o' | 'O' | 'b' | 'B'));
    if radix_prefix {
        i += 2;
        while i < chars.len() && (chars[i].is_ascii_hexdigit() || chars[i] == '_') {
            i += 1;
        }
        return i;
    }

    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
        i += 1;
    }
    if chars.get(i) == Some(&'.') && !chars.get(i + 1).is_some_and(|c| *c == '.') {
        i += 1;
        while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
            i += 1;
        }
    }
    if matches!(chars.get(i), Some('e') | Some('E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+') | Some('-')) {
            j += 1;
        }
        if chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
            i = j;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
                i += 1;
            }
        }
    }
    if matches!(chars.get(i), Some('j') | Some('J')) {
        i += 1;
    }
    i
}

fn operator_len(chars: &[char], i: usize) -> Option<usize> {
    let window = |n: usize| -> Option<String> { chars.get(i..i + n).map(|s| s.iter().collect()) };

    if window(3).is_some_and(|w| THREE_CHAR_OPS.contains(&w.as_str())) {
        return Some(3);
    }
    if window(2).is_some_and(|w| TWO_CHAR_OPS.contains(&w.as_str())) {
        return Some(2);
    }
    ONE_CHAR_OPS.contains(chars[i]).then_some(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kinds(code: &str) -> Vec<TokenKind> {
        tokenize(code).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn texts(code: &str) -> Vec<String> {
        tokenize(code)
            .unwrap()
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn slice_expression() {
        assert_eq!(texts("word[1:4]"), vec!["word", "[", "1", ":", "4", "]"]);
        assert_eq!(texts("items[ -1 ]"), vec!["items", "[", "-", "1", "]"]);
    }

    #[test]
    fn comments_and_whitespace_are_trivia() {
        assert_eq!(
            kinds("x = 1  # one\n"),
            vec![
                TokenKind::Name,
                TokenKind::Whitespace,
                TokenKind::Operator,
                TokenKind::Whitespace,
                TokenKind::Number,
                TokenKind::Whitespace,
                TokenKind::Comment,
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn operators_take_longest_match() {
        assert_eq!(texts("a **= 2 // 3"), vec!["a", "**=", "2", "//", "3"]);
        assert_eq!(texts("if (n := 10) >= 5"), vec!["if", "(", "n", ":=", "10", ")", ">=", "5"]);
    }

    #[test]
    fn string_prefixes_and_triple_quotes() {
        assert_eq!(texts("f'{name} is {age}'"), vec!["f'{name} is {age}'"]);
        assert_eq!(texts("rb\"\\d+\""), vec!["rb\"\\d+\""]);
        assert_eq!(texts("'''a\n'b'\n'''"), vec!["'''a\n'b'\n'''"]);
        assert_eq!(texts("'it\\'s'"), vec!["'it\\'s'"]);
        // Not a prefix when glued to a name.
        assert_eq!(texts("buf'x'"), vec!["buf", "'x'"]);
    }

    #[test]
    fn unterminated_string_fails() {
        assert!(tokenize("'abc").is_none());
        assert!(tokenize("\"abc\ndef\"").is_none());
        assert!(tokenize("'''never closed").is_none());
    }

    #[test]
    fn numbers() {
        assert_eq!(
            texts("1_000 0xFF 3.14 .5 1e-3 2j"),
            vec!["1_000", "0xFF", "3.14", ".5", "1e-3", "2j"]
        );
        assert_eq!(
            texts("range(1, 10)[::2]"),
            vec!["range", "(", "1", ",", "10", ")", "[", ":", ":", "2", "]"]
        );
    }

    #[test]
    fn unknown_characters_do_not_fail() {
        assert_eq!(kinds("$"), vec![TokenKind::Unknown]);
        assert_eq!(kinds("a ? b")[2], TokenKind::Unknown);
    }

    #[test]
    fn line_continuation_is_whitespace() {
        assert_eq!(texts("total = a + \\\n    b"), vec!["total", "=", "a", "+", "b"]);
    }

    #[test]
    fn crlf_is_one_newline() {
        assert_eq!(
            kinds("a\r\nb"),
            vec![TokenKind::Name, TokenKind::Newline, TokenKind::Name]
        );
    }

    proptest! {
        #[test]
        fn tokens_cover_the_input(code in "[a-z0-9_ .,:()\\[\\]{}'\"#=+\\-*/\\\\\n]{0,40}") {
            if let Some(tokens) = tokenize(&code) {
                let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
                prop_assert_eq!(joined, code);
            }
        }
    }
}
