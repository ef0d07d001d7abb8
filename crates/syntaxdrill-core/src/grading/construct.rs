//! Target-construct detection.
//!
//! Independent of correctness: a correct answer that avoids the construct an
//! exercise is drilling gets a coaching tip, not a penalty.

use crate::model::TargetConstruct;

/// Remove `#` comments, leaving `#` inside string literals alone.
fn strip_comments(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for line in code.lines() {
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for c in line.chars() {
            match quote {
                Some(q) => {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == q {
                        quote = None;
                    }
                }
                None if c == '#' => break,
                None if c == '\'' || c == '"' => quote = Some(c),
                None => {}
            }
            out.push(c);
        }
        out.push('\n');
    }
    out
}

/// Whether the answer uses any of the construct's markers outside comments.
pub fn construct_used(answer: &str, construct: &TargetConstruct) -> bool {
    let code = strip_comments(answer);
    construct.markers.iter().any(|m| code.contains(m.as_str()))
}

/// `(used_target_construct, coaching_feedback)` for a graded answer.
pub fn evaluate_construct(
    answer: &str,
    is_correct: bool,
    construct: Option<&TargetConstruct>,
) -> (Option<bool>, Option<String>) {
    let Some(construct) = construct else {
        return (None, None);
    };
    let used = construct_used(answer, construct);
    let feedback = (is_correct && !used).then(|| construct.tip.clone());
    (Some(used), feedback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice() -> TargetConstruct {
        TargetConstruct {
            name: "slice".into(),
            markers: vec![":".into()],
            tip: "Nice! Next time try a slice like items[:3].".into(),
        }
    }

    #[test]
    fn comments_do_not_count() {
        assert!(!construct_used("first_three(items)  # items[:3]", &slice()));
        assert!(construct_used("items[:3]  # slice", &slice()));
        assert!(construct_used("'#' + s[1:]", &slice()));
    }

    #[test]
    fn correct_answer_without_construct_gets_tip() {
        let (used, feedback) = evaluate_construct("items[0] , items[1]", true, Some(&slice()));
        assert_eq!(used, Some(false));
        assert!(feedback.unwrap().contains("slice"));
    }

    #[test]
    fn incorrect_answer_gets_no_tip() {
        let (used, feedback) = evaluate_construct("items[0]", false, Some(&slice()));
        assert_eq!(used, Some(false));
        assert!(feedback.is_none());
    }

    #[test]
    fn no_construct_is_null() {
        assert_eq!(evaluate_construct("x", true, None), (None, None));
    }
}
