//! Brace Expansion
//!
//! Purely textual, runs before any variable is read: one word in, a list
//! of words out. `{a,b}` groups cross-multiply with their surroundings and
//! with sibling groups; `{N..M}` and `{a..z}` generate ranges.

use crate::ast::{Word, WordPart};

/// Expand every brace group/range in the word. A word with none expands to
/// itself.
pub fn expand_braces(word: &Word) -> Vec<Word> {
    let mut results: Vec<Vec<WordPart>> = vec![Vec::new()];

    for part in &word.parts {
        match part {
            WordPart::BraceGroup(alternatives) => {
                let mut next = Vec::new();
                for base in &results {
                    for alternative in alternatives {
                        // Alternatives may themselves contain nested braces.
                        for expanded in expand_braces(alternative) {
                            let mut combined = base.clone();
                            combined.extend(expanded.parts);
                            next.push(combined);
                        }
                    }
                }
                results = next;
            }
            WordPart::BraceRange { start, end, step } => {
                let items = generate_range(start, end, *step);
                let mut next = Vec::new();
                for base in &results {
                    for item in &items {
                        let mut combined = base.clone();
                        combined.push(WordPart::Literal(item.clone()));
                        next.push(combined);
                    }
                }
                results = next;
            }
            other => {
                for base in &mut results {
                    base.push(other.clone());
                }
            }
        }
    }

    results.into_iter().map(|parts| Word { parts }).collect()
}

fn generate_range(start: &str, end: &str, step: Option<i64>) -> Vec<String> {
    if let (Ok(a), Ok(b)) = (start.parse::<i64>(), end.parse::<i64>()) {
        let width = numeric_pad_width(start, end);
        return numeric_range(a, b, step)
            .into_iter()
            .map(|n| {
                if n < 0 {
                    format!("-{:0width$}", -n, width = width.saturating_sub(1))
                } else {
                    format!("{:0width$}", n, width = width)
                }
            })
            .collect();
    }

    let (Some(a), Some(b)) = (start.chars().next(), end.chars().next()) else {
        return vec![format!("{{{}..{}}}", start, end)];
    };
    let step = step.unwrap_or(1).unsigned_abs().max(1) as usize;
    let (a, b) = (a as u32, b as u32);
    let codes: Vec<u32> = if a <= b {
        (a..=b).step_by(step).collect()
    } else {
        (b..=a).rev().step_by(step).collect()
    };
    codes.into_iter().filter_map(char::from_u32).map(String::from).collect()
}

fn numeric_range(a: i64, b: i64, step: Option<i64>) -> Vec<i64> {
    let magnitude = step.unwrap_or(1).abs().max(1);
    let mut out = Vec::new();
    if a <= b {
        let mut n = a;
        while n <= b {
            out.push(n);
            n += magnitude;
        }
    } else {
        let mut n = a;
        while n >= b {
            out.push(n);
            n -= magnitude;
        }
    }
    out
}

/// Bash pads with zeros when either endpoint has a leading zero.
fn numeric_pad_width(start: &str, end: &str) -> usize {
    let has_pad = |s: &str| {
        let digits = s.strip_prefix('-').unwrap_or(s);
        digits.len() > 1 && digits.starts_with('0')
    };
    if has_pad(start) || has_pad(end) {
        start.trim_start_matches('-').len().max(end.trim_start_matches('-').len())
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::words::parse_word;

    fn expand(raw: &str) -> Vec<String> {
        let word = parse_word(raw, 1, 1).unwrap();
        expand_braces(&word)
            .into_iter()
            .map(|w| {
                w.parts
                    .iter()
                    .map(|p| match p {
                        WordPart::Literal(s) => s.clone(),
                        other => panic!("non-literal part {:?}", other),
                    })
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_simple_group() {
        assert_eq!(expand("{a,b,c}"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_prefix_suffix() {
        assert_eq!(expand("x{a,b}y"), vec!["xay", "xby"]);
    }

    #[test]
    fn test_sibling_groups_cross_product() {
        assert_eq!(expand("{a,b}{1,2}"), vec!["a1", "a2", "b1", "b2"]);
    }

    #[test]
    fn test_nested_groups() {
        assert_eq!(expand("{a,{b,c}}"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_alternative() {
        assert_eq!(expand("a{,b}"), vec!["a", "ab"]);
    }

    #[test]
    fn test_numeric_range() {
        assert_eq!(expand("{1..3}"), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_reversed_numeric_range() {
        assert_eq!(expand("{3..1}"), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_negative_range() {
        assert_eq!(expand("{-1..1}"), vec!["-1", "0", "1"]);
    }

    #[test]
    fn test_range_with_step() {
        assert_eq!(expand("{1..9..2}"), vec!["1", "3", "5", "7", "9"]);
    }

    #[test]
    fn test_zero_padded_range() {
        assert_eq!(expand("{01..03}"), vec!["01", "02", "03"]);
    }

    #[test]
    fn test_char_range() {
        assert_eq!(expand("{a..d}"), vec!["a", "b", "c", "d"]);
        assert_eq!(expand("{d..a}"), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn test_no_braces_passthrough() {
        assert_eq!(expand("plain"), vec!["plain"]);
    }
}
