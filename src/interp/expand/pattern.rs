//! Shell Pattern Matching
//!
//! fnmatch-style patterns (`*`, `?`, `[...]`) shared by pathname expansion,
//! `case` arms and the `#`/`%`/`/` parameter operators. A backslash escapes
//! the following character, which is how quoted text is kept literal after
//! expansion.

/// Does `pattern` match all of `text`?
pub fn pattern_match(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();
    match_here(&pat, &txt)
}

fn match_here(pat: &[char], txt: &[char]) -> bool {
    if pat.is_empty() {
        return txt.is_empty();
    }
    match pat[0] {
        '*' => {
            // Collapse star runs, then try every split point.
            let rest = &pat[1..];
            for skip in 0..=txt.len() {
                if match_here(rest, &txt[skip..]) {
                    return true;
                }
            }
            false
        }
        '?' => !txt.is_empty() && match_here(&pat[1..], &txt[1..]),
        '[' => match parse_bracket(pat) {
            Some((matcher, consumed)) => {
                !txt.is_empty() && matcher.matches(txt[0]) && match_here(&pat[consumed..], &txt[1..])
            }
            // Unterminated bracket: literal '['.
            None => !txt.is_empty() && txt[0] == '[' && match_here(&pat[1..], &txt[1..]),
        },
        '\\' if pat.len() > 1 => {
            !txt.is_empty() && txt[0] == pat[1] && match_here(&pat[2..], &txt[1..])
        }
        c => !txt.is_empty() && txt[0] == c && match_here(&pat[1..], &txt[1..]),
    }
}

struct BracketMatcher {
    negated: bool,
    singles: Vec<char>,
    ranges: Vec<(char, char)>,
}

impl BracketMatcher {
    fn matches(&self, c: char) -> bool {
        let hit = self.singles.contains(&c) || self.ranges.iter().any(|(lo, hi)| *lo <= c && c <= *hi);
        hit != self.negated
    }
}

/// Parse `[...]` starting at `pat[0] == '['`. Returns the matcher and how
/// many pattern chars it consumed, or `None` when unterminated.
fn parse_bracket(pat: &[char]) -> Option<(BracketMatcher, usize)> {
    let mut i = 1;
    let negated = matches!(pat.get(i), Some('!') | Some('^'));
    if negated {
        i += 1;
    }
    let mut singles = Vec::new();
    let mut ranges = Vec::new();
    let mut first = true;
    loop {
        let c = *pat.get(i)?;
        if c == ']' && !first {
            return Some((BracketMatcher { negated, singles, ranges }, i + 1));
        }
        first = false;
        if pat.get(i + 1) == Some(&'-') && pat.get(i + 2).is_some_and(|c| *c != ']') {
            ranges.push((c, pat[i + 2]));
            i += 3;
        } else {
            singles.push(c);
            i += 1;
        }
    }
}

/// True if the string contains an unescaped glob metacharacter.
pub fn has_glob_chars(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '*' | '?' | '[' => return true,
            _ => i += 1,
        }
    }
    false
}

/// Backslash-escape glob metacharacters so quoted text stays literal.
pub fn escape_glob(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Remove one level of backslash escaping (the inverse of [`escape_glob`]).
pub fn unescape_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Prefix/suffix removal and replacement (parameter operators)
// ---------------------------------------------------------------------------

/// `${var#pat}` / `${var##pat}`.
pub fn remove_prefix(value: &str, pattern: &str, longest: bool) -> String {
    let chars: Vec<char> = value.chars().collect();
    let indices: Vec<usize> = (0..=chars.len()).collect();
    let candidates: Box<dyn Iterator<Item = &usize> + '_> =
        if longest { Box::new(indices.iter().rev()) } else { Box::new(indices.iter()) };
    for &len in candidates {
        let prefix: String = chars[..len].iter().collect();
        if pattern_match(pattern, &prefix) {
            return chars[len..].iter().collect();
        }
    }
    value.to_string()
}

/// `${var%pat}` / `${var%%pat}`.
pub fn remove_suffix(value: &str, pattern: &str, longest: bool) -> String {
    let chars: Vec<char> = value.chars().collect();
    let indices: Vec<usize> = (0..=chars.len()).collect();
    let candidates: Box<dyn Iterator<Item = &usize> + '_> =
        if longest { Box::new(indices.iter()) } else { Box::new(indices.iter().rev()) };
    for &start in candidates {
        let suffix: String = chars[start..].iter().collect();
        if pattern_match(pattern, &suffix) {
            return chars[..start].iter().collect();
        }
    }
    value.to_string()
}

/// `${var/pat/repl}` / `${var//pat/repl}` — longest match at the leftmost
/// position, like bash.
pub fn replace(value: &str, pattern: &str, replacement: &str, all: bool) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::new();
    let mut start = 0;
    while start < chars.len() {
        let mut matched_end = None;
        for end in (start..=chars.len()).rev() {
            let slice: String = chars[start..end].iter().collect();
            if pattern_match(pattern, &slice) {
                matched_end = Some(end);
                break;
            }
        }
        match matched_end {
            Some(end) if end > start => {
                out.push_str(replacement);
                start = end;
                if !all {
                    out.extend(&chars[start..]);
                    return out;
                }
            }
            _ => {
                out.push(chars[start]);
                start += 1;
            }
        }
    }
    // An empty-string match only applies when the value itself is empty.
    if chars.is_empty() && pattern_match(pattern, "") {
        out.push_str(replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        assert!(pattern_match("abc", "abc"));
        assert!(!pattern_match("abc", "abd"));
        assert!(!pattern_match("abc", "abcd"));
    }

    #[test]
    fn test_star() {
        assert!(pattern_match("*", ""));
        assert!(pattern_match("*", "anything"));
        assert!(pattern_match("a*c", "abc"));
        assert!(pattern_match("a*c", "ac"));
        assert!(pattern_match("*.txt", "notes.txt"));
        assert!(!pattern_match("*.txt", "notes.md"));
    }

    #[test]
    fn test_question() {
        assert!(pattern_match("a?c", "abc"));
        assert!(!pattern_match("a?c", "ac"));
    }

    #[test]
    fn test_bracket_class() {
        assert!(pattern_match("[abc]", "b"));
        assert!(!pattern_match("[abc]", "d"));
        assert!(pattern_match("[a-z]x", "qx"));
        assert!(pattern_match("[!a-z]", "Q"));
        assert!(pattern_match("[^0-9]", "x"));
    }

    #[test]
    fn test_bracket_literal_close() {
        // ']' first in the set is literal.
        assert!(pattern_match("[]]", "]"));
    }

    #[test]
    fn test_escaped_star_is_literal() {
        assert!(pattern_match("\\*", "*"));
        assert!(!pattern_match("\\*", "x"));
    }

    #[test]
    fn test_escape_roundtrip() {
        let raw = "a*b?c[d]e\\f";
        assert_eq!(unescape_glob(&escape_glob(raw)), raw);
        assert!(!has_glob_chars(&escape_glob(raw)));
        assert!(has_glob_chars(raw));
    }

    #[test]
    fn test_remove_prefix() {
        assert_eq!(remove_prefix("a/b/c", "*/", false), "b/c");
        assert_eq!(remove_prefix("a/b/c", "*/", true), "c");
        assert_eq!(remove_prefix("abc", "x*", false), "abc");
    }

    #[test]
    fn test_remove_suffix() {
        assert_eq!(remove_suffix("file.tar.gz", ".*", false), "file.tar");
        assert_eq!(remove_suffix("file.tar.gz", ".*", true), "file");
        assert_eq!(remove_suffix("abc", "*x", false), "abc");
    }

    #[test]
    fn test_replace_first_and_all() {
        assert_eq!(replace("aaa", "a", "b", false), "baa");
        assert_eq!(replace("aaa", "a", "b", true), "bbb");
        assert_eq!(replace("hello world", "o", "0", true), "hell0 w0rld");
        assert_eq!(replace("abc", "x", "y", false), "abc");
    }

    #[test]
    fn test_replace_longest_match() {
        assert_eq!(replace("aab", "a*", "X", false), "X");
    }
}
