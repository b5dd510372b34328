//! IFS Field Splitting
//!
//! Takes the flat piece stream an expanded word produced and cuts it into
//! fields. Quoted text never splits; unquoted text splits on IFS with the
//! POSIX whitespace-collapsing rules. Output fields are glob-pattern
//! strings: quoted text arrives pre-escaped so later pathname expansion
//! leaves it alone.

use super::pattern::{escape_glob, has_glob_chars};

/// One unit of expanded text, or a hard field boundary (from `"$@"`).
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text { text: String, quoted: bool },
    Break,
}

/// A split field, still in glob-pattern form.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Text with quoted spans backslash-escaped.
    pub pattern: String,
    /// True when an unquoted glob metacharacter is present.
    pub globbable: bool,
}

/// Split a piece stream into fields using the given IFS.
pub fn split_fields(pieces: &[Piece], ifs: &str) -> Vec<Field> {
    let mut fields: Vec<Field> = Vec::new();
    let mut current = String::new();
    let mut started = false;

    let push_field = |fields: &mut Vec<Field>, current: &mut String| {
        let pattern = std::mem::take(current);
        let globbable = has_glob_chars(&pattern);
        fields.push(Field { pattern, globbable });
    };

    for piece in pieces {
        match piece {
            Piece::Break => {
                if started {
                    push_field(&mut fields, &mut current);
                    started = false;
                }
            }
            Piece::Text { text, quoted: true } => {
                current.push_str(&escape_glob(text));
                started = true;
            }
            Piece::Text { text, quoted: false } => {
                for c in text.chars() {
                    if ifs.contains(c) {
                        if c.is_ascii_whitespace() {
                            // Whitespace runs collapse and never produce
                            // empty fields.
                            if started {
                                push_field(&mut fields, &mut current);
                                started = false;
                            }
                        } else {
                            // A non-whitespace separator always terminates
                            // the current (possibly empty) field.
                            push_field(&mut fields, &mut current);
                            started = false;
                        }
                    } else {
                        current.push(c);
                        started = true;
                    }
                }
            }
        }
    }

    if started {
        push_field(&mut fields, &mut current);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const IFS: &str = " \t\n";

    fn unquoted(text: &str) -> Piece {
        Piece::Text { text: text.to_string(), quoted: false }
    }

    fn quoted(text: &str) -> Piece {
        Piece::Text { text: text.to_string(), quoted: true }
    }

    fn patterns(pieces: &[Piece], ifs: &str) -> Vec<String> {
        split_fields(pieces, ifs).into_iter().map(|f| f.pattern).collect()
    }

    #[test]
    fn test_whitespace_split() {
        assert_eq!(patterns(&[unquoted("a b  c")], IFS), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_leading_trailing_whitespace_dropped() {
        assert_eq!(patterns(&[unquoted("  a b  ")], IFS), vec!["a", "b"]);
    }

    #[test]
    fn test_quoted_not_split() {
        assert_eq!(patterns(&[quoted("a b")], IFS), vec!["a b"]);
    }

    #[test]
    fn test_quoted_empty_is_a_field() {
        assert_eq!(patterns(&[quoted("")], IFS), vec![""]);
    }

    #[test]
    fn test_unquoted_empty_is_no_field() {
        assert!(patterns(&[unquoted("")], IFS).is_empty());
    }

    #[test]
    fn test_adjacent_pieces_join() {
        // x$y where y="1 2" -> "x1" "2"
        assert_eq!(patterns(&[unquoted("x"), unquoted("1 2")], IFS), vec!["x1", "2"]);
    }

    #[test]
    fn test_break_forces_boundary() {
        assert_eq!(
            patterns(&[quoted("a"), Piece::Break, quoted("b")], IFS),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_colon_ifs_empty_fields() {
        assert_eq!(patterns(&[unquoted("a::b")], ":"), vec!["a", "", "b"]);
        assert_eq!(patterns(&[unquoted(":a")], ":"), vec!["", "a"]);
        // A trailing separator produces no extra field.
        assert_eq!(patterns(&[unquoted("a:")], ":"), vec!["a"]);
    }

    #[test]
    fn test_quoted_glob_chars_escaped() {
        let fields = split_fields(&[quoted("*")], IFS);
        assert_eq!(fields[0].pattern, "\\*");
        assert!(!fields[0].globbable);
    }

    #[test]
    fn test_unquoted_glob_chars_kept() {
        let fields = split_fields(&[unquoted("*.txt")], IFS);
        assert_eq!(fields[0].pattern, "*.txt");
        assert!(fields[0].globbable);
    }
}
