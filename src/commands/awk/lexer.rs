//! AWK Lexer
//!
//! The interesting part is `/`: division after something that can end an
//! expression (number, string, identifier, `)`, `]`, `++`/`--`), a regex
//! literal everywhere else.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::ast::{Tok, Token};

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Tok> = {
        let mut m = HashMap::new();
        m.insert("BEGIN", Tok::Begin);
        m.insert("END", Tok::End);
        m.insert("function", Tok::Function);
        m.insert("if", Tok::If);
        m.insert("else", Tok::Else);
        m.insert("while", Tok::While);
        m.insert("do", Tok::Do);
        m.insert("for", Tok::For);
        m.insert("in", Tok::In);
        m.insert("break", Tok::Break);
        m.insert("continue", Tok::Continue);
        m.insert("next", Tok::Next);
        m.insert("exit", Tok::Exit);
        m.insert("return", Tok::Return);
        m.insert("delete", Tok::Delete);
        m.insert("print", Tok::Print);
        m.insert("printf", Tok::Printf);
        m.insert("getline", Tok::Getline);
        m
    };
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;
    let mut line = 1;

    // Can the previous token end an expression? If so, `/` divides.
    let prev_ends_expr = |tokens: &[Token]| {
        matches!(
            tokens.last().map(|t| &t.tok),
            Some(Tok::Num(_))
                | Some(Tok::Str(_))
                | Some(Tok::Ident(_))
                | Some(Tok::RParen)
                | Some(Tok::RBracket)
                | Some(Tok::Incr)
                | Some(Tok::Decr)
        )
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\r' => i += 1,
            '\\' if chars.get(i + 1) == Some(&'\n') => {
                // Line continuation.
                i += 2;
                line += 1;
            }
            '\n' => {
                tokens.push(Token { tok: Tok::Newline, line });
                line += 1;
                i += 1;
            }
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '"' => {
                i += 1;
                let mut s = String::new();
                loop {
                    match chars.get(i) {
                        None => return Err(format!("line {}: unterminated string", line)),
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            i += 1;
                            match chars.get(i) {
                                Some('n') => s.push('\n'),
                                Some('t') => s.push('\t'),
                                Some('r') => s.push('\r'),
                                Some('\\') => s.push('\\'),
                                Some('"') => s.push('"'),
                                Some('/') => s.push('/'),
                                Some('a') => s.push('\x07'),
                                Some('b') => s.push('\x08'),
                                Some('f') => s.push('\x0c'),
                                Some('v') => s.push('\x0b'),
                                Some(&other) => {
                                    s.push('\\');
                                    s.push(other);
                                }
                                None => {
                                    return Err(format!("line {}: unterminated string", line))
                                }
                            }
                            i += 1;
                        }
                        Some(&other) => {
                            s.push(other);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token { tok: Tok::Str(s), line });
            }
            '/' if !prev_ends_expr(&tokens) => {
                // Regex literal.
                i += 1;
                let mut re = String::new();
                let mut in_class = false;
                loop {
                    match chars.get(i) {
                        None => return Err(format!("line {}: unterminated regex", line)),
                        Some('\\') => {
                            re.push('\\');
                            i += 1;
                            if let Some(&next) = chars.get(i) {
                                re.push(next);
                                i += 1;
                            }
                        }
                        Some('[') => {
                            in_class = true;
                            re.push('[');
                            i += 1;
                        }
                        Some(']') => {
                            in_class = false;
                            re.push(']');
                            i += 1;
                        }
                        Some('/') if !in_class => {
                            i += 1;
                            break;
                        }
                        Some('\n') => return Err(format!("line {}: unterminated regex", line)),
                        Some(&other) => {
                            re.push(other);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token { tok: Tok::Re(re), line });
            }
            '0'..='9' | '.' if c != '.' || chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent suffix.
                if chars.get(i).is_some_and(|c| *c == 'e' || *c == 'E') {
                    let mut j = i + 1;
                    if chars.get(j).is_some_and(|c| *c == '+' || *c == '-') {
                        j += 1;
                    }
                    if chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value: f64 = text
                    .parse()
                    .map_err(|_| format!("line {}: bad number '{}'", line, text))?;
                tokens.push(Token { tok: Tok::Num(value), line });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let tok = KEYWORDS.get(word.as_str()).cloned().unwrap_or(Tok::Ident(word));
                tokens.push(Token { tok, line });
            }
            _ => {
                let next = chars.get(i + 1).copied();
                let (tok, len) = match (c, next) {
                    ('+', Some('+')) => (Tok::Incr, 2),
                    ('+', Some('=')) => (Tok::AddAssign, 2),
                    ('+', _) => (Tok::Plus, 1),
                    ('-', Some('-')) => (Tok::Decr, 2),
                    ('-', Some('=')) => (Tok::SubAssign, 2),
                    ('-', _) => (Tok::Minus, 1),
                    ('*', Some('*')) => (Tok::Caret, 2), // ** is ^
                    ('*', Some('=')) => (Tok::MulAssign, 2),
                    ('*', _) => (Tok::Star, 1),
                    ('/', Some('=')) => (Tok::DivAssign, 2),
                    ('/', _) => (Tok::Slash, 1),
                    ('%', Some('=')) => (Tok::ModAssign, 2),
                    ('%', _) => (Tok::Percent, 1),
                    ('^', Some('=')) => (Tok::PowAssign, 2),
                    ('^', _) => (Tok::Caret, 1),
                    ('=', Some('=')) => (Tok::Eq, 2),
                    ('=', _) => (Tok::Assign, 1),
                    ('!', Some('=')) => (Tok::Ne, 2),
                    ('!', Some('~')) => (Tok::NotMatch, 2),
                    ('!', _) => (Tok::Not, 1),
                    ('<', Some('=')) => (Tok::Le, 2),
                    ('<', _) => (Tok::Lt, 1),
                    ('>', Some('=')) => (Tok::Ge, 2),
                    ('>', Some('>')) => (Tok::Append, 2),
                    ('>', _) => (Tok::Gt, 1),
                    ('~', _) => (Tok::Match, 1),
                    ('&', Some('&')) => (Tok::And, 2),
                    ('|', Some('|')) => (Tok::Or, 2),
                    ('|', _) => (Tok::Pipe, 1),
                    ('?', _) => (Tok::Question, 1),
                    (':', _) => (Tok::Colon, 1),
                    ('$', _) => (Tok::Dollar, 1),
                    (',', _) => (Tok::Comma, 1),
                    (';', _) => (Tok::Semi, 1),
                    ('(', _) => (Tok::LParen, 1),
                    (')', _) => (Tok::RParen, 1),
                    ('{', _) => (Tok::LBrace, 1),
                    ('}', _) => (Tok::RBrace, 1),
                    ('[', _) => (Tok::LBracket, 1),
                    (']', _) => (Tok::RBracket, 1),
                    _ => return Err(format!("line {}: unexpected character '{}'", line, c)),
                };
                tokens.push(Token { tok, line });
                i += len;
            }
        }
    }
    tokens.push(Token { tok: Tok::Eof, line });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(source: &str) -> Vec<Tok> {
        tokenize(source).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(toks("42")[0], Tok::Num(42.0));
        assert_eq!(toks("3.5")[0], Tok::Num(3.5));
        assert_eq!(toks("1e3")[0], Tok::Num(1000.0));
        assert_eq!(toks(".5")[0], Tok::Num(0.5));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(toks("\"a\\tb\\n\"")[0], Tok::Str("a\tb\n".to_string()));
    }

    #[test]
    fn test_keywords_vs_idents() {
        assert_eq!(toks("BEGIN")[0], Tok::Begin);
        assert_eq!(toks("print")[0], Tok::Print);
        assert_eq!(toks("begin")[0], Tok::Ident("begin".to_string()));
        assert_eq!(toks("x")[0], Tok::Ident("x".to_string()));
    }

    #[test]
    fn test_regex_at_start() {
        assert_eq!(toks("/abc/")[0], Tok::Re("abc".to_string()));
    }

    #[test]
    fn test_regex_after_operator() {
        let ts = toks("$0 ~ /x+/");
        assert_eq!(ts[3], Tok::Re("x+".to_string()));
    }

    #[test]
    fn test_division_after_value() {
        let ts = toks("a / b");
        assert_eq!(ts[1], Tok::Slash);
        let ts = toks("(a) / 2");
        assert_eq!(ts[3], Tok::Slash);
    }

    #[test]
    fn test_regex_with_class_containing_slash() {
        assert_eq!(toks("/[/]/")[0], Tok::Re("[/]".to_string()));
    }

    #[test]
    fn test_operators() {
        assert_eq!(toks("a += 1")[1], Tok::AddAssign);
        assert_eq!(toks("a != b")[1], Tok::Ne);
        assert_eq!(toks("a !~ b")[1], Tok::NotMatch);
        assert_eq!(toks("i++")[1], Tok::Incr);
        assert_eq!(toks("x >> f")[1], Tok::Append);
        assert_eq!(toks("2 ** 3")[1], Tok::Caret);
    }

    #[test]
    fn test_comment_and_newline() {
        let ts = toks("x # comment\ny");
        assert_eq!(ts[1], Tok::Newline);
        assert_eq!(ts[2], Tok::Ident("y".to_string()));
    }

    #[test]
    fn test_line_continuation() {
        let ts = toks("a \\\n b");
        assert!(!ts.contains(&Tok::Newline));
    }

    #[test]
    fn test_unterminated_regex_is_error() {
        assert!(tokenize("/abc").is_err());
        assert!(tokenize("\"abc").is_err());
    }
}
