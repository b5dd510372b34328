//! Word Parser
//!
//! Turns the raw text of a word token into its [`Word`] part structure:
//! quoting, parameter expansions, command/arithmetic substitution and brace
//! expansion candidates. The lexer already guarantees quotes and
//! substitution delimiters are balanced.

use crate::ast::{ParamExpansion, ParamOp, Word, WordPart};

use super::arith::parse_arith;
use super::ParseError;

/// Parse one raw word into its parts.
pub fn parse_word(raw: &str, line: usize, column: usize) -> Result<Word, ParseError> {
    let mut scanner = WordScanner::new(raw, line, column);
    let parts = scanner.parse_parts(Mode::Unquoted)?;
    Ok(Word { parts })
}

/// Parse a here-document body: expansions are live, quotes are plain text.
pub fn parse_heredoc_body(raw: &str, line: usize) -> Result<Word, ParseError> {
    let mut scanner = WordScanner::new(raw, line, 1);
    let parts = scanner.parse_parts(Mode::HereDoc)?;
    Ok(Word { parts })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Unquoted,
    DoubleQuoted,
    /// Double-quote expansion rules, but quote characters are literal.
    HereDoc,
}

struct WordScanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl WordScanner {
    fn new(raw: &str, line: usize, column: usize) -> Self {
        Self { chars: raw.chars().collect(), pos: 0, line, column }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.line, self.column)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        c
    }

    fn parse_parts(&mut self, mode: Mode) -> Result<Vec<WordPart>, ParseError> {
        let mut parts: Vec<WordPart> = Vec::new();
        let mut literal = String::new();

        macro_rules! flush {
            () => {
                if !literal.is_empty() {
                    parts.push(WordPart::Literal(std::mem::take(&mut literal)));
                }
            };
        }

        while !self.at_end() {
            let c = self.peek().unwrap();
            match c {
                '"' if mode == Mode::DoubleQuoted => break,
                '"' if mode == Mode::Unquoted => {
                    self.bump();
                    flush!();
                    let inner = self.parse_parts(Mode::DoubleQuoted)?;
                    if self.peek() != Some('"') {
                        return Err(self.error("unterminated double quote"));
                    }
                    self.bump();
                    parts.push(WordPart::DoubleQuoted(inner));
                }
                '\'' if mode == Mode::Unquoted => {
                    self.bump();
                    flush!();
                    let mut body = String::new();
                    loop {
                        match self.peek() {
                            Some('\'') => {
                                self.bump();
                                break;
                            }
                            Some(_) => body.push(self.bump()),
                            None => return Err(self.error("unterminated single quote")),
                        }
                    }
                    parts.push(WordPart::SingleQuoted(body));
                }
                '\\' => {
                    self.bump();
                    match self.peek() {
                        None => literal.push('\\'),
                        Some('\n') => {
                            // Continuation inside quotes; outside it was
                            // already removed by the lexer.
                            self.bump();
                        }
                        Some(next) => {
                            let quoted_escapes: &[char] = if mode == Mode::HereDoc {
                                &['$', '`', '\\']
                            } else {
                                &['$', '`', '"', '\\']
                            };
                            if mode == Mode::Unquoted {
                                self.bump();
                                flush!();
                                parts.push(WordPart::Escaped(next));
                            } else if quoted_escapes.contains(&next) {
                                self.bump();
                                flush!();
                                parts.push(WordPart::Escaped(next));
                            } else {
                                // Backslash stays literal in quoted contexts.
                                literal.push('\\');
                            }
                        }
                    }
                }
                '$' => {
                    self.bump();
                    flush!();
                    match self.parse_dollar()? {
                        Some(part) => parts.push(part),
                        None => literal.push('$'),
                    }
                }
                '`' => {
                    self.bump();
                    flush!();
                    let mut body = String::new();
                    loop {
                        match self.peek() {
                            Some('\\')
                                if matches!(self.peek_at(1), Some('`') | Some('\\') | Some('$')) =>
                            {
                                self.bump();
                                body.push(self.bump());
                            }
                            Some('`') => {
                                self.bump();
                                break;
                            }
                            Some(_) => body.push(self.bump()),
                            None => return Err(self.error("unterminated backquote")),
                        }
                    }
                    parts.push(WordPart::BacktickSub(body));
                }
                '{' if mode == Mode::Unquoted => {
                    self.bump();
                    flush!();
                    let mut brace_parts = self.parse_brace()?;
                    parts.append(&mut brace_parts);
                }
                _ => {
                    literal.push(self.bump());
                }
            }
        }

        if !literal.is_empty() {
            parts.push(WordPart::Literal(literal));
        }
        Ok(parts)
    }

    // -- dollar forms --------------------------------------------------------

    /// Parse what follows a `$`. Returns `None` when the `$` is literal.
    fn parse_dollar(&mut self) -> Result<Option<WordPart>, ParseError> {
        match self.peek() {
            Some('(') if self.peek_at(1) == Some('(') => {
                self.bump();
                self.bump();
                let inner = self.capture_until_double_rparen()?;
                let expr = parse_arith(&inner, self.line)?;
                Ok(Some(WordPart::ArithSub(expr)))
            }
            Some('(') => {
                self.bump();
                let inner = self.capture_balanced('(', ')')?;
                Ok(Some(WordPart::CommandSub(inner)))
            }
            Some('{') => {
                self.bump();
                let inner = self.capture_balanced('{', '}')?;
                let expansion = parse_param_brace(&inner, self.line, self.column)?;
                Ok(Some(WordPart::Param(Box::new(expansion))))
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(self.bump());
                    } else {
                        break;
                    }
                }
                Ok(Some(WordPart::Param(Box::new(ParamExpansion::plain(&name)))))
            }
            Some(c) if c.is_ascii_digit() => {
                // $10 means ${1}0.
                self.bump();
                Ok(Some(WordPart::Param(Box::new(ParamExpansion::plain(&c.to_string())))))
            }
            Some(c) if matches!(c, '?' | '#' | '@' | '*' | '$' | '!' | '-') => {
                self.bump();
                Ok(Some(WordPart::Param(Box::new(ParamExpansion::plain(&c.to_string())))))
            }
            _ => Ok(None),
        }
    }

    /// Capture text up to the matching closer, skipping quoted spans and
    /// nested pairs. The opener has already been consumed.
    fn capture_balanced(&mut self, open: char, close: char) -> Result<String, ParseError> {
        let mut depth = 1usize;
        let mut out = String::new();
        while !self.at_end() {
            let c = self.peek().unwrap();
            match c {
                '\\' => {
                    out.push(self.bump());
                    if !self.at_end() {
                        out.push(self.bump());
                    }
                }
                '\'' => {
                    out.push(self.bump());
                    while let Some(q) = self.peek() {
                        out.push(self.bump());
                        if q == '\'' {
                            break;
                        }
                    }
                }
                '"' => {
                    out.push(self.bump());
                    while let Some(q) = self.peek() {
                        if q == '\\' {
                            out.push(self.bump());
                            if !self.at_end() {
                                out.push(self.bump());
                            }
                            continue;
                        }
                        out.push(self.bump());
                        if q == '"' {
                            break;
                        }
                    }
                }
                _ if c == open => {
                    depth += 1;
                    out.push(self.bump());
                }
                _ if c == close => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(close);
                }
                _ => {
                    out.push(self.bump());
                }
            }
        }
        Err(self.error(format!("expected '{}'", close)))
    }

    /// Capture the inside of `$(( ... ))`.
    fn capture_until_double_rparen(&mut self) -> Result<String, ParseError> {
        let mut depth = 0usize;
        let mut out = String::new();
        while !self.at_end() {
            let c = self.peek().unwrap();
            if c == '(' {
                depth += 1;
            } else if c == ')' {
                if depth == 0 {
                    if self.peek_at(1) == Some(')') {
                        self.bump();
                        self.bump();
                        return Ok(out);
                    }
                    return Err(self.error("expected '))'"));
                }
                depth -= 1;
            }
            out.push(self.bump());
        }
        Err(self.error("expected '))'"))
    }

    // -- brace expansion -----------------------------------------------------

    /// Called after consuming `{`. Produces either a BraceGroup/BraceRange
    /// part or the literal pieces when the braces don't form one.
    fn parse_brace(&mut self) -> Result<Vec<WordPart>, ParseError> {
        let start = self.pos;
        let inner = match self.capture_balanced('{', '}') {
            Ok(inner) => inner,
            Err(_) => {
                // No matching close brace: `{` is literal.
                self.pos = start;
                return Ok(vec![WordPart::Literal("{".to_string())]);
            }
        };

        if let Some(range) = parse_brace_range(&inner) {
            return Ok(vec![range]);
        }

        let alternatives = split_top_level_commas(&inner);
        if alternatives.len() >= 2 {
            let mut words = Vec::with_capacity(alternatives.len());
            for alt in &alternatives {
                words.push(parse_word(alt, self.line, self.column)?);
            }
            return Ok(vec![WordPart::BraceGroup(words)]);
        }

        // `{x}` / `{}`: literal braces around the re-parsed content.
        let mut parts = vec![WordPart::Literal("{".to_string())];
        parts.extend(parse_word(&inner, self.line, self.column)?.parts);
        parts.push(WordPart::Literal("}".to_string()));
        Ok(parts)
    }
}

/// `{1..5}`, `{a..f}`, `{1..9..2}` — both endpoints integers or both single
/// letters, optional integer step.
fn parse_brace_range(inner: &str) -> Option<WordPart> {
    let segments: Vec<&str> = inner.split("..").collect();
    if segments.len() != 2 && segments.len() != 3 {
        return None;
    }
    let (start, end) = (segments[0], segments[1]);
    let step = if segments.len() == 3 {
        Some(segments[2].parse::<i64>().ok()?)
    } else {
        None
    };

    let both_numeric = start.parse::<i64>().is_ok() && end.parse::<i64>().is_ok();
    let both_alpha = start.len() == 1
        && end.len() == 1
        && start.chars().next().unwrap().is_ascii_alphabetic()
        && end.chars().next().unwrap().is_ascii_alphabetic();
    if !both_numeric && !both_alpha {
        return None;
    }
    Some(WordPart::BraceRange { start: start.to_string(), end: end.to_string(), step })
}

/// Split brace content on commas at the top nesting level, outside quotes.
fn split_top_level_commas(inner: &str) -> Vec<String> {
    let chars: Vec<char> = inner.chars().collect();
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                current.push(c);
                if i + 1 < chars.len() {
                    current.push(chars[i + 1]);
                    i += 1;
                }
            }
            '\'' => {
                current.push(c);
                i += 1;
                while i < chars.len() {
                    current.push(chars[i]);
                    if chars[i] == '\'' {
                        break;
                    }
                    i += 1;
                }
            }
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                pieces.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
        i += 1;
    }
    pieces.push(current);
    pieces
}

// ---------------------------------------------------------------------------
// ${...} bodies
// ---------------------------------------------------------------------------

/// Parse the contents of `${...}`.
fn parse_param_brace(inner: &str, line: usize, column: usize) -> Result<ParamExpansion, ParseError> {
    if inner.is_empty() {
        return Err(ParseError::new("bad substitution: ${}", line, column));
    }

    // ${#name} — length. A lone `#` or an operator after `#` means the
    // parameter named `#` instead.
    if let Some(rest) = inner.strip_prefix('#') {
        if !rest.is_empty() && parameter_name_len(rest) == rest.len() {
            return Ok(ParamExpansion { name: rest.to_string(), op: Some(ParamOp::Length) });
        }
    }

    let name_len = parameter_name_len(inner);
    if name_len == 0 {
        return Err(ParseError::new(format!("bad substitution: ${{{}}}", inner), line, column));
    }
    let name = inner[..name_len].to_string();
    let rest = &inner[name_len..];
    if rest.is_empty() {
        return Ok(ParamExpansion { name, op: None });
    }

    let parse_operand =
        |operand: &str| -> Result<Word, ParseError> { parse_word(operand, line, column) };

    let (op_text, operand): (&str, &str) = if let Some(r) = rest.strip_prefix(":-") {
        (":-", r)
    } else if let Some(r) = rest.strip_prefix(":=") {
        (":=", r)
    } else if let Some(r) = rest.strip_prefix(":+") {
        (":+", r)
    } else if let Some(r) = rest.strip_prefix(":?") {
        (":?", r)
    } else if let Some(r) = rest.strip_prefix("##") {
        ("##", r)
    } else if let Some(r) = rest.strip_prefix('#') {
        ("#", r)
    } else if let Some(r) = rest.strip_prefix("%%") {
        ("%%", r)
    } else if let Some(r) = rest.strip_prefix('%') {
        ("%", r)
    } else if let Some(r) = rest.strip_prefix("//") {
        ("//", r)
    } else if let Some(r) = rest.strip_prefix('/') {
        ("/", r)
    } else if let Some(r) = rest.strip_prefix('-') {
        ("-", r)
    } else if let Some(r) = rest.strip_prefix('=') {
        ("=", r)
    } else if let Some(r) = rest.strip_prefix('+') {
        ("+", r)
    } else if let Some(r) = rest.strip_prefix('?') {
        ("?", r)
    } else {
        return Err(ParseError::new(format!("bad substitution: ${{{}}}", inner), line, column));
    };

    let op = match op_text {
        ":-" | "-" => {
            ParamOp::Default { word: parse_operand(operand)?, check_empty: op_text == ":-" }
        }
        ":=" | "=" => {
            ParamOp::Assign { word: parse_operand(operand)?, check_empty: op_text == ":=" }
        }
        ":+" | "+" => {
            ParamOp::Alternate { word: parse_operand(operand)?, check_empty: op_text == ":+" }
        }
        ":?" | "?" => {
            ParamOp::Error { word: parse_operand(operand)?, check_empty: op_text == ":?" }
        }
        "#" | "##" => ParamOp::RemovePrefix {
            pattern: parse_operand(operand)?,
            longest: op_text == "##",
        },
        "%" | "%%" => ParamOp::RemoveSuffix {
            pattern: parse_operand(operand)?,
            longest: op_text == "%%",
        },
        "/" | "//" => {
            let (pattern, replacement) = split_replacement(operand);
            ParamOp::Replace {
                pattern: parse_operand(&pattern)?,
                replacement: parse_operand(&replacement)?,
                all: op_text == "//",
            }
        }
        _ => unreachable!(),
    };
    Ok(ParamExpansion { name, op: Some(op) })
}

/// Length of the leading parameter name: an identifier, one digit, or one
/// special character.
fn parameter_name_len(s: &str) -> usize {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            let mut len = 1;
            for c in chars {
                if c.is_ascii_alphanumeric() || c == '_' {
                    len += 1;
                } else {
                    break;
                }
            }
            len
        }
        Some(c) if c.is_ascii_digit() => 1,
        Some('?') | Some('#') | Some('@') | Some('*') | Some('$') | Some('!') | Some('-') => 1,
        _ => 0,
    }
}

/// Split `pat/repl` on the first unescaped `/`; a missing replacement is
/// the empty string.
fn split_replacement(operand: &str) -> (String, String) {
    let chars: Vec<char> = operand.chars().collect();
    let mut i = 0;
    let mut pattern = String::new();
    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                pattern.push(chars[i]);
                pattern.push(chars[i + 1]);
                i += 2;
            }
            '/' => {
                return (pattern, chars[i + 1..].iter().collect());
            }
            c => {
                pattern.push(c);
                i += 1;
            }
        }
    }
    (pattern, String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(raw: &str) -> Word {
        parse_word(raw, 1, 1).unwrap()
    }

    #[test]
    fn test_plain_literal() {
        assert_eq!(word("hello").parts, vec![WordPart::Literal("hello".to_string())]);
    }

    #[test]
    fn test_single_quotes() {
        assert_eq!(word("'a $b'").parts, vec![WordPart::SingleQuoted("a $b".to_string())]);
    }

    #[test]
    fn test_double_quotes_with_param() {
        let w = word("\"x$HOME\"");
        match &w.parts[0] {
            WordPart::DoubleQuoted(inner) => {
                assert_eq!(inner[0], WordPart::Literal("x".to_string()));
                assert!(matches!(&inner[1], WordPart::Param(p) if p.name == "HOME"));
            }
            other => panic!("expected double-quoted part, got {:?}", other),
        }
    }

    #[test]
    fn test_escape_outside_quotes() {
        assert_eq!(
            word("a\\ b").parts,
            vec![
                WordPart::Literal("a".to_string()),
                WordPart::Escaped(' '),
                WordPart::Literal("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_dollar_special_params() {
        for special in ["?", "#", "@", "*", "$", "!"] {
            let w = word(&format!("${}", special));
            assert!(matches!(&w.parts[0], WordPart::Param(p) if p.name == *special));
        }
    }

    #[test]
    fn test_positional_digit_boundary() {
        // $10 is ${1}0
        let w = word("$10");
        assert!(matches!(&w.parts[0], WordPart::Param(p) if p.name == "1"));
        assert_eq!(w.parts[1], WordPart::Literal("0".to_string()));
    }

    #[test]
    fn test_command_substitution() {
        let w = word("$(echo hi)");
        assert_eq!(w.parts, vec![WordPart::CommandSub("echo hi".to_string())]);
    }

    #[test]
    fn test_backtick_substitution() {
        let w = word("`echo hi`");
        assert_eq!(w.parts, vec![WordPart::BacktickSub("echo hi".to_string())]);
    }

    #[test]
    fn test_arith_substitution() {
        let w = word("$((1+2))");
        assert!(matches!(&w.parts[0], WordPart::ArithSub(_)));
    }

    #[test]
    fn test_param_default_operator() {
        let w = word("${x:-fallback}");
        match &w.parts[0] {
            WordPart::Param(p) => {
                assert_eq!(p.name, "x");
                assert!(matches!(
                    &p.op,
                    Some(ParamOp::Default { check_empty: true, .. })
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_param_nested_default() {
        let w = word("${x:-${y:-d}}");
        match &w.parts[0] {
            WordPart::Param(p) => match &p.op {
                Some(ParamOp::Default { word, .. }) => {
                    assert!(matches!(&word.parts[0], WordPart::Param(q) if q.name == "y"));
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_param_length() {
        let w = word("${#name}");
        assert!(
            matches!(&w.parts[0], WordPart::Param(p) if p.name == "name" && p.op == Some(ParamOp::Length))
        );
    }

    #[test]
    fn test_param_pattern_removal() {
        let w = word("${path##*/}");
        match &w.parts[0] {
            WordPart::Param(p) => {
                assert!(matches!(&p.op, Some(ParamOp::RemovePrefix { longest: true, .. })));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_param_replace() {
        let w = word("${s/a/b}");
        match &w.parts[0] {
            WordPart::Param(p) => match &p.op {
                Some(ParamOp::Replace { all, .. }) => assert!(!all),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_brace_group() {
        let w = word("{a,b,c}");
        match &w.parts[0] {
            WordPart::BraceGroup(words) => assert_eq!(words.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_brace_range_numeric() {
        let w = word("{1..5}");
        assert_eq!(
            w.parts[0],
            WordPart::BraceRange { start: "1".to_string(), end: "5".to_string(), step: None }
        );
    }

    #[test]
    fn test_brace_range_with_step() {
        let w = word("{1..9..2}");
        assert_eq!(
            w.parts[0],
            WordPart::BraceRange { start: "1".to_string(), end: "9".to_string(), step: Some(2) }
        );
    }

    #[test]
    fn test_single_element_brace_is_literal() {
        let w = word("{x}");
        assert_eq!(
            w.parts,
            vec![
                WordPart::Literal("{".to_string()),
                WordPart::Literal("x".to_string()),
                WordPart::Literal("}".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_braces_literal() {
        let w = word("{}");
        assert_eq!(
            w.parts,
            vec![WordPart::Literal("{".to_string()), WordPart::Literal("}".to_string())]
        );
    }

    #[test]
    fn test_nested_brace_group() {
        let w = word("{a,{b,c}}");
        match &w.parts[0] {
            WordPart::BraceGroup(words) => {
                assert_eq!(words.len(), 2);
                assert!(matches!(&words[1].parts[0], WordPart::BraceGroup(inner) if inner.len() == 2));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_heredoc_body_expands_params() {
        let w = parse_heredoc_body("path is $HOME\n", 1).unwrap();
        assert!(w.parts.iter().any(|p| matches!(p, WordPart::Param(q) if q.name == "HOME")));
    }

    #[test]
    fn test_heredoc_body_quotes_literal() {
        let w = parse_heredoc_body("it's \"fine\"\n", 1).unwrap();
        assert_eq!(w.parts.len(), 1);
        assert!(matches!(&w.parts[0], WordPart::Literal(s) if s == "it's \"fine\"\n"));
    }
}
