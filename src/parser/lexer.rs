//! Shell Lexer
//!
//! Splits script text into word and operator tokens. Words keep their raw
//! text (quotes, `$` forms, braces) so the word parser can rebuild the
//! structure later; the lexer only needs to know where a word ends, which
//! means tracking quote and substitution nesting.
//!
//! Here-document bodies are collected at the newline that follows the
//! `<<` operator and queued for the parser in order of appearance.

use std::collections::VecDeque;

use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Pipe,       // |
    AndAnd,     // &&
    OrOr,       // ||
    Semi,       // ;
    DSemi,      // ;;
    Amp,        // &
    LParen,     // (
    RParen,     // )
    Less,       // <
    Great,      // >
    DGreat,     // >>
    DLess,      // <<
    DLessDash,  // <<-
    TLess,      // <<<
    LessAnd,    // <&
    GreatAnd,   // >&
    AndGreat,   // &>
    AndDGreat,  // &>>
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Pipe => "|",
            Op::AndAnd => "&&",
            Op::OrOr => "||",
            Op::Semi => ";",
            Op::DSemi => ";;",
            Op::Amp => "&",
            Op::LParen => "(",
            Op::RParen => ")",
            Op::Less => "<",
            Op::Great => ">",
            Op::DGreat => ">>",
            Op::DLess => "<<",
            Op::DLessDash => "<<-",
            Op::TLess => "<<<",
            Op::LessAnd => "<&",
            Op::GreatAnd => ">&",
            Op::AndGreat => "&>",
            Op::AndDGreat => "&>>",
        }
    }

    /// Operators that introduce a redirection target.
    pub fn is_redirect(&self) -> bool {
        matches!(
            self,
            Op::Less
                | Op::Great
                | Op::DGreat
                | Op::DLess
                | Op::DLessDash
                | Op::TLess
                | Op::LessAnd
                | Op::GreatAnd
                | Op::AndGreat
                | Op::AndDGreat
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokKind {
    /// Raw word text, quoting intact.
    Word,
    /// Digits glued to a following `<`/`>`, e.g. the `2` of `2>&1`.
    IoNumber,
    /// The raw inside of `(( ... ))` — C-style for headers and arithmetic
    /// commands.
    ArithSpan,
    Op(Op),
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    /// True for an unquoted word with exactly this text (keyword check).
    pub fn is_bare(&self, text: &str) -> bool {
        self.kind == TokKind::Word && self.text == text
    }

    pub fn is_op(&self, op: Op) -> bool {
        self.kind == TokKind::Op(op)
    }
}

/// Lexer output: the token list plus here-doc bodies in source order.
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub heredoc_bodies: VecDeque<String>,
}

struct PendingHeredoc {
    delimiter: String,
    strip_tabs: bool,
}

/// Nesting contexts a word scan can be inside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    DoubleQuote,
    CommandSub, // $( ... ) — plain parens nest as CommandSub too
    ParamBrace, // ${ ... }
    Backtick,
}

fn is_metachar(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '|' | '&' | ';' | '<' | '>' | '(' | ')')
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    pending_heredocs: VecDeque<PendingHeredoc>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            pending_heredocs: VecDeque::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<TokenStream, ParseError> {
        let mut tokens = Vec::new();
        let mut heredoc_bodies = VecDeque::new();

        loop {
            self.skip_blanks_and_comments();
            if self.at_end() {
                // An unterminated heredoc at EOF takes everything to the end.
                while !self.pending_heredocs.is_empty() {
                    heredoc_bodies.push_back(String::new());
                    self.pending_heredocs.pop_front();
                }
                tokens.push(self.token_here(TokKind::Eof, ""));
                break;
            }

            let c = self.peek();
            if c == '\n' {
                tokens.push(self.token_here(TokKind::Newline, "\n"));
                self.bump();
                self.collect_heredoc_bodies(&mut heredoc_bodies);
                continue;
            }

            if c == '(' && self.peek_at(1) == Some('(') {
                if let Some(tok) = self.scan_arith_span() {
                    tokens.push(tok);
                    continue;
                }
            }

            if let Some(op) = self.scan_operator() {
                let is_heredoc = matches!(op, Op::DLess | Op::DLessDash);
                tokens.push(Token {
                    kind: TokKind::Op(op),
                    text: op.as_str().to_string(),
                    line: self.line,
                    column: self.column,
                });
                if is_heredoc {
                    self.register_heredoc(op == Op::DLessDash, &mut tokens)?;
                }
                continue;
            }

            if let Some(tok) = self.scan_io_number() {
                tokens.push(tok);
                continue;
            }

            let tok = self.scan_word()?;
            tokens.push(tok);
        }

        Ok(TokenStream { tokens, heredoc_bodies })
    }

    // -- low-level helpers ---------------------------------------------------

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn token_here(&self, kind: TokKind, text: &str) -> Token {
        Token { kind, text: text.to_string(), line: self.line, column: self.column }
    }

    fn skip_blanks_and_comments(&mut self) {
        loop {
            while !self.at_end() && matches!(self.peek(), ' ' | '\t' | '\r') {
                self.bump();
            }
            // Line continuation between tokens.
            if !self.at_end() && self.peek() == '\\' && self.peek_at(1) == Some('\n') {
                self.bump();
                self.bump();
                continue;
            }
            if !self.at_end() && self.peek() == '#' {
                while !self.at_end() && self.peek() != '\n' {
                    self.bump();
                }
                continue;
            }
            break;
        }
    }

    // -- operators -----------------------------------------------------------

    fn scan_operator(&mut self) -> Option<Op> {
        let c = self.peek();
        let next = self.peek_at(1);
        let (op, len) = match c {
            '|' if next == Some('|') => (Op::OrOr, 2),
            '|' => (Op::Pipe, 1),
            '&' if next == Some('&') => (Op::AndAnd, 2),
            '&' if next == Some('>') => {
                if self.peek_at(2) == Some('>') {
                    (Op::AndDGreat, 3)
                } else {
                    (Op::AndGreat, 2)
                }
            }
            '&' => (Op::Amp, 1),
            ';' if next == Some(';') => (Op::DSemi, 2),
            ';' => (Op::Semi, 1),
            '(' => (Op::LParen, 1),
            ')' => (Op::RParen, 1),
            '<' if next == Some('<') => match self.peek_at(2) {
                Some('-') => (Op::DLessDash, 3),
                Some('<') => (Op::TLess, 3),
                _ => (Op::DLess, 2),
            },
            '<' if next == Some('&') => (Op::LessAnd, 2),
            '<' => (Op::Less, 1),
            '>' if next == Some('>') => (Op::DGreat, 2),
            '>' if next == Some('&') => (Op::GreatAnd, 2),
            '>' => (Op::Great, 1),
            _ => return None,
        };
        for _ in 0..len {
            self.bump();
        }
        Some(op)
    }

    /// Try to scan `(( ... ))` as one span. Backs off (returning `None`)
    /// when no matching `))` closes it, so `( (x) | y)` still lexes as
    /// nested subshells.
    fn scan_arith_span(&mut self) -> Option<Token> {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        self.bump();
        self.bump();
        let mut depth = 0usize;
        let mut text = String::new();
        while !self.at_end() {
            let c = self.peek();
            match c {
                '(' => {
                    depth += 1;
                    text.push(self.bump());
                }
                ')' if depth > 0 => {
                    depth -= 1;
                    text.push(self.bump());
                }
                ')' => {
                    if self.peek_at(1) == Some(')') {
                        self.bump();
                        self.bump();
                        return Some(Token { kind: TokKind::ArithSpan, text, line, column });
                    }
                    break;
                }
                _ => {
                    text.push(self.bump());
                }
            }
        }
        self.pos = start;
        self.line = line;
        self.column = column;
        None
    }

    fn scan_io_number(&mut self) -> Option<Token> {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let mut digits = String::new();
        while !self.at_end() && self.peek().is_ascii_digit() {
            digits.push(self.bump());
        }
        if !digits.is_empty() && !self.at_end() && matches!(self.peek(), '<' | '>') {
            return Some(Token { kind: TokKind::IoNumber, text: digits, line, column });
        }
        self.pos = start;
        self.line = line;
        self.column = column;
        None
    }

    // -- words ---------------------------------------------------------------

    /// Scan one word, honoring quotes and substitution nesting. Metachars
    /// only terminate the word when the context stack is empty.
    fn scan_word(&mut self) -> Result<Token, ParseError> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        let mut stack: Vec<Ctx> = Vec::new();

        while !self.at_end() {
            let c = self.peek();
            let in_dquote = stack.last() == Some(&Ctx::DoubleQuote);

            if stack.is_empty() && is_metachar(c) {
                break;
            }

            match c {
                '\\' => {
                    if self.peek_at(1) == Some('\n') {
                        // Continuation: drop both characters.
                        self.bump();
                        self.bump();
                    } else {
                        text.push(self.bump());
                        if !self.at_end() {
                            text.push(self.bump());
                        }
                    }
                }
                '\'' if !in_dquote => {
                    text.push(self.bump());
                    loop {
                        if self.at_end() {
                            return Err(ParseError::new("unterminated single quote", line, column));
                        }
                        let q = self.bump();
                        text.push(q);
                        if q == '\'' {
                            break;
                        }
                    }
                }
                '"' => {
                    text.push(self.bump());
                    if in_dquote {
                        stack.pop();
                    } else {
                        stack.push(Ctx::DoubleQuote);
                    }
                }
                '`' => {
                    text.push(self.bump());
                    if stack.last() == Some(&Ctx::Backtick) {
                        stack.pop();
                    } else {
                        stack.push(Ctx::Backtick);
                    }
                }
                '$' => {
                    text.push(self.bump());
                    match self.peek_at(0) {
                        Some('(') => {
                            text.push(self.bump());
                            stack.push(Ctx::CommandSub);
                        }
                        Some('{') => {
                            text.push(self.bump());
                            stack.push(Ctx::ParamBrace);
                        }
                        _ => {}
                    }
                }
                '(' if stack.iter().any(|c| *c == Ctx::CommandSub) && !in_dquote => {
                    text.push(self.bump());
                    stack.push(Ctx::CommandSub);
                }
                ')' if stack.last() == Some(&Ctx::CommandSub) => {
                    text.push(self.bump());
                    stack.pop();
                }
                '}' if stack.last() == Some(&Ctx::ParamBrace) => {
                    text.push(self.bump());
                    stack.pop();
                }
                _ => {
                    text.push(self.bump());
                }
            }
        }

        if !stack.is_empty() {
            return Err(ParseError::new(
                format!("unexpected end of input while scanning {:?}", stack.last().unwrap()),
                self.line,
                self.column,
            ));
        }
        Ok(Token { kind: TokKind::Word, text, line, column })
    }

    // -- here-documents ------------------------------------------------------

    /// After a `<<`/`<<-` operator: lex the delimiter word, emit it as a
    /// token, and remember it so the body can be gathered at the newline.
    fn register_heredoc(&mut self, strip_tabs: bool, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        self.skip_blanks_and_comments();
        if self.at_end() || self.peek() == '\n' {
            return Err(ParseError::new("missing here-document delimiter", self.line, self.column));
        }
        let tok = self.scan_word()?;
        let delimiter = strip_delimiter_quotes(&tok.text);
        tokens.push(tok);
        self.pending_heredocs.push_back(PendingHeredoc { delimiter, strip_tabs });
        Ok(())
    }

    /// Consume body lines for every heredoc registered on the line that just
    /// ended, in order of appearance.
    fn collect_heredoc_bodies(&mut self, bodies: &mut VecDeque<String>) {
        while let Some(pending) = self.pending_heredocs.pop_front() {
            let mut body = String::new();
            loop {
                if self.at_end() {
                    break;
                }
                let mut raw_line = String::new();
                while !self.at_end() && self.peek() != '\n' {
                    raw_line.push(self.bump());
                }
                if !self.at_end() {
                    self.bump(); // newline
                }
                let candidate =
                    if pending.strip_tabs { raw_line.trim_start_matches('\t') } else { &raw_line };
                if candidate == pending.delimiter {
                    break;
                }
                if pending.strip_tabs {
                    body.push_str(raw_line.trim_start_matches('\t'));
                } else {
                    body.push_str(&raw_line);
                }
                body.push('\n');
            }
            bodies.push_back(body);
        }
    }
}

/// The delimiter word with quoting removed: `'EOF'` and `"EOF"` both mean
/// `EOF` (and mark the body as literal — the parser re-checks the raw text).
pub fn strip_delimiter_quotes(raw: &str) -> String {
    let mut out = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    out.push(q);
                }
            }
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                    out.push(q);
                }
            }
            '\\' => {
                if let Some(&n) = chars.peek() {
                    out.push(n);
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// True if the raw delimiter was quoted in any way (suppresses expansion).
pub fn delimiter_is_quoted(raw: &str) -> bool {
    raw.contains('\'') || raw.contains('"') || raw.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> TokenStream {
        Lexer::new(input).tokenize().unwrap()
    }

    fn kinds(input: &str) -> Vec<TokKind> {
        lex(input).tokens.into_iter().map(|t| t.kind).collect()
    }

    fn words(input: &str) -> Vec<String> {
        lex(input)
            .tokens
            .into_iter()
            .filter(|t| t.kind == TokKind::Word)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_simple_words_and_eof() {
        assert_eq!(words("echo hello world"), vec!["echo", "hello", "world"]);
        assert_eq!(kinds("a").last(), Some(&TokKind::Eof));
    }

    #[test]
    fn test_operators() {
        let ks = kinds("a | b && c || d ; e & f");
        assert!(ks.contains(&TokKind::Op(Op::Pipe)));
        assert!(ks.contains(&TokKind::Op(Op::AndAnd)));
        assert!(ks.contains(&TokKind::Op(Op::OrOr)));
        assert!(ks.contains(&TokKind::Op(Op::Semi)));
        assert!(ks.contains(&TokKind::Op(Op::Amp)));
    }

    #[test]
    fn test_redirect_operators() {
        let ks = kinds("a > f >> g < h 2>&1 &> all");
        assert!(ks.contains(&TokKind::Op(Op::Great)));
        assert!(ks.contains(&TokKind::Op(Op::DGreat)));
        assert!(ks.contains(&TokKind::Op(Op::Less)));
        assert!(ks.contains(&TokKind::Op(Op::GreatAnd)));
        assert!(ks.contains(&TokKind::Op(Op::AndGreat)));
        assert!(ks.contains(&TokKind::IoNumber));
    }

    #[test]
    fn test_io_number_only_before_redirect() {
        // "2" here is an argument, not an fd.
        let ks = kinds("echo 2 x");
        assert!(!ks.contains(&TokKind::IoNumber));
    }

    #[test]
    fn test_quotes_keep_word_together() {
        assert_eq!(words("echo 'a b' \"c d\""), vec!["echo", "'a b'", "\"c d\""]);
    }

    #[test]
    fn test_command_sub_spans_metachars() {
        assert_eq!(words("echo $(ls | wc -l)"), vec!["echo", "$(ls | wc -l)"]);
    }

    #[test]
    fn test_nested_command_sub() {
        assert_eq!(words("echo $(echo $(echo x))"), vec!["echo", "$(echo $(echo x))"]);
    }

    #[test]
    fn test_command_sub_with_quoted_paren() {
        assert_eq!(words(r#"echo "$(echo ")")""#), vec!["echo", r#""$(echo ")")""#]);
    }

    #[test]
    fn test_param_brace_with_space() {
        assert_eq!(words("echo ${x:-a b}"), vec!["echo", "${x:-a b}"]);
    }

    #[test]
    fn test_comment_dropped() {
        assert_eq!(words("echo hi # a comment"), vec!["echo", "hi"]);
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(words("echo a\\\nb"), vec!["echo", "ab"]);
    }

    #[test]
    fn test_heredoc_body_collected() {
        let stream = lex("cat <<EOF\nline1\nline2\nEOF\necho done");
        assert_eq!(stream.heredoc_bodies.len(), 1);
        assert_eq!(stream.heredoc_bodies[0], "line1\nline2\n");
        assert!(stream.tokens.iter().any(|t| t.is_bare("EOF")));
        assert!(stream.tokens.iter().any(|t| t.is_bare("done")));
    }

    #[test]
    fn test_heredoc_strip_tabs() {
        let stream = lex("cat <<-EOF\n\tindented\n\tEOF\n");
        assert_eq!(stream.heredoc_bodies[0], "indented\n");
    }

    #[test]
    fn test_two_heredocs_on_one_line() {
        let stream = lex("cat <<A <<B\na\nA\nb\nB\n");
        assert_eq!(stream.heredoc_bodies[0], "a\n");
        assert_eq!(stream.heredoc_bodies[1], "b\n");
    }

    #[test]
    fn test_quoted_heredoc_delimiter() {
        assert_eq!(strip_delimiter_quotes("'EOF'"), "EOF");
        assert!(delimiter_is_quoted("'EOF'"));
        assert!(!delimiter_is_quoted("EOF"));
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        assert!(Lexer::new("echo 'oops").tokenize().is_err());
    }

    #[test]
    fn test_bang_and_braces_are_words() {
        assert_eq!(words("! { echo; }"), vec!["!", "{", "echo", "}"]);
    }

    #[test]
    fn test_arith_span() {
        let stream = lex("(( i < 3 ))");
        assert_eq!(stream.tokens[0].kind, TokKind::ArithSpan);
        assert_eq!(stream.tokens[0].text, " i < 3 ");
    }

    #[test]
    fn test_nested_subshell_is_not_arith() {
        // No matching `))`: the scan backs off to two subshell parens.
        let ks = kinds("((echo a); echo b)");
        assert_eq!(ks[0], TokKind::Op(Op::LParen));
        assert_eq!(ks[1], TokKind::Op(Op::LParen));
    }
}
