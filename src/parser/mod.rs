//! Shell Parser
//!
//! Recursive descent over the token stream: lists of pipelines joined by
//! `&&`/`||`/`;`, compound commands, function definitions, redirections.
//! Word internals are delegated to [`words`]; arithmetic to [`arith`].

pub mod arith;
pub mod lexer;
pub mod words;

use std::collections::VecDeque;

use thiserror::Error;

use crate::ast::{
    AndOrList, ArithExpr, Assignment, CaseArm, Command, CompoundCommand, CompoundKind,
    FunctionDef, ListOp, Pipeline, RedirOp, RedirTarget, Redirection, Script, SimpleCommand, Word,
};

use lexer::{delimiter_is_quoted, Lexer, Op, TokKind, Token};

/// A structured parse failure with source position.
#[derive(Error, Debug, Clone)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self { message: message.into(), line, column }
    }
}

/// Parse a complete script.
pub fn parse(script: &str) -> Result<Script, ParseError> {
    let stream = Lexer::new(script).tokenize()?;
    let mut parser = Parser::new(stream.tokens, stream.heredoc_bodies);
    parser.parse_script()
}

/// Keywords that terminate a command list instead of starting a command.
const LIST_TERMINATORS: &[&str] = &["then", "else", "elif", "fi", "do", "done", "esac", "}"];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    heredoc_bodies: VecDeque<String>,
}

impl Parser {
    fn new(tokens: Vec<Token>, heredoc_bodies: VecDeque<String>) -> Self {
        Self { tokens, pos: 0, heredoc_bodies }
    }

    // -- token access --------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokKind::Eof
    }

    fn eat_op(&mut self, op: Op) -> bool {
        if self.peek().is_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek().is_bare(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<(), ParseError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{}'", kw)))
        }
    }

    fn unexpected(&self, context: &str) -> ParseError {
        let tok = self.peek();
        let shown = match tok.kind {
            TokKind::Eof => "end of input".to_string(),
            TokKind::Newline => "newline".to_string(),
            _ => format!("'{}'", tok.text),
        };
        ParseError::new(format!("{}, found {}", context, shown), tok.line, tok.column)
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokKind::Newline {
            self.advance();
        }
    }

    /// Skip newlines and stray `;` between list items inside compounds.
    fn skip_separators(&mut self) {
        while self.peek().kind == TokKind::Newline || self.peek().is_op(Op::Semi) {
            self.advance();
        }
    }

    fn at_list_terminator(&self) -> bool {
        let tok = self.peek();
        match tok.kind {
            TokKind::Eof | TokKind::Newline => true,
            TokKind::Op(Op::RParen) | TokKind::Op(Op::DSemi) => true,
            TokKind::Word => LIST_TERMINATORS.contains(&tok.text.as_str()),
            _ => false,
        }
    }

    // -- grammar -------------------------------------------------------------

    fn parse_script(&mut self) -> Result<Script, ParseError> {
        let mut lists = Vec::new();
        self.skip_separators();
        while !self.at_eof() {
            lists.push(self.parse_and_or_list()?);
            self.skip_separators();
        }
        Ok(Script { lists })
    }

    /// Pipelines joined by `&&`, `||` and `;` up to a newline/terminator.
    fn parse_and_or_list(&mut self) -> Result<AndOrList, ParseError> {
        let mut pipelines = vec![self.parse_pipeline()?];
        let mut operators = Vec::new();
        let mut background = false;

        loop {
            if self.eat_op(Op::AndAnd) {
                self.skip_newlines();
                operators.push(ListOp::And);
                pipelines.push(self.parse_pipeline()?);
            } else if self.eat_op(Op::OrOr) {
                self.skip_newlines();
                operators.push(ListOp::Or);
                pipelines.push(self.parse_pipeline()?);
            } else if self.peek().is_op(Op::Semi) {
                self.advance();
                // Only continue the list when a command actually follows.
                if self.at_list_terminator() {
                    break;
                }
                operators.push(ListOp::Seq);
                pipelines.push(self.parse_pipeline()?);
            } else if self.eat_op(Op::Amp) {
                background = true;
                break;
            } else {
                break;
            }
        }

        Ok(AndOrList { pipelines, operators, background })
    }

    fn parse_pipeline(&mut self) -> Result<Pipeline, ParseError> {
        let mut negated = false;
        while self.peek().is_bare("!") {
            self.advance();
            negated = !negated;
        }

        let mut commands = vec![self.parse_command()?];
        while self.eat_op(Op::Pipe) {
            self.skip_newlines();
            commands.push(self.parse_command()?);
        }
        Ok(Pipeline { commands, negated })
    }

    fn parse_command(&mut self) -> Result<Command, ParseError> {
        let tok = self.peek().clone();
        match &tok.kind {
            TokKind::Op(Op::LParen) => self.parse_subshell(),
            TokKind::ArithSpan => {
                self.advance();
                let expr = arith::parse_arith(&tok.text, tok.line)?;
                let redirections = self.parse_trailing_redirections()?;
                Ok(Command::Compound(CompoundCommand {
                    kind: CompoundKind::Arith(expr),
                    redirections,
                }))
            }
            TokKind::Word => match tok.text.as_str() {
                "if" => self.parse_if(),
                "while" => self.parse_while(false),
                "until" => self.parse_while(true),
                "for" => self.parse_for(),
                "case" => self.parse_case(),
                "{" => self.parse_group(),
                "function" => self.parse_function_keyword(),
                _ => {
                    // `name ()` function definition?
                    if is_identifier(&tok.text)
                        && self.peek_at(1).is_some_and(|t| t.is_op(Op::LParen))
                        && self.peek_at(2).is_some_and(|t| t.is_op(Op::RParen))
                    {
                        return self.parse_function_paren();
                    }
                    self.parse_simple_command()
                }
            },
            _ => self.parse_simple_command(),
        }
    }

    // -- simple commands -----------------------------------------------------

    fn parse_simple_command(&mut self) -> Result<Command, ParseError> {
        let mut assignments = Vec::new();
        let mut command_words: Vec<Word> = Vec::new();
        let mut redirections = Vec::new();
        let line = self.peek().line;

        loop {
            let tok = self.peek().clone();
            match &tok.kind {
                TokKind::IoNumber => {
                    let fd: u32 = tok.text.parse().map_err(|_| {
                        ParseError::new(format!("bad file descriptor '{}'", tok.text), tok.line, tok.column)
                    })?;
                    self.advance();
                    redirections.push(self.parse_redirection(Some(fd))?);
                }
                TokKind::Op(op) if op.is_redirect() => {
                    redirections.push(self.parse_redirection(None)?);
                }
                TokKind::Word => {
                    if LIST_TERMINATORS.contains(&tok.text.as_str()) && command_words.is_empty() {
                        break;
                    }
                    if command_words.is_empty() {
                        if let Some(assignment) = self.try_assignment(&tok)? {
                            assignments.push(assignment);
                            continue;
                        }
                    }
                    self.advance();
                    command_words.push(words::parse_word(&tok.text, tok.line, tok.column)?);
                }
                _ => break,
            }
        }

        if assignments.is_empty() && command_words.is_empty() && redirections.is_empty() {
            return Err(self.unexpected("expected a command"));
        }
        Ok(Command::Simple(SimpleCommand {
            assignments,
            words: command_words,
            redirections,
            line,
        }))
    }

    /// Recognize `NAME=value` / `NAME+=value` word tokens.
    fn try_assignment(&mut self, tok: &Token) -> Result<Option<Assignment>, ParseError> {
        let text = &tok.text;
        let Some(eq) = find_assignment_eq(text) else {
            return Ok(None);
        };
        let (name_part, append) = if text[..eq].ends_with('+') {
            (&text[..eq - 1], true)
        } else {
            (&text[..eq], false)
        };
        if !is_identifier(name_part) {
            return Ok(None);
        }
        self.advance();
        let value_text = &text[eq + 1..];
        let value = if value_text.is_empty() {
            None
        } else {
            Some(words::parse_word(value_text, tok.line, tok.column)?)
        };
        Ok(Some(Assignment { name: name_part.to_string(), value, append }))
    }

    // -- redirections --------------------------------------------------------

    fn parse_redirection(&mut self, fd: Option<u32>) -> Result<Redirection, ParseError> {
        let tok = self.advance();
        let TokKind::Op(op) = tok.kind else {
            return Err(ParseError::new("expected redirection operator", tok.line, tok.column));
        };

        let redir_op = match op {
            Op::Less => RedirOp::In,
            Op::Great => RedirOp::Out,
            Op::DGreat => RedirOp::Append,
            Op::DLess | Op::DLessDash => RedirOp::HereDoc,
            Op::TLess => RedirOp::HereString,
            Op::LessAnd => RedirOp::DupIn,
            Op::GreatAnd => RedirOp::DupOut,
            Op::AndGreat => RedirOp::OutBoth,
            Op::AndDGreat => RedirOp::AppendBoth,
            _ => return Err(ParseError::new("expected redirection operator", tok.line, tok.column)),
        };

        if redir_op == RedirOp::HereDoc {
            let delim_tok = self.advance();
            if delim_tok.kind != TokKind::Word {
                return Err(ParseError::new(
                    "missing here-document delimiter",
                    delim_tok.line,
                    delim_tok.column,
                ));
            }
            let quoted = delimiter_is_quoted(&delim_tok.text);
            let raw_body = self.heredoc_bodies.pop_front().unwrap_or_default();
            let body = if quoted {
                Word::literal(&raw_body)
            } else {
                words::parse_heredoc_body(&raw_body, delim_tok.line)?
            };
            return Ok(Redirection { fd, op: redir_op, target: RedirTarget::HereDoc { body, quoted } });
        }

        let target_tok = self.peek().clone();
        if target_tok.kind != TokKind::Word {
            return Err(self.unexpected("expected redirection target"));
        }
        self.advance();
        let word = words::parse_word(&target_tok.text, target_tok.line, target_tok.column)?;
        Ok(Redirection { fd, op: redir_op, target: RedirTarget::Word(word) })
    }

    fn parse_trailing_redirections(&mut self) -> Result<Vec<Redirection>, ParseError> {
        let mut redirections = Vec::new();
        loop {
            let tok = self.peek().clone();
            match tok.kind {
                TokKind::IoNumber => {
                    let fd: u32 = tok.text.parse().unwrap_or(1);
                    self.advance();
                    redirections.push(self.parse_redirection(Some(fd))?);
                }
                TokKind::Op(op) if op.is_redirect() => {
                    redirections.push(self.parse_redirection(None)?);
                }
                _ => break,
            }
        }
        Ok(redirections)
    }

    // -- compound commands ---------------------------------------------------

    /// Lists until one of `stops` appears in command position.
    fn parse_lists_until(&mut self, stops: &[&str]) -> Result<Vec<AndOrList>, ParseError> {
        let mut lists = Vec::new();
        loop {
            self.skip_separators();
            let tok = self.peek();
            if tok.kind == TokKind::Eof {
                return Err(self.unexpected(&format!("expected one of {:?}", stops)));
            }
            if stops.iter().any(|s| tok.is_bare(s)) {
                return Ok(lists);
            }
            lists.push(self.parse_and_or_list()?);
        }
    }

    fn parse_if(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword("if")?;
        let mut arms = Vec::new();

        let condition = self.parse_lists_until(&["then"])?;
        self.expect_keyword("then")?;
        let body = self.parse_lists_until(&["elif", "else", "fi"])?;
        arms.push((condition, body));

        let mut else_body = None;
        loop {
            if self.eat_keyword("elif") {
                let condition = self.parse_lists_until(&["then"])?;
                self.expect_keyword("then")?;
                let body = self.parse_lists_until(&["elif", "else", "fi"])?;
                arms.push((condition, body));
            } else if self.eat_keyword("else") {
                else_body = Some(self.parse_lists_until(&["fi"])?);
            } else {
                self.expect_keyword("fi")?;
                break;
            }
        }

        let redirections = self.parse_trailing_redirections()?;
        Ok(Command::Compound(CompoundCommand { kind: CompoundKind::If { arms, else_body }, redirections }))
    }

    fn parse_while(&mut self, until: bool) -> Result<Command, ParseError> {
        self.advance(); // while / until
        let condition = self.parse_lists_until(&["do"])?;
        self.expect_keyword("do")?;
        let body = self.parse_lists_until(&["done"])?;
        self.expect_keyword("done")?;
        let redirections = self.parse_trailing_redirections()?;
        let kind = if until {
            CompoundKind::Until { condition, body }
        } else {
            CompoundKind::While { condition, body }
        };
        Ok(Command::Compound(CompoundCommand { kind, redirections }))
    }

    fn parse_for(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword("for")?;

        // C-style: for (( init; cond; update ))
        if self.peek().kind == TokKind::ArithSpan {
            let span = self.advance();
            let (init, condition, update) = parse_cstyle_header(&span.text, span.line)?;
            self.skip_separators();
            self.expect_keyword("do")?;
            let body = self.parse_lists_until(&["done"])?;
            self.expect_keyword("done")?;
            let redirections = self.parse_trailing_redirections()?;
            return Ok(Command::Compound(CompoundCommand {
                kind: CompoundKind::CStyleFor { init, condition, update, body },
                redirections,
            }));
        }

        let name_tok = self.advance();
        if name_tok.kind != TokKind::Word || !is_identifier(&name_tok.text) {
            return Err(ParseError::new(
                format!("bad for loop variable '{}'", name_tok.text),
                name_tok.line,
                name_tok.column,
            ));
        }

        self.skip_newlines();
        let words_list = if self.eat_keyword("in") {
            let mut list = Vec::new();
            while self.peek().kind == TokKind::Word {
                let tok = self.advance();
                list.push(words::parse_word(&tok.text, tok.line, tok.column)?);
            }
            Some(list)
        } else {
            None
        };

        self.skip_separators();
        self.expect_keyword("do")?;
        let body = self.parse_lists_until(&["done"])?;
        self.expect_keyword("done")?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(Command::Compound(CompoundCommand {
            kind: CompoundKind::For { var: name_tok.text, words: words_list, body },
            redirections,
        }))
    }

    fn parse_case(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword("case")?;
        let subject_tok = self.advance();
        if subject_tok.kind != TokKind::Word {
            return Err(ParseError::new("expected word after 'case'", subject_tok.line, subject_tok.column));
        }
        let subject = words::parse_word(&subject_tok.text, subject_tok.line, subject_tok.column)?;
        self.skip_newlines();
        self.expect_keyword("in")?;
        self.skip_newlines();

        let mut arms = Vec::new();
        loop {
            if self.eat_keyword("esac") {
                break;
            }
            self.eat_op(Op::LParen);

            let mut patterns = Vec::new();
            loop {
                let tok = self.advance();
                if tok.kind != TokKind::Word {
                    return Err(ParseError::new("expected case pattern", tok.line, tok.column));
                }
                patterns.push(words::parse_word(&tok.text, tok.line, tok.column)?);
                if !self.eat_op(Op::Pipe) {
                    break;
                }
            }
            if !self.eat_op(Op::RParen) {
                return Err(self.unexpected("expected ')' after case pattern"));
            }

            self.skip_newlines();
            let mut body = Vec::new();
            loop {
                self.skip_separators();
                if self.peek().is_op(Op::DSemi) || self.peek().is_bare("esac") {
                    break;
                }
                if self.at_eof() {
                    return Err(self.unexpected("expected ';;' or 'esac'"));
                }
                body.push(self.parse_and_or_list()?);
            }
            self.eat_op(Op::DSemi);
            self.skip_newlines();
            arms.push(CaseArm { patterns, body });
        }

        let redirections = self.parse_trailing_redirections()?;
        Ok(Command::Compound(CompoundCommand { kind: CompoundKind::Case { subject, arms }, redirections }))
    }

    fn parse_group(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword("{")?;
        let body = self.parse_lists_until(&["}"])?;
        self.expect_keyword("}")?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(Command::Compound(CompoundCommand { kind: CompoundKind::Group(body), redirections }))
    }

    fn parse_subshell(&mut self) -> Result<Command, ParseError> {
        let open = self.advance(); // (
        let mut body = Vec::new();
        loop {
            self.skip_separators();
            if self.eat_op(Op::RParen) {
                break;
            }
            if self.at_eof() {
                return Err(ParseError::new("expected ')'", open.line, open.column));
            }
            body.push(self.parse_and_or_list()?);
        }
        let redirections = self.parse_trailing_redirections()?;
        Ok(Command::Compound(CompoundCommand { kind: CompoundKind::Subshell(body), redirections }))
    }

    // -- functions -----------------------------------------------------------

    fn parse_function_keyword(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword("function")?;
        let name_tok = self.advance();
        if name_tok.kind != TokKind::Word {
            return Err(ParseError::new("expected function name", name_tok.line, name_tok.column));
        }
        if self.eat_op(Op::LParen) && !self.eat_op(Op::RParen) {
            return Err(self.unexpected("expected ')'"));
        }
        self.skip_newlines();
        let body = self.parse_command()?;
        Ok(Command::FunctionDef(FunctionDef { name: name_tok.text, body: Box::new(body) }))
    }

    fn parse_function_paren(&mut self) -> Result<Command, ParseError> {
        let name_tok = self.advance();
        self.advance(); // (
        self.advance(); // )
        self.skip_newlines();
        let body = self.parse_command()?;
        Ok(Command::FunctionDef(FunctionDef { name: name_tok.text, body: Box::new(body) }))
    }
}

/// Split a C-style for header `init; cond; update` and parse each piece.
fn parse_cstyle_header(
    text: &str,
    line: usize,
) -> Result<(Option<ArithExpr>, Option<ArithExpr>, Option<ArithExpr>), ParseError> {
    let pieces: Vec<&str> = text.split(';').collect();
    if pieces.len() != 3 {
        return Err(ParseError::new("expected 'for (( init; cond; update ))'", line, 0));
    }
    let parse_piece = |piece: &str| -> Result<Option<ArithExpr>, ParseError> {
        if piece.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(arith::parse_arith(piece, line)?))
        }
    };
    Ok((parse_piece(pieces[0])?, parse_piece(pieces[1])?, parse_piece(pieces[2])?))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Find the `=` of an assignment prefix, skipping quoted/expanded text.
/// Returns the byte index of `=` only when everything before it is a bare
/// name (plus an optional `+`).
fn find_assignment_eq(text: &str) -> Option<usize> {
    for (i, c) in text.char_indices() {
        match c {
            '=' => return if i == 0 { None } else { Some(i) },
            '+' => {
                // Only valid directly before '='.
                if text[i + 1..].starts_with('=') {
                    continue;
                }
                return None;
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {}
            _ => return None,
        }
    }
    None
}
