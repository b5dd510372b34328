//! Word Expansion
//!
//! Drives the canonical expansion order: brace, tilde, parameter, command
//! and arithmetic substitution, field splitting, pathname expansion, quote
//! removal. The [`Expander`] borrows the engine so command substitution can
//! recurse into script execution.

pub mod brace;
pub mod glob;
mod param;
pub mod pattern;
pub mod split;

use crate::ast::{Word, WordPart};
use crate::interp::arith::eval_arith;
use crate::interp::engine::Engine;
use crate::interp::state::ShellState;

use split::Piece;

pub const DEFAULT_IFS: &str = " \t\n";

/// An expansion failure (`nounset`, `${x:?}`, arithmetic errors). Fatal
/// errors terminate the whole script, matching non-interactive bash.
#[derive(Debug, Clone)]
pub struct ExpandError {
    pub message: String,
    pub exit_code: i32,
    pub fatal: bool,
}

impl ExpandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), exit_code: 1, fatal: false }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self { message: message.into(), exit_code: 1, fatal: true }
    }
}

pub struct Expander<'a, 'e> {
    pub state: &'a mut ShellState,
    pub engine: &'a Engine<'e>,
    /// Diagnostics produced along the way (command substitution stderr).
    pub stderr: String,
    /// Exit code of the last `$( ... )`, for assignment-only commands.
    pub last_sub_exit: Option<i32>,
}

impl<'a, 'e> Expander<'a, 'e> {
    pub fn new(state: &'a mut ShellState, engine: &'a Engine<'e>) -> Self {
        Self { state, engine, stderr: String::new(), last_sub_exit: None }
    }

    /// Full pipeline: one word list in, argv fields out.
    pub fn expand_words(&mut self, words: &[Word]) -> Result<Vec<String>, ExpandError> {
        let mut argv = Vec::new();
        for word in words {
            self.expand_word_into(word, &mut argv)?;
        }
        Ok(argv)
    }

    /// Expand a single word into zero or more fields.
    pub fn expand_word_into(
        &mut self,
        word: &Word,
        argv: &mut Vec<String>,
    ) -> Result<(), ExpandError> {
        for braced in brace::expand_braces(word) {
            let braced = tilde_expand(&braced, self.state);
            let mut pieces = Vec::new();
            self.expand_parts(&braced.parts, false, &mut pieces)?;
            let ifs =
                self.state.env.get("IFS").cloned().unwrap_or_else(|| DEFAULT_IFS.to_string());
            for field in split::split_fields(&pieces, &ifs) {
                if field.globbable {
                    match glob::expand_glob(self.state, &field.pattern) {
                        Some(matches) => argv.extend(matches),
                        None => argv.push(pattern::unescape_glob(&field.pattern)),
                    }
                } else {
                    argv.push(pattern::unescape_glob(&field.pattern));
                }
            }
        }
        Ok(())
    }

    /// Expansion without splitting or globbing: assignment values, redirect
    /// targets, heredoc bodies, `case` subjects.
    pub fn expand_to_string(&mut self, word: &Word) -> Result<String, ExpandError> {
        let word = tilde_expand(word, self.state);
        let mut pieces = Vec::new();
        self.expand_parts(&word.parts, false, &mut pieces)?;
        let mut out = String::new();
        for (i, piece) in pieces.iter().enumerate() {
            match piece {
                Piece::Text { text, .. } => out.push_str(text),
                Piece::Break => {
                    if i + 1 < pieces.len() {
                        out.push(' ');
                    }
                }
            }
        }
        Ok(out)
    }

    /// Expansion to a glob/case pattern: quoted spans come back escaped so
    /// the matcher treats them literally.
    pub fn expand_to_pattern(&mut self, word: &Word) -> Result<String, ExpandError> {
        let word = tilde_expand(word, self.state);
        let mut pieces = Vec::new();
        self.expand_parts(&word.parts, false, &mut pieces)?;
        let mut out = String::new();
        for piece in &pieces {
            match piece {
                Piece::Text { text, quoted: true } => out.push_str(&pattern::escape_glob(text)),
                Piece::Text { text, quoted: false } => out.push_str(text),
                Piece::Break => out.push(' '),
            }
        }
        Ok(out)
    }

    // -- part walker ---------------------------------------------------------

    pub(crate) fn expand_parts(
        &mut self,
        parts: &[WordPart],
        quoted: bool,
        pieces: &mut Vec<Piece>,
    ) -> Result<(), ExpandError> {
        for part in parts {
            match part {
                WordPart::Literal(text) => {
                    pieces.push(Piece::Text { text: text.clone(), quoted });
                }
                WordPart::SingleQuoted(text) => {
                    pieces.push(Piece::Text { text: text.clone(), quoted: true });
                }
                WordPart::Escaped(c) => {
                    pieces.push(Piece::Text { text: c.to_string(), quoted: true });
                }
                WordPart::DoubleQuoted(inner) => {
                    // An empty "" still produces a field.
                    if inner.is_empty() {
                        pieces.push(Piece::Text { text: String::new(), quoted: true });
                    }
                    self.expand_parts(inner, true, pieces)?;
                }
                WordPart::Param(expansion) => {
                    self.expand_param(expansion, quoted, pieces)?;
                }
                WordPart::CommandSub(script) | WordPart::BacktickSub(script) => {
                    let output = self.command_substitute(script);
                    pieces.push(Piece::Text { text: output, quoted });
                }
                WordPart::ArithSub(expr) => {
                    let value = eval_arith(self.state, expr)
                        .map_err(|message| ExpandError::new(format!("sandsh: {}", message)))?;
                    pieces.push(Piece::Text { text: value.to_string(), quoted });
                }
                WordPart::BraceGroup(words) => {
                    // Reached only in no-split contexts where brace
                    // expansion does not apply; render literally.
                    pieces.push(Piece::Text { text: "{".to_string(), quoted });
                    for (i, inner) in words.iter().enumerate() {
                        if i > 0 {
                            pieces.push(Piece::Text { text: ",".to_string(), quoted });
                        }
                        self.expand_parts(&inner.parts, quoted, pieces)?;
                    }
                    pieces.push(Piece::Text { text: "}".to_string(), quoted });
                }
                WordPart::BraceRange { start, end, step } => {
                    let text = match step {
                        Some(s) => format!("{{{}..{}..{}}}", start, end, s),
                        None => format!("{{{}..{}}}", start, end),
                    };
                    pieces.push(Piece::Text { text, quoted });
                }
            }
        }
        Ok(())
    }

    /// Run `$( ... )`: a subshell over a clone of the state. Its stderr is
    /// collected, `$?` reflects its exit code, and all trailing newlines are
    /// stripped from the captured stdout.
    fn command_substitute(&mut self, script: &str) -> String {
        let outcome = match crate::parser::parse(script) {
            Ok(ast) => {
                let mut sub_state = self.state.clone();
                self.engine.run_script(&mut sub_state, &ast)
            }
            Err(err) => crate::interp::state::ExecOutcome::failure(
                format!("sandsh: command substitution: {}\n", err),
                2,
            ),
        };
        self.stderr.push_str(&outcome.stderr);
        self.state.last_exit = outcome.exit_code;
        self.last_sub_exit = Some(outcome.exit_code);
        let mut stdout = outcome.stdout;
        while stdout.ends_with('\n') {
            stdout.pop();
        }
        stdout
    }
}

/// Expand a leading unquoted `~` to `$HOME`. Only the bare-user form is
/// supported; `~name` is left alone.
fn tilde_expand(word: &Word, state: &ShellState) -> Word {
    let Some(WordPart::Literal(first)) = word.parts.first() else {
        return word.clone();
    };
    if !first.starts_with('~') {
        return word.clone();
    }
    let rest = &first[1..];
    if !(rest.is_empty() || rest.starts_with('/')) {
        return word.clone();
    }
    let home = state.get_var("HOME").unwrap_or("/").to_string();
    let mut parts = word.parts.clone();
    parts[0] = WordPart::Literal(format!("{}{}", home, rest));
    Word { parts }
}
