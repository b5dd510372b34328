//! Parameter Expansion
//!
//! `$name`, `${name}` and the operator forms, including the special
//! parameters (`$?`, `$#`, `$@`, `$*`, `$0..$9`, `$$`, `$!`, `$-`).

use crate::ast::{ParamExpansion, ParamOp};

use super::pattern;
use super::split::Piece;
use super::{ExpandError, Expander, DEFAULT_IFS};

impl<'a, 'e> Expander<'a, 'e> {
    pub(crate) fn expand_param(
        &mut self,
        expansion: &ParamExpansion,
        quoted: bool,
        pieces: &mut Vec<Piece>,
    ) -> Result<(), ExpandError> {
        let name = expansion.name.as_str();

        // `$@` / `$*` without an operator: the only parameters that can
        // produce multiple fields.
        if expansion.op.is_none() && (name == "@" || name == "*") {
            self.expand_positional_list(name, quoted, pieces);
            return Ok(());
        }

        let current = self.resolve(name);

        let value: String = match &expansion.op {
            None => match current {
                Some(value) => value,
                None => {
                    if self.state.options.nounset && !nounset_exempt(name) {
                        return Err(ExpandError::fatal(format!(
                            "sandsh: {}: unbound variable",
                            name
                        )));
                    }
                    String::new()
                }
            },
            Some(ParamOp::Default { word, check_empty }) => {
                if needs_fallback(&current, *check_empty) {
                    self.expand_to_string(word)?
                } else {
                    current.unwrap_or_default()
                }
            }
            Some(ParamOp::Assign { word, check_empty }) => {
                if needs_fallback(&current, *check_empty) {
                    let fallback = self.expand_to_string(word)?;
                    if is_identifier(name) {
                        self.state.set_var(name, fallback.clone());
                    }
                    fallback
                } else {
                    current.unwrap_or_default()
                }
            }
            Some(ParamOp::Alternate { word, check_empty }) => {
                if needs_fallback(&current, *check_empty) {
                    String::new()
                } else {
                    self.expand_to_string(word)?
                }
            }
            Some(ParamOp::Error { word, check_empty }) => {
                if needs_fallback(&current, *check_empty) {
                    let detail = self.expand_to_string(word)?;
                    let message = if detail.is_empty() {
                        format!("sandsh: {}: parameter null or not set", name)
                    } else {
                        format!("sandsh: {}: {}", name, detail)
                    };
                    return Err(ExpandError::fatal(message));
                }
                current.unwrap_or_default()
            }
            Some(ParamOp::Length) => current.unwrap_or_default().chars().count().to_string(),
            Some(ParamOp::RemovePrefix { pattern: pattern_word, longest }) => {
                let pat = self.expand_to_pattern(pattern_word)?;
                pattern::remove_prefix(&current.unwrap_or_default(), &pat, *longest)
            }
            Some(ParamOp::RemoveSuffix { pattern: pattern_word, longest }) => {
                let pat = self.expand_to_pattern(pattern_word)?;
                pattern::remove_suffix(&current.unwrap_or_default(), &pat, *longest)
            }
            Some(ParamOp::Replace { pattern: pattern_word, replacement, all }) => {
                let pat = self.expand_to_pattern(pattern_word)?;
                let repl = self.expand_to_string(replacement)?;
                pattern::replace(&current.unwrap_or_default(), &pat, &repl, *all)
            }
        };

        pieces.push(Piece::Text { text: value, quoted });
        Ok(())
    }

    fn expand_positional_list(&mut self, name: &str, quoted: bool, pieces: &mut Vec<Piece>) {
        let positional = self.state.positional.clone();
        if quoted && name == "@" {
            // "$@": one field per parameter, zero fields when empty.
            let last = positional.len().saturating_sub(1);
            for (i, arg) in positional.iter().enumerate() {
                pieces.push(Piece::Text { text: arg.clone(), quoted: true });
                if i < last {
                    pieces.push(Piece::Break);
                }
            }
        } else if quoted {
            // "$*": one field, joined on the first IFS character.
            let sep = self
                .state
                .env
                .get("IFS")
                .map(|s| s.as_str())
                .unwrap_or(DEFAULT_IFS)
                .chars()
                .next()
                .map(|c| c.to_string())
                .unwrap_or_default();
            pieces.push(Piece::Text { text: positional.join(&sep), quoted: true });
        } else {
            pieces.push(Piece::Text { text: positional.join(" "), quoted: false });
        }
    }

    /// Current value of a parameter, if set.
    fn resolve(&self, name: &str) -> Option<String> {
        let state = &self.state;
        match name {
            "?" => Some(state.last_exit.to_string()),
            "#" => Some(state.positional.len().to_string()),
            "$" => Some(state.pid.to_string()),
            "0" => Some("sandsh".to_string()),
            "!" => None, // no background jobs ever run
            "-" => {
                let mut flags = String::new();
                if state.options.errexit {
                    flags.push('e');
                }
                if state.options.nounset {
                    flags.push('u');
                }
                if state.options.xtrace {
                    flags.push('x');
                }
                Some(flags)
            }
            "@" | "*" => Some(state.positional.join(" ")),
            _ if name.chars().all(|c| c.is_ascii_digit()) => {
                let n: usize = name.parse().ok()?;
                state.positional.get(n.checked_sub(1)?).cloned()
            }
            _ => state.env.get(name).cloned(),
        }
    }
}

fn needs_fallback(current: &Option<String>, check_empty: bool) -> bool {
    match current {
        None => true,
        Some(value) => check_empty && value.is_empty(),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn nounset_exempt(name: &str) -> bool {
    matches!(name, "@" | "*" | "!" | "-")
}
