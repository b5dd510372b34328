//! `tr`.

use super::{args, Command, CommandContext, CommandResult};

pub struct TrCommand;

impl Command for TrCommand {
    fn name(&self) -> &'static str {
        "tr"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "dsc", "") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("tr: {}\n", e)),
        };

        let delete = parsed.has('d');
        let squeeze = parsed.has('s');
        let complement = parsed.has('c');

        let set1 = match parsed.operands.first() {
            Some(set) => expand_set(set),
            None => return CommandResult::error("tr: missing operand\n"),
        };
        let set2 = parsed.operands.get(1).map(|s| expand_set(s));

        let mut out = String::with_capacity(ctx.stdin.len());
        let mut last_emitted: Option<char> = None;

        for c in ctx.stdin.chars() {
            let in_set1 = set1.contains(&c) != complement;

            if delete {
                if in_set1 {
                    continue;
                }
                push_maybe_squeezed(&mut out, c, squeeze && set2.as_ref().is_some_and(|s| s.contains(&c)), &mut last_emitted);
                continue;
            }

            let mapped = if in_set1 {
                match &set2 {
                    Some(set2) if !set2.is_empty() => {
                        if complement {
                            *set2.last().unwrap()
                        } else {
                            let idx = set1.iter().position(|x| *x == c).unwrap_or(0);
                            *set2.get(idx).unwrap_or_else(|| set2.last().unwrap())
                        }
                    }
                    _ => c,
                }
            } else {
                c
            };

            let squeezing = squeeze
                && in_set1
                && set2.as_ref().map_or(set1.contains(&mapped), |s| s.contains(&mapped));
            push_maybe_squeezed(&mut out, mapped, squeezing, &mut last_emitted);
        }
        CommandResult::success(out)
    }
}

fn push_maybe_squeezed(out: &mut String, c: char, squeezing: bool, last: &mut Option<char>) {
    if squeezing && *last == Some(c) {
        return;
    }
    out.push(c);
    *last = Some(c);
}

/// Expand ranges (`a-z`), escapes (`\n`) and the common classes.
fn expand_set(spec: &str) -> Vec<char> {
    match spec {
        "[:lower:]" => return ('a'..='z').collect(),
        "[:upper:]" => return ('A'..='Z').collect(),
        "[:digit:]" => return ('0'..='9').collect(),
        "[:alpha:]" => {
            let mut v: Vec<char> = ('a'..='z').collect();
            v.extend('A'..='Z');
            return v;
        }
        "[:alnum:]" => {
            let mut v: Vec<char> = ('a'..='z').collect();
            v.extend('A'..='Z');
            v.extend('0'..='9');
            return v;
        }
        "[:space:]" => return vec![' ', '\t', '\n', '\r', '\x0b', '\x0c'],
        _ => {}
    }

    let chars: Vec<char> = spec.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            out.push(match chars[i + 1] {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '\\' => '\\',
                other => other,
            });
            i += 2;
        } else if i + 2 < chars.len() && chars[i + 1] == '-' {
            let (lo, hi) = (chars[i] as u32, chars[i + 2] as u32);
            if lo <= hi {
                for code in lo..=hi {
                    if let Some(c) = char::from_u32(code) {
                        out.push(c);
                    }
                }
            } else {
                out.push(chars[i]);
                out.push('-');
                out.push(chars[i + 2]);
            }
            i += 3;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx;

    fn run(args: &[&str], stdin: &str) -> String {
        TrCommand.execute(ctx(args, stdin)).stdout
    }

    #[test]
    fn test_simple_translate() {
        assert_eq!(run(&["abc", "xyz"], "aabbcc"), "xxyyzz");
    }

    #[test]
    fn test_ranges() {
        assert_eq!(run(&["a-z", "A-Z"], "hello"), "HELLO");
    }

    #[test]
    fn test_classes() {
        assert_eq!(run(&["[:lower:]", "[:upper:]"], "abc"), "ABC");
    }

    #[test]
    fn test_delete() {
        assert_eq!(run(&["-d", "aeiou"], "education"), "dctn");
    }

    #[test]
    fn test_squeeze() {
        assert_eq!(run(&["-s", " "], "a   b  c"), "a b c");
    }

    #[test]
    fn test_complement_delete() {
        assert_eq!(run(&["-cd", "0-9"], "a1b2c3\n"), "123");
    }

    #[test]
    fn test_shorter_set2_extends_last() {
        assert_eq!(run(&["abc", "x"], "abc"), "xxx");
    }

    #[test]
    fn test_escape_newline() {
        assert_eq!(run(&["\\n", " "], "a\nb\n"), "a b ");
    }
}
