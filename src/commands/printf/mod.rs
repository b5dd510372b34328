//! `printf`.
//!
//! The format string is reused until every argument is consumed, matching
//! shell printf. Backslash escapes in the format are interpreted.

pub mod format;

use format::{parse_format, render, FormatPiece};

use super::{Command, CommandContext, CommandResult};

pub struct PrintfCommand;

impl Command for PrintfCommand {
    fn name(&self) -> &'static str {
        "printf"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let Some(raw_format) = ctx.args.first() else {
            return CommandResult::error("printf: usage: printf format [arguments]\n");
        };
        let format = interpret_escapes(raw_format);
        let pieces = parse_format(&format);
        let args = &ctx.args[1..];

        let directive_count = pieces
            .iter()
            .filter(|p| matches!(p, FormatPiece::Directive(_)))
            .count();

        let mut out = String::new();
        let mut consumed = 0;
        loop {
            for piece in &pieces {
                match piece {
                    FormatPiece::Literal(text) => out.push_str(text),
                    FormatPiece::Directive(directive) => {
                        let arg = args.get(consumed).map(String::as_str).unwrap_or("");
                        consumed += 1;
                        out.push_str(&render(directive, arg));
                    }
                }
            }
            // Repeat only while arguments remain and the format consumes any.
            if directive_count == 0 || consumed >= args.len() {
                break;
            }
        }
        CommandResult::success(out)
    }
}

/// Escape sequences live in the format string itself (`\n`, `\t`, ...).
fn interpret_escapes(format: &str) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::with_capacity(format.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        i += 1;
        match chars[i] {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            'a' => out.push('\x07'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0' => out.push('\0'),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx;

    fn run(args: &[&str]) -> String {
        PrintfCommand.execute(ctx(args, "")).stdout
    }

    #[test]
    fn test_plain_format() {
        assert_eq!(run(&["hello\\n"]), "hello\n");
    }

    #[test]
    fn test_string_directive() {
        assert_eq!(run(&["%s-%s\\n", "a", "b"]), "a-b\n");
    }

    #[test]
    fn test_numeric_directives() {
        assert_eq!(run(&["%d %x %o\\n", "255", "255", "8"]), "255 ff 10\n");
    }

    #[test]
    fn test_width_precision() {
        assert_eq!(run(&["%5d|%-5d|%.2f\\n", "42", "42", "3.14159"]), "   42|42   |3.14\n");
    }

    #[test]
    fn test_format_reuse() {
        assert_eq!(run(&["%s\\n", "a", "b", "c"]), "a\nb\nc\n");
    }

    #[test]
    fn test_missing_args_are_empty() {
        assert_eq!(run(&["[%s][%d]\\n", "x"]), "[x][0]\n");
    }

    #[test]
    fn test_no_trailing_newline_by_default() {
        assert_eq!(run(&["abc"]), "abc");
    }

    #[test]
    fn test_percent_literal() {
        assert_eq!(run(&["100%%\\n"]), "100%\n");
    }
}
