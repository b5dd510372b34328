//! `wc`.
//!
//! Output layout is pinned by downstream scripts: every count is printed
//! right-aligned in an 8-column field.

use super::{args, Command, CommandContext, CommandResult};

pub struct WcCommand;

#[derive(Default, Clone, Copy)]
struct Counts {
    lines: usize,
    words: usize,
    bytes: usize,
}

fn count(content: &str) -> Counts {
    Counts {
        lines: content.matches('\n').count(),
        words: content.split_whitespace().count(),
        bytes: content.len(),
    }
}

impl Command for WcCommand {
    fn name(&self) -> &'static str {
        "wc"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "lwcm", "") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("wc: {}\n", e)),
        };

        let mut show_lines = parsed.has('l');
        let mut show_words = parsed.has('w');
        let mut show_bytes = parsed.has('c') || parsed.has('m');
        if !show_lines && !show_words && !show_bytes {
            show_lines = true;
            show_words = true;
            show_bytes = true;
        }

        let mut operands = parsed.operands.clone();
        if operands.is_empty() {
            operands.push("-".to_string());
        }

        let render = |counts: &Counts, label: Option<&str>| {
            let mut fields = Vec::new();
            if show_lines {
                fields.push(format!("{:>8}", counts.lines));
            }
            if show_words {
                fields.push(format!("{:>8}", counts.words));
            }
            if show_bytes {
                fields.push(format!("{:>8}", counts.bytes));
            }
            match label {
                Some(name) => format!("{} {}\n", fields.join(""), name),
                None => format!("{}\n", fields.join("")),
            }
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let mut total = Counts::default();
        let mut counted = 0;

        for operand in &operands {
            let content = match ctx.read_input(operand) {
                Ok(content) => content,
                Err(message) => {
                    stderr.push_str(&format!("wc: {}\n", message));
                    exit_code = 1;
                    continue;
                }
            };
            let counts = count(&content);
            total.lines += counts.lines;
            total.words += counts.words;
            total.bytes += counts.bytes;
            counted += 1;
            let label = if operand == "-" { None } else { Some(operand.as_str()) };
            stdout.push_str(&render(&counts, label));
        }

        if counted > 1 {
            stdout.push_str(&render(&total, Some("total")));
        }
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::{ctx, ctx_with_files};

    #[test]
    fn test_default_three_columns() {
        let result = WcCommand.execute(ctx(&[], "hello world\nfoo bar\n"));
        assert_eq!(result.stdout, "       2       4      20\n");
    }

    #[test]
    fn test_lines_only() {
        let result = WcCommand.execute(ctx(&["-l"], "a\nb\nc\n"));
        assert_eq!(result.stdout, "       3\n");
    }

    #[test]
    fn test_words_only() {
        let result = WcCommand.execute(ctx(&["-w"], "one two three"));
        assert_eq!(result.stdout, "       3\n");
    }

    #[test]
    fn test_bytes_only() {
        let result = WcCommand.execute(ctx(&["-c"], "abcd"));
        assert_eq!(result.stdout, "       4\n");
    }

    #[test]
    fn test_file_label_and_total() {
        let result = WcCommand.execute(ctx_with_files(
            &["-l", "/a", "/b"],
            "",
            &[("/a", "x\n"), ("/b", "y\nz\n")],
        ));
        assert_eq!(result.stdout, "       1 /a\n       2 /b\n       3 total\n");
    }

    #[test]
    fn test_missing_file() {
        let result = WcCommand.execute(ctx(&["/nope"], ""));
        assert_eq!(result.exit_code, 1);
    }
}
