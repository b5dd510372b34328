//! `head`.

use super::{args, Command, CommandContext, CommandResult};

pub struct HeadCommand;

impl Command for HeadCommand {
    fn name(&self) -> &'static str {
        "head"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        // Legacy `head -5` form.
        let mut argv = ctx.args.clone();
        if let Some(first) = argv.first() {
            if first.len() > 1 && first.starts_with('-') && first[1..].chars().all(|c| c.is_ascii_digit()) {
                argv[0] = format!("-n{}", &first[1..]);
            }
        }

        let parsed = match args::parse(&argv, "", "nc") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("head: {}\n", e)),
        };

        let count: usize = match parsed.value('n').or(parsed.value('c')).unwrap_or("10").parse() {
            Ok(n) => n,
            Err(_) => return CommandResult::error("head: invalid number of lines\n"),
        };
        let bytes_mode = parsed.has('c');

        let mut operands = parsed.operands.clone();
        if operands.is_empty() {
            operands.push("-".to_string());
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let show_headers = operands.len() > 1;
        for (i, operand) in operands.iter().enumerate() {
            let content = match ctx.read_input(operand) {
                Ok(content) => content,
                Err(message) => {
                    stderr.push_str(&format!("head: {}\n", message));
                    exit_code = 1;
                    continue;
                }
            };
            if show_headers {
                if i > 0 {
                    stdout.push('\n');
                }
                stdout.push_str(&format!("==> {} <==\n", operand));
            }
            if bytes_mode {
                stdout.push_str(&content.chars().take(count).collect::<String>());
            } else {
                stdout.push_str(&content.split_inclusive('\n').take(count).collect::<String>());
            }
        }
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx;

    fn lines(n: usize) -> String {
        (1..=n).map(|i| format!("line{}\n", i)).collect()
    }

    #[test]
    fn test_default_ten_lines() {
        let result = HeadCommand.execute(ctx(&[], &lines(15)));
        assert_eq!(result.stdout, lines(10));
    }

    #[test]
    fn test_dash_n() {
        let result = HeadCommand.execute(ctx(&["-n", "2"], &lines(5)));
        assert_eq!(result.stdout, "line1\nline2\n");
    }

    #[test]
    fn test_legacy_numeric_flag() {
        let result = HeadCommand.execute(ctx(&["-3"], &lines(5)));
        assert_eq!(result.stdout, "line1\nline2\nline3\n");
    }

    #[test]
    fn test_bytes_mode() {
        let result = HeadCommand.execute(ctx(&["-c", "4"], "abcdefgh"));
        assert_eq!(result.stdout, "abcd");
    }

    #[test]
    fn test_fewer_lines_than_requested() {
        let result = HeadCommand.execute(ctx(&["-n", "10"], "only\n"));
        assert_eq!(result.stdout, "only\n");
    }
}
