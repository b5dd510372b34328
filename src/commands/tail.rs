//! `tail`.

use super::{args, Command, CommandContext, CommandResult};

pub struct TailCommand;

impl Command for TailCommand {
    fn name(&self) -> &'static str {
        "tail"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut argv = ctx.args.clone();
        if let Some(first) = argv.first() {
            if first.len() > 1 && first.starts_with('-') && first[1..].chars().all(|c| c.is_ascii_digit()) {
                argv[0] = format!("-n{}", &first[1..]);
            }
        }

        let parsed = match args::parse(&argv, "f", "nc") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("tail: {}\n", e)),
        };

        // `+N` means "from line N"; plain N means "last N".
        let spec = parsed.value('n').or(parsed.value('c')).unwrap_or("10").to_string();
        let from_start = spec.starts_with('+');
        let count: usize = match spec.trim_start_matches('+').parse() {
            Ok(n) => n,
            Err(_) => return CommandResult::error("tail: invalid number of lines\n"),
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
                    stderr.push_str(&format!("tail: {}\n", message));
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
                let chars: Vec<char> = content.chars().collect();
                let slice: String = if from_start {
                    chars.iter().skip(count.saturating_sub(1)).collect()
                } else {
                    chars.iter().skip(chars.len().saturating_sub(count)).collect()
                };
                stdout.push_str(&slice);
            } else {
                let lines: Vec<&str> = content.split_inclusive('\n').collect();
                let slice: String = if from_start {
                    lines.iter().skip(count.saturating_sub(1)).copied().collect()
                } else {
                    lines.iter().skip(lines.len().saturating_sub(count)).copied().collect()
                };
                stdout.push_str(&slice);
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
    fn test_default_last_ten() {
        let result = TailCommand.execute(ctx(&[], &lines(15)));
        let expected: String = (6..=15).map(|i| format!("line{}\n", i)).collect();
        assert_eq!(result.stdout, expected);
    }

    #[test]
    fn test_dash_n() {
        let result = TailCommand.execute(ctx(&["-n", "2"], &lines(5)));
        assert_eq!(result.stdout, "line4\nline5\n");
    }

    #[test]
    fn test_plus_n_from_start() {
        let result = TailCommand.execute(ctx(&["-n", "+3"], &lines(5)));
        assert_eq!(result.stdout, "line3\nline4\nline5\n");
    }

    #[test]
    fn test_legacy_numeric_flag() {
        let result = TailCommand.execute(ctx(&["-1"], &lines(3)));
        assert_eq!(result.stdout, "line3\n");
    }

    #[test]
    fn test_bytes_mode() {
        let result = TailCommand.execute(ctx(&["-c", "3"], "abcdef"));
        assert_eq!(result.stdout, "def");
    }
}
