//! `uniq`.
//!
//! `-c` counts are right-aligned in a 7-column field, a width downstream
//! scripts rely on.

use super::{args, Command, CommandContext, CommandResult};

pub struct UniqCommand;

impl Command for UniqCommand {
    fn name(&self) -> &'static str {
        "uniq"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "cdui", "") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("uniq: {}\n", e)),
        };

        let content = match parsed.operands.first() {
            None => ctx.stdin.clone(),
            Some(operand) => match ctx.read_input(operand) {
                Ok(text) => text,
                Err(message) => return CommandResult::error(format!("uniq: {}\n", message)),
            },
        };

        let ignore_case = parsed.has('i');
        let lines: Vec<&str> = content.lines().collect();
        let mut groups: Vec<(usize, &str)> = Vec::new();
        for line in lines {
            let same = groups.last().is_some_and(|(_, prev)| {
                if ignore_case {
                    prev.eq_ignore_ascii_case(line)
                } else {
                    *prev == line
                }
            });
            if same {
                groups.last_mut().unwrap().0 += 1;
            } else {
                groups.push((1, line));
            }
        }

        let mut stdout = String::new();
        for (count, line) in groups {
            if parsed.has('d') && count < 2 {
                continue;
            }
            if parsed.has('u') && count > 1 {
                continue;
            }
            if parsed.has('c') {
                stdout.push_str(&format!("{:>7} {}\n", count, line));
            } else {
                stdout.push_str(line);
                stdout.push('\n');
            }
        }
        CommandResult::success(stdout)
    }
}
