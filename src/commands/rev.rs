//! `rev`.

use super::{Command, CommandContext, CommandResult};

pub struct RevCommand;

impl Command for RevCommand {
    fn name(&self) -> &'static str {
        "rev"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let content = match ctx.args.first() {
            None => ctx.stdin.clone(),
            Some(operand) => match ctx.read_input(operand) {
                Ok(text) => text,
                Err(message) => return CommandResult::error(format!("rev: {}\n", message)),
            },
        };

        let mut stdout = String::with_capacity(content.len());
        for line in content.split_inclusive('\n') {
            let (body, newline) = match line.strip_suffix('\n') {
                Some(body) => (body, true),
                None => (line, false),
            };
            stdout.extend(body.chars().rev());
            if newline {
                stdout.push('\n');
            }
        }
        CommandResult::success(stdout)
    }
}
