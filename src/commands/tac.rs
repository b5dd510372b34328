//! `tac`.

use super::{Command, CommandContext, CommandResult};

pub struct TacCommand;

impl Command for TacCommand {
    fn name(&self) -> &'static str {
        "tac"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let content = match ctx.args.first() {
            None => ctx.stdin.clone(),
            Some(operand) => match ctx.read_input(operand) {
                Ok(text) => text,
                Err(message) => return CommandResult::error(format!("tac: {}\n", message)),
            },
        };

        let mut stdout = String::with_capacity(content.len());
        for line in content.lines().rev() {
            stdout.push_str(line);
            stdout.push('\n');
        }
        CommandResult::success(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx;

    #[test]
    fn test_reverses_line_order() {
        let r = TacCommand.execute(ctx(&[], "a\nb\nc\n"));
        assert_eq!(r.stdout, "c\nb\na\n");
    }

    #[test]
    fn test_empty() {
        assert_eq!(TacCommand.execute(ctx(&[], "")).stdout, "");
    }
}
