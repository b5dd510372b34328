//! `true` and `false`.

use super::{Command, CommandContext, CommandResult};

pub struct TrueCommand;

impl Command for TrueCommand {
    fn name(&self) -> &'static str {
        "true"
    }

    fn execute(&self, _: CommandContext) -> CommandResult {
        CommandResult::default()
    }
}

pub struct FalseCommand;

impl Command for FalseCommand {
    fn name(&self) -> &'static str {
        "false"
    }

    fn execute(&self, _: CommandContext) -> CommandResult {
        CommandResult { exit_code: 1, ..CommandResult::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx;

    #[test]
    fn test_exit_codes() {
        assert_eq!(TrueCommand.execute(ctx(&[], "")).exit_code, 0);
        assert_eq!(FalseCommand.execute(ctx(&[], "")).exit_code, 1);
    }
}
