//! `basename`.

use super::{Command, CommandContext, CommandResult};

pub struct BasenameCommand;

impl Command for BasenameCommand {
    fn name(&self) -> &'static str {
        "basename"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let Some(path) = ctx.args.first() else {
            return CommandResult::error("basename: missing operand\n");
        };
        let mut base = crate::fs::base_name(path);
        if let Some(suffix) = ctx.args.get(1) {
            if base != *suffix {
                if let Some(stripped) = base.strip_suffix(suffix.as_str()) {
                    base = stripped.to_string();
                }
            }
        }
        CommandResult::success(format!("{}\n", base))
    }
}
