//! `sleep`.
//!
//! The execution model is cooperative with no time source, so sleeping is
//! a validated no-op.

use super::{Command, CommandContext, CommandResult};

pub struct SleepCommand;

impl Command for SleepCommand {
    fn name(&self) -> &'static str {
        "sleep"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let Some(spec) = ctx.args.first() else {
            return CommandResult::error("sleep: missing operand\n");
        };
        let digits = spec
            .strip_suffix(['s', 'm', 'h', 'd'])
            .unwrap_or(spec);
        if digits.parse::<f64>().is_err() {
            return CommandResult::error(format!("sleep: invalid time interval '{}'\n", spec));
        }
        CommandResult::default()
    }
}
