//! `touch`.

use super::{Command, CommandContext, CommandResult};

pub struct TouchCommand;

impl Command for TouchCommand {
    fn name(&self) -> &'static str {
        "touch"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        if ctx.args.is_empty() {
            return CommandResult::error("touch: missing file operand\n");
        }
        let mut stderr = String::new();
        let mut exit_code = 0;
        for operand in &ctx.args {
            let path = ctx.absolute(operand);
            if let Err(e) = ctx.fs.touch(&path) {
                stderr.push_str(&format!("touch: cannot touch '{}': {}\n", operand, e.reason()));
                exit_code = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
    }
}
