//! `readlink`.

use super::{args, Command, CommandContext, CommandResult};

pub struct ReadlinkCommand;

impl Command for ReadlinkCommand {
    fn name(&self) -> &'static str {
        "readlink"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "f", "") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("readlink: {}\n", e)),
        };
        let Some(operand) = parsed.operands.first() else {
            return CommandResult::error("readlink: missing operand\n");
        };
        let path = ctx.absolute(operand);

        if parsed.has('f') {
            // Canonical path: follow every symlink.
            return match ctx.fs.stat(&path) {
                Ok(_) => {
                    let mut current = path;
                    let mut hops = 0;
                    while let Ok(target) = ctx.fs.readlink(&current) {
                        current = if target.starts_with('/') {
                            target
                        } else {
                            ctx.fs.resolve_path(&crate::fs::dir_name(&current), &target)
                        };
                        hops += 1;
                        if hops > 40 {
                            break;
                        }
                    }
                    CommandResult::success(format!("{}\n", current))
                }
                Err(_) => CommandResult::error_with_code("", 1),
            };
        }

        match ctx.fs.readlink(&path) {
            Ok(target) => CommandResult::success(format!("{}\n", target)),
            Err(_) => CommandResult::error_with_code("", 1),
        }
    }
}
