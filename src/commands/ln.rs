//! `ln`.

use super::{args, Command, CommandContext, CommandResult};

pub struct LnCommand;

impl Command for LnCommand {
    fn name(&self) -> &'static str {
        "ln"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "sf", "") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("ln: {}\n", e)),
        };
        let [target, link_name] = parsed.operands.as_slice() else {
            return CommandResult::error("ln: usage: ln [-sf] target link_name\n");
        };

        let link_abs = ctx.absolute(link_name);
        if parsed.has('f') && ctx.fs.exists(&link_abs) {
            let _ = ctx.fs.rm(&link_abs, crate::fs::RmOptions { recursive: false, force: true });
        }

        let result = if parsed.has('s') {
            // Symlink targets stay as written, relative or not.
            ctx.fs.symlink(target, &link_abs)
        } else {
            ctx.fs.link(&ctx.absolute(target), &link_abs)
        };
        match result {
            Ok(()) => CommandResult::default(),
            Err(e) => CommandResult::error(format!(
                "ln: failed to create link '{}': {}\n",
                link_name,
                e.reason()
            )),
        }
    }
}
