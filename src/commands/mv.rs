//! `mv`.

use super::{args, Command, CommandContext, CommandResult};

pub struct MvCommand;

impl Command for MvCommand {
    fn name(&self) -> &'static str {
        "mv"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "f", "") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("mv: {}\n", e)),
        };
        if parsed.operands.len() < 2 {
            return CommandResult::error("mv: missing file operand\n");
        }
        let (dest, sources) = parsed.operands.split_last().unwrap();
        let dest_abs = ctx.absolute(dest);
        let dest_is_dir = ctx.fs.stat(&dest_abs).map(|s| s.is_directory).unwrap_or(false);
        if sources.len() > 1 && !dest_is_dir {
            return CommandResult::error(format!("mv: target '{}' is not a directory\n", dest));
        }

        let mut stderr = String::new();
        let mut exit_code = 0;
        for source in sources {
            let src_abs = ctx.absolute(source);
            if let Err(e) = ctx.fs.mv(&src_abs, &dest_abs) {
                stderr.push_str(&format!(
                    "mv: cannot move '{}' to '{}': {}\n",
                    source,
                    dest,
                    e.reason()
                ));
                exit_code = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
    }
}
