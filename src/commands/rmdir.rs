//! `rmdir`.

use crate::fs::RmOptions;

use super::{Command, CommandContext, CommandResult};

pub struct RmdirCommand;

impl Command for RmdirCommand {
    fn name(&self) -> &'static str {
        "rmdir"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        if ctx.args.is_empty() {
            return CommandResult::error("rmdir: missing operand\n");
        }
        let mut stderr = String::new();
        let mut exit_code = 0;
        for operand in &ctx.args {
            let path = ctx.absolute(operand);
            let failure = match ctx.fs.stat(&path) {
                Err(e) => Some(e.reason().to_string()),
                Ok(stat) if !stat.is_directory => Some("Not a directory".to_string()),
                Ok(_) => match ctx.fs.readdir(&path) {
                    Ok(entries) if !entries.is_empty() => {
                        Some("Directory not empty".to_string())
                    }
                    _ => ctx
                        .fs
                        .rm(&path, RmOptions { recursive: true, force: false })
                        .err()
                        .map(|e| e.reason().to_string()),
                },
            };
            if let Some(reason) = failure {
                stderr.push_str(&format!("rmdir: failed to remove '{}': {}\n", operand, reason));
                exit_code = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
    }
}
