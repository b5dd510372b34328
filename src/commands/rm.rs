//! `rm`.

use crate::fs::RmOptions;

use super::{args, Command, CommandContext, CommandResult};

pub struct RmCommand;

impl Command for RmCommand {
    fn name(&self) -> &'static str {
        "rm"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "rRfv", "") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("rm: {}\n", e)),
        };
        let recursive = parsed.has('r') || parsed.has('R');
        let force = parsed.has('f');

        if parsed.operands.is_empty() {
            if force {
                return CommandResult::default();
            }
            return CommandResult::error("rm: missing operand\n");
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        for operand in &parsed.operands {
            let path = ctx.absolute(operand);
            match ctx.fs.rm(&path, RmOptions { recursive, force }) {
                Ok(()) => {
                    if parsed.has('v') {
                        stdout.push_str(&format!("removed '{}'\n", operand));
                    }
                }
                Err(e) => {
                    if !force {
                        stderr.push_str(&format!(
                            "rm: cannot remove '{}': {}\n",
                            operand,
                            e.reason()
                        ));
                        exit_code = 1;
                    }
                }
            }
        }
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::{ctx, ctx_with_files};

    #[test]
    fn test_removes_file() {
        let context = ctx_with_files(&["/f"], "", &[("/f", "x")]);
        let fs = context.fs.clone();
        assert_eq!(RmCommand.execute(context).exit_code, 0);
        assert!(!fs.exists("/f"));
    }

    #[test]
    fn test_directory_needs_r() {
        let context = ctx_with_files(&["/d"], "", &[("/d/f", "x")]);
        let r = RmCommand.execute(context);
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("Is a directory"));

        let context = ctx_with_files(&["-r", "/d"], "", &[("/d/f", "x")]);
        let fs = context.fs.clone();
        assert_eq!(RmCommand.execute(context).exit_code, 0);
        assert!(!fs.exists("/d"));
    }

    #[test]
    fn test_force_squelches_missing() {
        assert_eq!(RmCommand.execute(ctx(&["-f", "/nope"], "")).exit_code, 0);
        assert_eq!(RmCommand.execute(ctx(&["/nope"], "")).exit_code, 1);
    }

    #[test]
    fn test_verbose() {
        let context = ctx_with_files(&["-v", "/f"], "", &[("/f", "x")]);
        assert_eq!(RmCommand.execute(context).stdout, "removed '/f'\n");
    }
}
