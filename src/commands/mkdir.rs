//! `mkdir`.

use super::{args, Command, CommandContext, CommandResult};

pub struct MkdirCommand;

impl Command for MkdirCommand {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "p", "m") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("mkdir: {}\n", e)),
        };
        if parsed.operands.is_empty() {
            return CommandResult::error("mkdir: missing operand\n");
        }

        let mut stderr = String::new();
        let mut exit_code = 0;
        for operand in &parsed.operands {
            let path = ctx.absolute(operand);
            if let Err(e) = ctx.fs.mkdir(&path, parsed.has('p')) {
                stderr.push_str(&format!(
                    "mkdir: cannot create directory '{}': {}\n",
                    operand,
                    e.reason()
                ));
                exit_code = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx;

    #[test]
    fn test_creates_directory() {
        let context = ctx(&["/newdir"], "");
        let fs = context.fs.clone();
        assert_eq!(MkdirCommand.execute(context).exit_code, 0);
        assert!(fs.stat("/newdir").unwrap().is_directory);
    }

    #[test]
    fn test_nested_needs_p() {
        let context = ctx(&["/a/b/c"], "");
        assert_eq!(MkdirCommand.execute(context).exit_code, 1);

        let context = ctx(&["-p", "/a/b/c"], "");
        let fs = context.fs.clone();
        assert_eq!(MkdirCommand.execute(context).exit_code, 0);
        assert!(fs.exists("/a/b/c"));
    }

    #[test]
    fn test_existing_fails_without_p() {
        let context = ctx(&["/dup"], "");
        let fs = context.fs.clone();
        MkdirCommand.execute(context).exit_code;
        let mut context2 = ctx(&["/dup"], "");
        context2.fs = fs;
        let r = MkdirCommand.execute(context2);
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("File exists"));
    }
}
