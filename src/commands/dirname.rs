//! `dirname`.

use super::{Command, CommandContext, CommandResult};

pub struct DirnameCommand;

impl Command for DirnameCommand {
    fn name(&self) -> &'static str {
        "dirname"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let Some(path) = ctx.args.first() else {
            return CommandResult::error("dirname: missing operand\n");
        };
        let trimmed = if path.len() > 1 { path.trim_end_matches('/') } else { path.as_str() };
        let dir = crate::fs::dir_name(trimmed);
        CommandResult::success(format!("{}\n", dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx;

    fn run(args: &[&str]) -> String {
        DirnameCommand.execute(ctx(args, "")).stdout
    }

    #[test]
    fn test_basic() {
        assert_eq!(run(&["/usr/local/bin"]), "/usr/local\n");
        assert_eq!(run(&["/top"]), "/\n");
        assert_eq!(run(&["relative/file"]), "relative\n");
        assert_eq!(run(&["noslash"]), ".\n");
    }
}
