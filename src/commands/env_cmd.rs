//! `env`.

use super::{Command, CommandContext, CommandResult};

pub struct EnvCommand;

impl Command for EnvCommand {
    fn name(&self) -> &'static str {
        "env"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut entries: Vec<(&String, &String)> = ctx
            .env
            .iter()
            .filter(|(name, _)| !name.starts_with("__"))
            .collect();
        entries.sort_by_key(|(name, _)| name.as_str());
        let mut stdout = String::new();
        for (name, value) in entries {
            stdout.push_str(&format!("{}={}\n", name, value));
        }
        CommandResult::success(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx;

    #[test]
    fn test_sorted_env_listing() {
        let mut context = ctx(&[], "");
        context.env.insert("B".to_string(), "2".to_string());
        context.env.insert("A".to_string(), "1".to_string());
        assert_eq!(EnvCommand.execute(context).stdout, "A=1\nB=2\n");
    }

    #[test]
    fn test_internal_slots_hidden() {
        let mut context = ctx(&[], "");
        context.env.insert("__STDIN__".to_string(), "x".to_string());
        assert_eq!(EnvCommand.execute(context).stdout, "");
    }
}
