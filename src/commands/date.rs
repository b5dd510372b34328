//! `date`.
//!
//! Reads the session's pinned clock when one is configured, so scripts
//! that call `date` stay reproducible under test.

use chrono::{DateTime, Utc};

use super::{Command, CommandContext, CommandResult};

pub struct DateCommand;

impl Command for DateCommand {
    fn name(&self) -> &'static str {
        "date"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let now: DateTime<Utc> = ctx.fixed_time.unwrap_or_else(Utc::now);

        let mut format: Option<String> = None;
        for arg in &ctx.args {
            match arg.as_str() {
                "-u" | "--utc" => {} // always UTC in the sandbox
                other if other.starts_with('+') => format = Some(other[1..].to_string()),
                other => {
                    return CommandResult::error(format!("date: invalid option '{}'\n", other))
                }
            }
        }

        let rendered = match format {
            Some(fmt) => {
                // %s and %N need explicit handling; the rest is strftime.
                let fmt = fmt
                    .replace("%s", &now.timestamp().to_string())
                    .replace("%N", &format!("{:09}", now.timestamp_subsec_nanos()));
                use chrono::format::{Item, StrftimeItems};
                let items: Vec<Item> = StrftimeItems::new(&fmt).collect();
                if items.iter().any(|item| matches!(item, Item::Error)) {
                    return CommandResult::error(format!("date: invalid format '+{}'\n", fmt));
                }
                now.format_with_items(items.into_iter()).to_string()
            }
            None => now.format("%a %b %e %H:%M:%S UTC %Y").to_string(),
        };
        CommandResult::success(format!("{}\n", rendered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx;
    use chrono::TimeZone;

    fn pinned(args: &[&str]) -> CommandResult {
        let mut context = ctx(args, "");
        context.fixed_time = Some(Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 45).unwrap());
        DateCommand.execute(context)
    }

    #[test]
    fn test_default_format() {
        assert_eq!(pinned(&[]).stdout, "Fri Mar 15 10:30:45 UTC 2024\n");
    }

    #[test]
    fn test_custom_format() {
        assert_eq!(pinned(&["+%Y-%m-%d"]).stdout, "2024-03-15\n");
        assert_eq!(pinned(&["+%H:%M"]).stdout, "10:30\n");
    }

    #[test]
    fn test_epoch_seconds() {
        assert_eq!(pinned(&["+%s"]).stdout, "1710498645\n");
    }

    #[test]
    fn test_invalid_option() {
        assert_eq!(pinned(&["-q"]).exit_code, 1);
    }
}
