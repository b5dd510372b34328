//! `sort`.

use super::{args, Command, CommandContext, CommandResult};

pub struct SortCommand;

impl Command for SortCommand {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "rnuf", "") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("sort: {}\n", e)),
        };

        let mut content = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        if parsed.operands.is_empty() {
            content = ctx.stdin.clone();
        } else {
            for operand in &parsed.operands {
                match ctx.read_input(operand) {
                    Ok(text) => content.push_str(&text),
                    Err(message) => {
                        stderr.push_str(&format!("sort: {}\n", message));
                        exit_code = 2;
                    }
                }
            }
        }

        let mut lines: Vec<&str> = content.lines().collect();
        let numeric = parsed.has('n');
        let fold_case = parsed.has('f');

        lines.sort_by(|a, b| {
            if numeric {
                let na = leading_number(a);
                let nb = leading_number(b);
                na.partial_cmp(&nb).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.cmp(b))
            } else if fold_case {
                a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
            } else {
                a.cmp(b)
            }
        });

        if parsed.has('r') {
            lines.reverse();
        }
        if parsed.has('u') {
            lines.dedup();
        }

        let mut stdout: String = lines.join("\n");
        if !stdout.is_empty() {
            stdout.push('\n');
        }
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

fn leading_number(line: &str) -> f64 {
    let trimmed = line.trim_start();
    let mut end = 0;
    let bytes = trimmed.as_bytes();
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {}
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    trimmed[..end].parse().unwrap_or(0.0)
}
