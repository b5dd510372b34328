//! `cut`.

use super::{args, Command, CommandContext, CommandResult};

pub struct CutCommand;

impl Command for CutCommand {
    fn name(&self) -> &'static str {
        "cut"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "s", "dfc") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("cut: {}\n", e)),
        };

        let content = match parsed.operands.first() {
            None => ctx.stdin.clone(),
            Some(operand) => match ctx.read_input(operand) {
                Ok(text) => text,
                Err(message) => return CommandResult::error(format!("cut: {}\n", message)),
            },
        };

        if let Some(spec) = parsed.value('c') {
            let Some(ranges) = parse_ranges(spec) else {
                return CommandResult::error(format!("cut: invalid character range '{}'\n", spec));
            };
            let mut stdout = String::new();
            for line in content.lines() {
                let chars: Vec<char> = line.chars().collect();
                for (lo, hi) in &ranges {
                    let hi = (*hi).min(chars.len());
                    if *lo <= hi {
                        stdout.extend(&chars[lo - 1..hi]);
                    }
                }
                stdout.push('\n');
            }
            return CommandResult::success(stdout);
        }

        let Some(spec) = parsed.value('f') else {
            return CommandResult::error("cut: you must specify a list of fields or characters\n");
        };
        let Some(ranges) = parse_ranges(spec) else {
            return CommandResult::error(format!("cut: invalid field range '{}'\n", spec));
        };
        let delimiter = parsed.value('d').and_then(|d| d.chars().next()).unwrap_or('\t');
        let suppress = parsed.has('s');

        let mut stdout = String::new();
        for line in content.lines() {
            if !line.contains(delimiter) {
                if !suppress {
                    stdout.push_str(line);
                    stdout.push('\n');
                }
                continue;
            }
            let fields: Vec<&str> = line.split(delimiter).collect();
            let mut picked: Vec<&str> = Vec::new();
            for (lo, hi) in &ranges {
                let hi = (*hi).min(fields.len());
                if *lo <= hi {
                    picked.extend(&fields[lo - 1..hi]);
                }
            }
            let delimiter_str = delimiter.to_string();
            stdout.push_str(&picked.join(delimiter_str.as_str()));
            stdout.push('\n');
        }
        CommandResult::success(stdout)
    }
}

/// Parse `1,3-5,7-` into 1-based inclusive ranges.
fn parse_ranges(spec: &str) -> Option<Vec<(usize, usize)>> {
    let mut ranges = Vec::new();
    for piece in spec.split(',') {
        if let Some((lo, hi)) = piece.split_once('-') {
            let lo = if lo.is_empty() { 1 } else { lo.parse().ok()? };
            let hi = if hi.is_empty() { usize::MAX } else { hi.parse().ok()? };
            if lo == 0 {
                return None;
            }
            ranges.push((lo, hi));
        } else {
            let n: usize = piece.parse().ok()?;
            if n == 0 {
                return None;
            }
            ranges.push((n, n));
        }
    }
    Some(ranges)
}
