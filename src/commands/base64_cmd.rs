//! `base64`.
//!
//! Encoded output wraps at 76 columns unless `-w` overrides it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::{args, Command, CommandContext, CommandResult};

pub struct Base64Command;

impl Command for Base64Command {
    fn name(&self) -> &'static str {
        "base64"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "di", "w") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("base64: {}\n", e)),
        };

        let input = match parsed.operands.first() {
            None => ctx.stdin.clone(),
            Some(operand) => match ctx.read_input(operand) {
                Ok(text) => text,
                Err(message) => return CommandResult::error(format!("base64: {}\n", message)),
            },
        };

        if parsed.has('d') {
            let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
            return match STANDARD.decode(cleaned.as_bytes()) {
                Ok(bytes) => CommandResult::success(String::from_utf8_lossy(&bytes).into_owned()),
                Err(_) => CommandResult::error("base64: invalid input\n"),
            };
        }

        let wrap: usize = match parsed.value('w') {
            Some(value) => match value.parse() {
                Ok(n) => n,
                Err(_) => {
                    return CommandResult::error(format!("base64: invalid wrap size: {}\n", value))
                }
            },
            None => 76,
        };

        let encoded = STANDARD.encode(input.as_bytes());
        let mut stdout = String::new();
        if wrap == 0 {
            stdout.push_str(&encoded);
            stdout.push('\n');
        } else {
            let chars: Vec<char> = encoded.chars().collect();
            for chunk in chars.chunks(wrap) {
                stdout.extend(chunk);
                stdout.push('\n');
            }
            if chars.is_empty() {
                stdout.push('\n');
            }
        }
        CommandResult::success(stdout)
    }
}
