//! `cat`.

use super::{args, Command, CommandContext, CommandResult};

pub struct CatCommand;

impl Command for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "n", "") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("cat: {}\n", e)),
        };

        let mut operands = parsed.operands.clone();
        if operands.is_empty() {
            operands.push("-".to_string());
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        for operand in &operands {
            match ctx.read_input(operand) {
                Ok(content) => stdout.push_str(&content),
                Err(message) => {
                    stderr.push_str(&format!("cat: {}\n", message));
                    exit_code = 1;
                }
            }
        }

        if parsed.has('n') {
            let numbered: String = stdout
                .split_inclusive('\n')
                .enumerate()
                .map(|(i, line)| format!("{:>6}\t{}", i + 1, line))
                .collect();
            stdout = numbered;
        }
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}
