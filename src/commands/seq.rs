//! `seq`.

use super::{Command, CommandContext, CommandResult};

pub struct SeqCommand;

impl Command for SeqCommand {
    fn name(&self) -> &'static str {
        "seq"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut separator = "\n".to_string();
        let mut operands: Vec<&str> = Vec::new();
        let mut iter = ctx.args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-s" => match iter.next() {
                    Some(sep) => separator = sep.clone(),
                    None => return CommandResult::error("seq: option requires an argument -- 's'\n"),
                },
                other => operands.push(other),
            }
        }

        let numbers: Vec<i64> = match operands
            .iter()
            .map(|s| s.parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(numbers) => numbers,
            Err(_) => {
                return CommandResult::error(format!(
                    "seq: invalid argument: {}\n",
                    operands.join(" ")
                ))
            }
        };

        let (first, step, last) = match numbers.as_slice() {
            [last] => (1, 1, *last),
            [first, last] => (*first, if first <= last { 1 } else { -1 }, *last),
            [first, step, last] => (*first, *step, *last),
            _ => return CommandResult::error("seq: usage: seq [first [step]] last\n"),
        };
        if step == 0 {
            return CommandResult::error("seq: step may not be 0\n");
        }

        let mut values = Vec::new();
        let mut n = first;
        while (step > 0 && n <= last) || (step < 0 && n >= last) {
            values.push(n.to_string());
            n += step;
        }

        let mut stdout = values.join(&separator);
        if !stdout.is_empty() {
            stdout.push('\n');
        }
        CommandResult::success(stdout)
    }
}
