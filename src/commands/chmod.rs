//! `chmod`.
//!
//! Octal modes plus the common symbolic forms (`u+x`, `go-w`, `a=r`).

use super::{Command, CommandContext, CommandResult};

pub struct ChmodCommand;

impl Command for ChmodCommand {
    fn name(&self) -> &'static str {
        "chmod"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut operands: Vec<&String> =
            ctx.args.iter().filter(|a| a.as_str() != "-R").collect();
        if operands.len() < 2 {
            return CommandResult::error("chmod: missing operand\n");
        }
        let spec = operands.remove(0).clone();

        let mut stderr = String::new();
        let mut exit_code = 0;
        for operand in operands {
            let path = ctx.absolute(operand);
            let current = match ctx.fs.stat(&path) {
                Ok(stat) => stat.mode,
                Err(e) => {
                    stderr.push_str(&format!(
                        "chmod: cannot access '{}': {}\n",
                        operand,
                        e.reason()
                    ));
                    exit_code = 1;
                    continue;
                }
            };
            let Some(mode) = apply_mode_spec(&spec, current) else {
                return CommandResult::error(format!("chmod: invalid mode: '{}'\n", spec));
            };
            if let Err(e) = ctx.fs.chmod(&path, mode) {
                stderr.push_str(&format!("chmod: '{}': {}\n", operand, e.reason()));
                exit_code = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
    }
}

fn apply_mode_spec(spec: &str, current: u32) -> Option<u32> {
    if let Ok(mode) = u32::from_str_radix(spec, 8) {
        return Some(mode & 0o7777);
    }

    let mut mode = current;
    for clause in spec.split(',') {
        let op_index = clause.find(['+', '-', '='])?;
        let (who, rest) = clause.split_at(op_index);
        let op = rest.chars().next()?;
        let perms = &rest[1..];

        let who_mask: u32 = if who.is_empty() {
            0o777
        } else {
            let mut mask = 0;
            for c in who.chars() {
                mask |= match c {
                    'u' => 0o700,
                    'g' => 0o070,
                    'o' => 0o007,
                    'a' => 0o777,
                    _ => return None,
                };
            }
            mask
        };

        let mut bits = 0;
        for c in perms.chars() {
            bits |= match c {
                'r' => 0o444,
                'w' => 0o222,
                'x' => 0o111,
                _ => return None,
            };
        }
        let selected = bits & who_mask;
        match op {
            '+' => mode |= selected,
            '-' => mode &= !selected,
            '=' => mode = (mode & !who_mask) | selected,
            _ => return None,
        }
    }
    Some(mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx_with_files;

    #[test]
    fn test_octal() {
        let context = ctx_with_files(&["755", "/f"], "", &[("/f", "")]);
        let fs = context.fs.clone();
        assert_eq!(ChmodCommand.execute(context).exit_code, 0);
        assert_eq!(fs.stat("/f").unwrap().mode, 0o755);
    }

    #[test]
    fn test_symbolic_add() {
        let context = ctx_with_files(&["u+x", "/f"], "", &[("/f", "")]);
        let fs = context.fs.clone();
        ChmodCommand.execute(context);
        assert_eq!(fs.stat("/f").unwrap().mode, 0o744);
    }

    #[test]
    fn test_symbolic_remove() {
        let context = ctx_with_files(&["go-r", "/f"], "", &[("/f", "")]);
        let fs = context.fs.clone();
        ChmodCommand.execute(context);
        assert_eq!(fs.stat("/f").unwrap().mode, 0o600);
    }

    #[test]
    fn test_invalid_mode() {
        let context = ctx_with_files(&["zz", "/f"], "", &[("/f", "")]);
        assert_eq!(ChmodCommand.execute(context).exit_code, 1);
    }

    #[test]
    fn test_missing_file() {
        let context = ctx_with_files(&["644", "/nope"], "", &[]);
        assert_eq!(ChmodCommand.execute(context).exit_code, 1);
    }
}
