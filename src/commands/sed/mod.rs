//! The sed engine: parser + executor + the `sed` command.

pub mod exec;
pub mod parser;

use exec::SedExecutor;

use super::{Command, CommandContext, CommandResult};

pub struct SedCommand;

impl Command for SedCommand {
    fn name(&self) -> &'static str {
        "sed"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut quiet = false;
        let mut extended = false;
        let mut in_place = false;
        let mut scripts: Vec<String> = Vec::new();
        let mut operands: Vec<String> = Vec::new();

        let mut iter = ctx.args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-n" => quiet = true,
                "-E" | "-r" => extended = true,
                "-i" => in_place = true,
                "-e" => match iter.next() {
                    Some(script) => scripts.push(script.clone()),
                    None => {
                        return CommandResult::error_with_code(
                            "sed: option requires an argument -- 'e'\n",
                            1,
                        )
                    }
                },
                "-f" => match iter.next() {
                    Some(path) => match ctx.fs.read_file(&ctx.absolute(path)) {
                        Ok(content) => scripts.push(content),
                        Err(e) => {
                            return CommandResult::error_with_code(
                                format!("sed: can't read {}: {}\n", path, e.reason()),
                                1,
                            )
                        }
                    },
                    None => {
                        return CommandResult::error_with_code(
                            "sed: option requires an argument -- 'f'\n",
                            1,
                        )
                    }
                },
                other if other.starts_with('-') && other.len() > 1 => {
                    return CommandResult::error_with_code(
                        format!("sed: invalid option -- '{}'\n", other),
                        1,
                    )
                }
                other => operands.push(other.to_string()),
            }
        }

        if scripts.is_empty() {
            if operands.is_empty() {
                return CommandResult::error_with_code("sed: no script specified\n", 1);
            }
            scripts.push(operands.remove(0));
        }

        let instructions = match parser::parse_script(&scripts.join("\n")) {
            Ok(instructions) => instructions,
            Err(message) => {
                return CommandResult::error_with_code(
                    format!("sed: -e expression #1: {}\n", message),
                    1,
                )
            }
        };

        if in_place {
            if operands.is_empty() {
                return CommandResult::error_with_code("sed: -i requires a file operand\n", 1);
            }
            let mut stderr = String::new();
            let mut exit_code = 0;
            for file in &operands {
                let path = ctx.absolute(file);
                let content = match ctx.fs.read_file(&path) {
                    Ok(content) => content,
                    Err(e) => {
                        stderr.push_str(&format!("sed: can't read {}: {}\n", file, e.reason()));
                        exit_code = 2;
                        continue;
                    }
                };
                let mut executor = SedExecutor::new(&instructions, extended, quiet);
                match executor.run(&content) {
                    Ok(run) => {
                        if let Err(e) = ctx.fs.write_file(&path, run.output.as_bytes()) {
                            stderr.push_str(&format!("sed: couldn't write {}: {}\n", file, e.reason()));
                            exit_code = 2;
                        }
                    }
                    Err(message) => {
                        return CommandResult::error_with_code(format!("sed: {}\n", message), 1)
                    }
                }
            }
            return CommandResult::with_exit_code(String::new(), stderr, exit_code);
        }

        let mut input = String::new();
        if operands.is_empty() {
            input = ctx.stdin.clone();
        } else {
            for file in &operands {
                match ctx.read_input(file) {
                    Ok(content) => input.push_str(&content),
                    Err(message) => {
                        return CommandResult::error_with_code(
                            format!("sed: can't read {}\n", message),
                            2,
                        )
                    }
                }
            }
        }

        let mut executor = SedExecutor::new(&instructions, extended, quiet);
        match executor.run(&input) {
            Ok(run) => CommandResult::success(run.output),
            Err(message) => CommandResult::error_with_code(format!("sed: {}\n", message), 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::{ctx, ctx_with_files};

    fn sed(args: &[&str], stdin: &str) -> CommandResult {
        SedCommand.execute(ctx(args, stdin))
    }

    #[test]
    fn test_basic_substitution() {
        assert_eq!(sed(&["s/a/b/"], "aaa\n").stdout, "baa\n");
    }

    #[test]
    fn test_quiet_print() {
        assert_eq!(sed(&["-n", "/x/p"], "ax\nb\n").stdout, "ax\n");
    }

    #[test]
    fn test_multiple_e_scripts() {
        assert_eq!(sed(&["-e", "s/a/b/", "-e", "s/b/c/"], "a\n").stdout, "c\n");
    }

    #[test]
    fn test_extended_regex_flag() {
        assert_eq!(sed(&["-E", "s/(a)+/X/"], "aaa b\n").stdout, "X b\n");
    }

    #[test]
    fn test_file_operand() {
        let r = SedCommand.execute(ctx_with_files(&["s/x/y/", "/f"], "", &[("/f", "x\n")]));
        assert_eq!(r.stdout, "y\n");
    }

    #[test]
    fn test_in_place_edit() {
        let context = ctx_with_files(&["-i", "s/old/new/", "/f"], "", &[("/f", "old stuff\n")]);
        let fs = context.fs.clone();
        let r = SedCommand.execute(context);
        assert_eq!(r.exit_code, 0);
        assert!(r.stdout.is_empty());
        assert_eq!(fs.read_file("/f").unwrap(), "new stuff\n");
    }

    #[test]
    fn test_no_script_is_error() {
        assert_eq!(sed(&[], "x\n").exit_code, 1);
    }

    #[test]
    fn test_bad_script_is_error() {
        let r = sed(&["s/a"], "x\n");
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("sed:"));
    }

    #[test]
    fn test_delete_lines() {
        assert_eq!(sed(&["/^#/d"], "#comment\ncode\n").stdout, "code\n");
    }
}
