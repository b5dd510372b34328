//! `test` / `[`.
//!
//! The classic condition evaluator: string, integer and file predicates
//! with `!`, `-a`, `-o` and parentheses. Exit 0 is true, 1 false, 2 usage
//! error.

use super::{Command, CommandContext, CommandResult};

pub struct TestCommand {
    bracket: bool,
}

impl TestCommand {
    pub fn plain() -> Self {
        Self { bracket: false }
    }

    pub fn bracket() -> Self {
        Self { bracket: true }
    }
}

impl Command for TestCommand {
    fn name(&self) -> &'static str {
        if self.bracket {
            "["
        } else {
            "test"
        }
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut argv = ctx.args.clone();
        if self.bracket {
            match argv.last().map(String::as_str) {
                Some("]") => {
                    argv.pop();
                }
                _ => return CommandResult::error_with_code("[: missing `]'\n", 2),
            }
        }

        let mut parser = CondParser { ctx: &ctx, args: argv, pos: 0 };
        match parser.parse_or() {
            Ok(value) if parser.pos == parser.args.len() => {
                CommandResult { exit_code: i32::from(!value), ..CommandResult::default() }
            }
            Ok(_) => CommandResult::error_with_code("test: too many arguments\n", 2),
            Err(message) => CommandResult::error_with_code(format!("test: {}\n", message), 2),
        }
    }
}

struct CondParser<'a> {
    ctx: &'a CommandContext,
    args: Vec<String>,
    pos: usize,
}

impl<'a> CondParser<'a> {
    fn peek(&self) -> Option<&str> {
        self.args.get(self.pos).map(String::as_str)
    }

    fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos).cloned();
        if arg.is_some() {
            self.pos += 1;
        }
        arg
    }

    fn parse_or(&mut self) -> Result<bool, String> {
        let mut value = self.parse_and()?;
        while self.peek() == Some("-o") {
            self.pos += 1;
            let rhs = self.parse_and()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn parse_and(&mut self) -> Result<bool, String> {
        let mut value = self.parse_not()?;
        while self.peek() == Some("-a") {
            self.pos += 1;
            let rhs = self.parse_not()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn parse_not(&mut self) -> Result<bool, String> {
        if self.peek() == Some("!") {
            self.pos += 1;
            return Ok(!self.parse_not()?);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<bool, String> {
        if self.peek() == Some("(") {
            self.pos += 1;
            let value = self.parse_or()?;
            if self.next().as_deref() != Some(")") {
                return Err("expected `)'".to_string());
            }
            return Ok(value);
        }

        let Some(first) = self.next() else {
            // Empty expression is false.
            return Ok(false);
        };

        // Unary operators.
        if first.starts_with('-') && first.len() == 2 {
            if let Some(operand) = self.peek().map(str::to_string) {
                if let Some(result) = self.unary(&first, &operand) {
                    self.pos += 1;
                    return result;
                }
            }
        }

        // Binary operators.
        if let Some(op) = self.peek().map(str::to_string) {
            if is_binary_op(&op) {
                self.pos += 1;
                let Some(rhs) = self.next() else {
                    return Err(format!("{}: unary operator expected", op));
                };
                return binary(&first, &op, &rhs);
            }
        }

        // Bare string: true when non-empty.
        Ok(!first.is_empty())
    }

    fn unary(&self, op: &str, operand: &str) -> Option<Result<bool, String>> {
        let path = || self.ctx.absolute(operand);
        Some(Ok(match op {
            "-z" => operand.is_empty(),
            "-n" => !operand.is_empty(),
            "-e" => self.ctx.fs.exists(&path()),
            "-f" => self.ctx.fs.stat(&path()).map(|s| s.is_file).unwrap_or(false),
            "-d" => self.ctx.fs.stat(&path()).map(|s| s.is_directory).unwrap_or(false),
            "-L" | "-h" => self.ctx.fs.lstat(&path()).map(|s| s.is_symlink).unwrap_or(false),
            "-s" => self.ctx.fs.stat(&path()).map(|s| s.size > 0).unwrap_or(false),
            "-r" | "-w" => self.ctx.fs.exists(&path()),
            "-x" => self
                .ctx
                .fs
                .stat(&path())
                .map(|s| s.is_directory || s.mode & 0o111 != 0)
                .unwrap_or(false),
            "-t" => false, // no terminal in the sandbox
            _ => return None,
        }))
    }
}

fn is_binary_op(op: &str) -> bool {
    matches!(
        op,
        "=" | "==" | "!=" | "<" | ">" | "-eq" | "-ne" | "-lt" | "-le" | "-gt" | "-ge"
    )
}

fn binary(lhs: &str, op: &str, rhs: &str) -> Result<bool, String> {
    match op {
        "=" | "==" => Ok(lhs == rhs),
        "!=" => Ok(lhs != rhs),
        "<" => Ok(lhs < rhs),
        ">" => Ok(lhs > rhs),
        _ => {
            let a: i64 = lhs
                .trim()
                .parse()
                .map_err(|_| format!("{}: integer expression expected", lhs))?;
            let b: i64 = rhs
                .trim()
                .parse()
                .map_err(|_| format!("{}: integer expression expected", rhs))?;
            Ok(match op {
                "-eq" => a == b,
                "-ne" => a != b,
                "-lt" => a < b,
                "-le" => a <= b,
                "-gt" => a > b,
                "-ge" => a >= b,
                _ => unreachable!(),
            })
        }
    }
}
