//! The jq engine: lexer -> parser -> evaluator over JSON values, plus the
//! `jq` command with its output modes.

pub mod eval;
pub mod lexer;
pub mod parser;

use serde_json::Value;

use super::{Command, CommandContext, CommandResult};

pub struct JqCommand;

impl Command for JqCommand {
    fn name(&self) -> &'static str {
        "jq"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut raw = false;
        let mut compact = false;
        let mut join = false;
        let mut null_input = false;
        let mut filter_text: Option<String> = None;
        let mut files: Vec<String> = Vec::new();

        for arg in &ctx.args {
            match arg.as_str() {
                "-r" | "--raw-output" => raw = true,
                "-c" | "--compact-output" => compact = true,
                "-j" | "--join-output" => {
                    raw = true;
                    join = true;
                }
                "-n" | "--null-input" => null_input = true,
                other if other.starts_with('-') && other.len() > 1 => {
                    return CommandResult::error_with_code(
                        format!("jq: Unknown option: {}\n", other),
                        2,
                    )
                }
                other => {
                    if filter_text.is_none() {
                        filter_text = Some(other.to_string());
                    } else {
                        files.push(other.to_string());
                    }
                }
            }
        }

        let Some(filter_text) = filter_text else {
            return CommandResult::error_with_code("jq: no filter given\n", 2);
        };
        let filter = match parser::parse_filter(&filter_text) {
            Ok(filter) => filter,
            Err(message) => {
                return CommandResult::error_with_code(
                    format!("jq: error: {} (while parsing '{}')\n", message, filter_text),
                    1,
                )
            }
        };

        let mut input_text = String::new();
        if files.is_empty() {
            input_text = ctx.stdin.clone();
        } else {
            for file in &files {
                match ctx.read_input(file) {
                    Ok(content) => input_text.push_str(&content),
                    Err(message) => {
                        return CommandResult::error_with_code(
                            format!("jq: error: {}\n", message),
                            2,
                        )
                    }
                }
            }
        }

        // The input is a stream of JSON documents.
        let inputs: Vec<Value> = if null_input {
            vec![Value::Null]
        } else {
            let mut docs = Vec::new();
            let mut stream = serde_json::Deserializer::from_str(&input_text).into_iter::<Value>();
            loop {
                match stream.next() {
                    Some(Ok(value)) => docs.push(value),
                    Some(Err(e)) => {
                        return CommandResult::error_with_code(
                            format!("jq: error: {} (while parsing input)\n", e),
                            1,
                        )
                    }
                    None => break,
                }
            }
            docs
        };

        let mut stdout = String::new();
        for input in &inputs {
            match eval::eval(&filter, input) {
                Ok(outputs) => {
                    for value in outputs {
                        stdout.push_str(&render(&value, raw, compact));
                        if !join {
                            stdout.push('\n');
                        }
                    }
                }
                Err(message) => {
                    return CommandResult::with_exit_code(
                        stdout,
                        format!("jq: error: {}\n", message),
                        1,
                    )
                }
            }
        }
        CommandResult::success(stdout)
    }
}

/// Default output is pretty-printed; `-c` compacts; `-r` strips quotes
/// only from string values.
fn render(value: &Value, raw: bool, compact: bool) -> String {
    if raw {
        if let Value::String(s) = value {
            return s.clone();
        }
    }
    if compact {
        serde_json::to_string(value).unwrap_or_default()
    } else {
        serde_json::to_string_pretty(value).unwrap_or_default()
    }
}
