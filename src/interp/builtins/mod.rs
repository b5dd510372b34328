//! Shell Builtins
//!
//! Commands that must mutate the shell state itself: directory changes,
//! variable and option management, control flow, traps, `read`, `eval` and
//! `source`. Everything else goes through the command registry.

mod cd;
mod eval_cmd;
mod flow;
mod read;
mod set_cmd;
mod trap;
mod vars;

use crate::interp::engine::Engine;
use crate::interp::state::{ExecOutcome, ShellState};

/// Uniform builtin signature: `(engine, state, args, stdin) -> outcome`.
pub type Builtin = fn(&Engine, &mut ShellState, &[String], &str) -> ExecOutcome;

pub fn lookup(name: &str) -> Option<Builtin> {
    Some(match name {
        "cd" => cd::cd,
        "exit" => flow::exit,
        "return" => flow::return_cmd,
        "break" => flow::break_cmd,
        "continue" => flow::continue_cmd,
        "shift" => flow::shift,
        "export" => vars::export,
        "unset" => vars::unset,
        "local" => vars::local,
        "set" => set_cmd::set,
        "read" => read::read,
        "trap" => trap::trap,
        "eval" => eval_cmd::eval,
        "source" | "." => eval_cmd::source,
        ":" => colon,
        _ => return None,
    })
}

fn colon(_: &Engine, _: &mut ShellState, _: &[String], _: &str) -> ExecOutcome {
    ExecOutcome::ok()
}

/// Parse the numeric argument of `exit`/`return`/`break`/`continue`/`shift`.
pub(crate) fn numeric_arg(args: &[String], default: i64) -> Result<i64, String> {
    match args.first() {
        None => Ok(default),
        Some(text) => text
            .parse::<i64>()
            .map_err(|_| format!("{}: numeric argument required", text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_builtins() {
        for name in ["cd", "exit", "set", "read", "trap", "eval", "source", ".", ":", "local"] {
            assert!(lookup(name).is_some(), "missing builtin {}", name);
        }
        assert!(lookup("echo").is_none(), "echo is a registry command");
    }

    #[test]
    fn test_numeric_arg() {
        assert_eq!(numeric_arg(&[], 1).unwrap(), 1);
        assert_eq!(numeric_arg(&["5".to_string()], 1).unwrap(), 5);
        assert!(numeric_arg(&["abc".to_string()], 1).is_err());
    }
}
