//! Control-flow builtins: exit, return, break, continue, shift.

use crate::interp::engine::Engine;
use crate::interp::state::{ControlFlow, ExecOutcome, ShellState};

use super::numeric_arg;

pub fn exit(_: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    match numeric_arg(args, state.last_exit as i64) {
        Ok(code) => {
            let mut out = ExecOutcome::with_code(code as i32);
            out.control = ControlFlow::Exit(code as i32);
            out
        }
        Err(message) => {
            let mut out = ExecOutcome::failure(format!("sandsh: exit: {}\n", message), 2);
            out.control = ControlFlow::Exit(2);
            out
        }
    }
}

pub fn return_cmd(_: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    if state.call_depth == 0 && state.source_depth == 0 {
        return ExecOutcome::failure(
            "sandsh: return: can only `return' from a function or sourced script\n",
            1,
        );
    }
    match numeric_arg(args, state.last_exit as i64) {
        Ok(code) => {
            let mut out = ExecOutcome::with_code(code as i32);
            out.control = ControlFlow::Return(code as i32);
            out
        }
        Err(message) => ExecOutcome::failure(format!("sandsh: return: {}\n", message), 2),
    }
}

pub fn break_cmd(_: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    loop_signal(state, args, "break", ControlFlow::Break)
}

pub fn continue_cmd(_: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    loop_signal(state, args, "continue", ControlFlow::Continue)
}

fn loop_signal(
    state: &mut ShellState,
    args: &[String],
    name: &str,
    make: fn(u32) -> ControlFlow,
) -> ExecOutcome {
    let n = match numeric_arg(args, 1) {
        Ok(n) if n >= 1 => n as u32,
        Ok(n) => {
            return ExecOutcome::failure(
                format!("sandsh: {}: {}: loop count out of range\n", name, n),
                1,
            )
        }
        Err(message) => {
            return ExecOutcome::failure(format!("sandsh: {}: {}\n", name, message), 1)
        }
    };
    if state.loop_depth == 0 {
        // Outside a loop this is a no-op with a warning, like bash.
        return ExecOutcome::failure(
            format!("sandsh: {}: only meaningful in a `for', `while', or `until' loop\n", name),
            0,
        );
    }
    let mut out = ExecOutcome::ok();
    out.control = make(n.min(state.loop_depth));
    out
}

pub fn shift(_: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    let n = match numeric_arg(args, 1) {
        Ok(n) if n >= 0 => n as usize,
        _ => {
            return ExecOutcome::failure("sandsh: shift: numeric argument required\n", 1);
        }
    };
    if n > state.positional.len() {
        return ExecOutcome::with_code(1);
    }
    state.positional.drain(..n);
    ExecOutcome::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registry::CommandRegistry;
    use crate::fs::InMemoryFs;
    use crate::interp::state::ExecLimits;
    use std::sync::Arc;

    fn fixture() -> ShellState {
        ShellState::new(Arc::new(InMemoryFs::new()))
    }

    fn with_engine<R>(f: impl FnOnce(&Engine, &mut ShellState) -> R) -> R {
        let registry = CommandRegistry::with_defaults();
        let limits = ExecLimits::default();
        let engine = Engine::new(&registry, &limits);
        let mut state = fixture();
        f(&engine, &mut state)
    }

    #[test]
    fn test_exit_default_is_last_status() {
        with_engine(|engine, state| {
            state.last_exit = 4;
            let out = exit(engine, state, &[], "");
            assert_eq!(out.control, ControlFlow::Exit(4));
        });
    }

    #[test]
    fn test_exit_with_code() {
        with_engine(|engine, state| {
            let out = exit(engine, state, &["9".to_string()], "");
            assert_eq!(out.control, ControlFlow::Exit(9));
        });
    }

    #[test]
    fn test_return_outside_function_fails() {
        with_engine(|engine, state| {
            let out = return_cmd(engine, state, &[], "");
            assert_eq!(out.exit_code, 1);
            assert_eq!(out.control, ControlFlow::None);
        });
    }

    #[test]
    fn test_break_outside_loop_warns() {
        with_engine(|engine, state| {
            let out = break_cmd(engine, state, &[], "");
            assert_eq!(out.exit_code, 0);
            assert_eq!(out.control, ControlFlow::None);
            assert!(out.stderr.contains("only meaningful"));
        });
    }

    #[test]
    fn test_break_clamps_to_loop_depth() {
        with_engine(|engine, state| {
            state.loop_depth = 2;
            let out = break_cmd(engine, state, &["5".to_string()], "");
            assert_eq!(out.control, ControlFlow::Break(2));
        });
    }

    #[test]
    fn test_shift() {
        with_engine(|engine, state| {
            state.positional = vec!["a".into(), "b".into(), "c".into()];
            assert_eq!(shift(engine, state, &[], "").exit_code, 0);
            assert_eq!(state.positional, vec!["b".to_string(), "c".to_string()]);
            assert_eq!(shift(engine, state, &["2".to_string()], "").exit_code, 0);
            assert!(state.positional.is_empty());
            assert_eq!(shift(engine, state, &["1".to_string()], "").exit_code, 1);
        });
    }
}
