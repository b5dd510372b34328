//! `eval` and `source`.

use crate::interp::engine::Engine;
use crate::interp::state::{ControlFlow, ExecOutcome, ShellState};

/// Re-parse the joined arguments and run them in the current state;
/// control signals pass straight through.
pub fn eval(engine: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    let script = args.join(" ");
    if script.trim().is_empty() {
        return ExecOutcome::ok();
    }
    match crate::parser::parse(&script) {
        Ok(ast) => engine.run_lists(state, &ast.lists),
        Err(e) => ExecOutcome::failure(format!("sandsh: eval: syntax error: {}\n", e), 2),
    }
}

/// Run a script file in the current state. `return` stops the sourced
/// script without leaving the caller.
pub fn source(engine: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    let Some(path) = args.first() else {
        return ExecOutcome::failure("sandsh: source: filename argument required\n", 2);
    };
    let resolved = state.absolute(path);
    let text = match state.fs.read_file(&resolved) {
        Ok(text) => text,
        Err(e) => {
            return ExecOutcome::failure(format!("sandsh: source: {}: {}\n", path, e.reason()), 1)
        }
    };

    let saved_positional = if args.len() > 1 {
        Some(std::mem::replace(&mut state.positional, args[1..].to_vec()))
    } else {
        None
    };

    state.source_depth += 1;
    let mut out = match crate::parser::parse(&text) {
        Ok(ast) => engine.run_lists(state, &ast.lists),
        Err(e) => ExecOutcome::failure(format!("sandsh: {}: syntax error: {}\n", path, e), 2),
    };
    state.source_depth = state.source_depth.saturating_sub(1);

    if let Some(positional) = saved_positional {
        state.positional = positional;
    }

    if let ControlFlow::Return(code) = out.control {
        out.exit_code = code;
        out.control = ControlFlow::None;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registry::CommandRegistry;
    use crate::fs::InMemoryFs;
    use crate::interp::state::ExecLimits;
    use std::sync::Arc;

    fn with_state<R>(f: impl FnOnce(&Engine, &mut ShellState) -> R) -> R {
        let registry = CommandRegistry::with_defaults();
        let limits = ExecLimits::default();
        let engine = Engine::new(&registry, &limits);
        let mut state = ShellState::new(Arc::new(InMemoryFs::new()));
        f(&engine, &mut state)
    }

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_eval_runs_in_current_state() {
        with_state(|engine, state| {
            let out = eval(engine, state, &argv(&["x=5;", "echo", "$x"]), "");
            assert_eq!(out.stdout, "5\n");
            assert_eq!(state.get_var("x"), Some("5"));
        });
    }

    #[test]
    fn test_eval_empty() {
        with_state(|engine, state| {
            assert_eq!(eval(engine, state, &[], "").exit_code, 0);
        });
    }

    #[test]
    fn test_eval_syntax_error() {
        with_state(|engine, state| {
            let out = eval(engine, state, &argv(&["if", "then"]), "");
            assert_eq!(out.exit_code, 2);
        });
    }

    #[test]
    fn test_source_runs_file() {
        with_state(|engine, state| {
            state.fs.write_file("/lib.sh", b"greeting=hello\necho sourced\n").unwrap();
            let out = source(engine, state, &argv(&["/lib.sh"]), "");
            assert_eq!(out.stdout, "sourced\n");
            assert_eq!(state.get_var("greeting"), Some("hello"));
        });
    }

    #[test]
    fn test_source_missing_file() {
        with_state(|engine, state| {
            let out = source(engine, state, &argv(&["/nope.sh"]), "");
            assert_eq!(out.exit_code, 1);
        });
    }

    #[test]
    fn test_source_return_consumed() {
        with_state(|engine, state| {
            state.fs.write_file("/r.sh", b"return 4\necho unreached\n").unwrap();
            let out = source(engine, state, &argv(&["/r.sh"]), "");
            assert_eq!(out.exit_code, 4);
            assert_eq!(out.control, ControlFlow::None);
            assert!(!out.stdout.contains("unreached"));
        });
    }

    #[test]
    fn test_source_with_positional_args() {
        with_state(|engine, state| {
            state.fs.write_file("/args.sh", b"echo $1\n").unwrap();
            let out = source(engine, state, &argv(&["/args.sh", "first"]), "");
            assert_eq!(out.stdout, "first\n");
            assert!(state.positional.is_empty());
        });
    }
}
