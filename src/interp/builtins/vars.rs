//! Variable management builtins: export, unset, local.

use crate::interp::engine::Engine;
use crate::interp::state::{ExecOutcome, ShellState};

pub fn export(_: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    if args.is_empty() {
        let mut names: Vec<&String> = state.exported.iter().collect();
        names.sort();
        let mut stdout = String::new();
        for name in names {
            match state.env.get(name) {
                Some(value) => stdout.push_str(&format!("declare -x {}=\"{}\"\n", name, value)),
                None => stdout.push_str(&format!("declare -x {}\n", name)),
            }
        }
        return ExecOutcome::success(stdout);
    }

    for arg in args {
        match arg.split_once('=') {
            Some((name, value)) => {
                if !is_identifier(name) {
                    return invalid_identifier("export", arg);
                }
                state.set_var(name, value);
                state.exported.insert(name.to_string());
            }
            None => {
                if !is_identifier(arg) {
                    return invalid_identifier("export", arg);
                }
                state.exported.insert(arg.clone());
            }
        }
    }
    ExecOutcome::ok()
}

pub fn unset(_: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    let mut functions_only = false;
    for arg in args {
        match arg.as_str() {
            "-f" => functions_only = true,
            "-v" => functions_only = false,
            name => {
                if functions_only {
                    state.functions.remove(name);
                } else {
                    state.unset_var(name);
                }
            }
        }
    }
    ExecOutcome::ok()
}

pub fn local(_: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    if state.local_scopes.is_empty() {
        return ExecOutcome::failure("sandsh: local: can only be used in a function\n", 1);
    }
    for arg in args {
        match arg.split_once('=') {
            Some((name, value)) => {
                if !is_identifier(name) {
                    return invalid_identifier("local", arg);
                }
                state.declare_local(name);
                state.set_var(name, value);
            }
            None => {
                if !is_identifier(arg) {
                    return invalid_identifier("local", arg);
                }
                state.declare_local(arg);
                state.unset_var(arg);
            }
        }
    }
    ExecOutcome::ok()
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn invalid_identifier(builtin: &str, arg: &str) -> ExecOutcome {
    ExecOutcome::failure(format!("sandsh: {}: `{}': not a valid identifier\n", builtin, arg), 1)
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
    fn test_export_assignment() {
        with_state(|engine, state| {
            export(engine, state, &argv(&["FOO=bar"]), "");
            assert_eq!(state.get_var("FOO"), Some("bar"));
            assert!(state.exported.contains("FOO"));
        });
    }

    #[test]
    fn test_export_existing_name() {
        with_state(|engine, state| {
            state.set_var("X", "1");
            export(engine, state, &argv(&["X"]), "");
            assert!(state.exported.contains("X"));
        });
    }

    #[test]
    fn test_export_listing() {
        with_state(|engine, state| {
            state.set_var("A", "1");
            state.exported.insert("A".to_string());
            let out = export(engine, state, &[], "");
            assert!(out.stdout.contains("declare -x A=\"1\""));
        });
    }

    #[test]
    fn test_export_bad_identifier() {
        with_state(|engine, state| {
            let out = export(engine, state, &argv(&["1bad=x"]), "");
            assert_eq!(out.exit_code, 1);
        });
    }

    #[test]
    fn test_unset_variable_and_function() {
        with_state(|engine, state| {
            state.set_var("X", "1");
            unset(engine, state, &argv(&["X"]), "");
            assert_eq!(state.get_var("X"), None);

            let def = crate::ast::FunctionDef {
                name: "f".to_string(),
                body: Box::new(crate::ast::Command::Simple(crate::ast::SimpleCommand {
                    assignments: vec![],
                    words: vec![],
                    redirections: vec![],
                    line: 1,
                })),
            };
            state.functions.insert("f".to_string(), def);
            unset(engine, state, &argv(&["-f", "f"]), "");
            assert!(!state.functions.contains_key("f"));
        });
    }

    #[test]
    fn test_local_outside_function() {
        with_state(|engine, state| {
            let out = local(engine, state, &argv(&["x=1"]), "");
            assert_eq!(out.exit_code, 1);
        });
    }

    #[test]
    fn test_local_inside_function_scope() {
        with_state(|engine, state| {
            state.set_var("x", "outer");
            state.push_scope();
            local(engine, state, &argv(&["x=inner"]), "");
            assert_eq!(state.get_var("x"), Some("inner"));
            state.pop_scope();
            assert_eq!(state.get_var("x"), Some("outer"));
        });
    }
}
