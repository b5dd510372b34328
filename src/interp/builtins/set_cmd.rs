//! The `set` builtin: option toggles and positional parameter replacement.

use crate::interp::engine::Engine;
use crate::interp::state::{ExecOutcome, ShellState};

pub fn set(_: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    if args.is_empty() {
        let mut names: Vec<(&String, &String)> = state.env.iter().collect();
        names.sort_by_key(|(name, _)| name.as_str());
        let mut stdout = String::new();
        for (name, value) in names {
            stdout.push_str(&format!("{}='{}'\n", name, value));
        }
        return ExecOutcome::success(stdout);
    }

    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        let (enable, body) = match arg.as_str() {
            "--" => {
                state.positional = iter.cloned().collect();
                return ExecOutcome::ok();
            }
            s if s.starts_with('-') && s.len() > 1 => (true, &s[1..]),
            s if s.starts_with('+') && s.len() > 1 => (false, &s[1..]),
            _ => {
                // First non-option argument: the rest replace $1..$N.
                let mut positional = vec![arg.clone()];
                positional.extend(iter.cloned());
                state.positional = positional;
                return ExecOutcome::ok();
            }
        };

        for flag in body.chars() {
            match flag {
                'e' => state.options.errexit = enable,
                'u' => state.options.nounset = enable,
                'x' => state.options.xtrace = enable,
                // `-o name` takes the option name from the next argument,
                // also in combined forms like `-euo pipefail`.
                'o' => {
                    let Some(name) = iter.next() else {
                        return list_options(state);
                    };
                    if let Err(out) = apply_named_option(state, name, enable) {
                        return out;
                    }
                }
                other => {
                    return ExecOutcome::failure(
                        format!("sandsh: set: -{}: invalid option\n", other),
                        2,
                    )
                }
            }
        }
    }
    ExecOutcome::ok()
}

fn apply_named_option(state: &mut ShellState, name: &str, enable: bool) -> Result<(), ExecOutcome> {
    match name {
        "errexit" => state.options.errexit = enable,
        "nounset" => state.options.nounset = enable,
        "pipefail" => state.options.pipefail = enable,
        "xtrace" => state.options.xtrace = enable,
        other => {
            return Err(ExecOutcome::failure(
                format!("sandsh: set: {}: invalid option name\n", other),
                2,
            ))
        }
    }
    Ok(())
}

fn list_options(state: &ShellState) -> ExecOutcome {
    let onoff = |b: bool| if b { "on" } else { "off" };
    ExecOutcome::success(format!(
        "errexit \t{}\nnounset \t{}\npipefail \t{}\nxtrace  \t{}\n",
        onoff(state.options.errexit),
        onoff(state.options.nounset),
        onoff(state.options.pipefail),
        onoff(state.options.xtrace),
    ))
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
    fn test_combined_flags() {
        with_state(|engine, state| {
            set(engine, state, &argv(&["-eux"]), "");
            assert!(state.options.errexit);
            assert!(state.options.nounset);
            assert!(state.options.xtrace);
        });
    }

    #[test]
    fn test_plus_disables() {
        with_state(|engine, state| {
            state.options.errexit = true;
            set(engine, state, &argv(&["+e"]), "");
            assert!(!state.options.errexit);
        });
    }

    #[test]
    fn test_set_o_pipefail() {
        with_state(|engine, state| {
            set(engine, state, &argv(&["-o", "pipefail"]), "");
            assert!(state.options.pipefail);
            set(engine, state, &argv(&["+o", "pipefail"]), "");
            assert!(!state.options.pipefail);
        });
    }

    #[test]
    fn test_strict_mode_combo() {
        with_state(|engine, state| {
            set(engine, state, &argv(&["-euo", "pipefail"]), "");
            assert!(state.options.errexit && state.options.nounset && state.options.pipefail);
        });
    }

    #[test]
    fn test_positional_replacement() {
        with_state(|engine, state| {
            set(engine, state, &argv(&["--", "a", "b"]), "");
            assert_eq!(state.positional, vec!["a".to_string(), "b".to_string()]);
        });
    }

    #[test]
    fn test_invalid_option() {
        with_state(|engine, state| {
            let out = set(engine, state, &argv(&["-q"]), "");
            assert_eq!(out.exit_code, 2);
        });
    }
}
