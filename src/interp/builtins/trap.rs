//! The `trap` builtin.
//!
//! Handlers are recorded per signal name. Only `EXIT` ever fires (at the
//! end of the top-level exec); everything else is bookkeeping, since the
//! sandbox has no signal sources.

use crate::interp::engine::Engine;
use crate::interp::state::{ExecOutcome, ShellState};

pub fn trap(_: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    if args.is_empty() {
        let mut entries: Vec<(&String, &String)> = state.traps.iter().collect();
        entries.sort_by_key(|(signal, _)| signal.as_str());
        let mut stdout = String::new();
        for (signal, handler) in entries {
            stdout.push_str(&format!("trap -- '{}' {}\n", handler, signal));
        }
        return ExecOutcome::success(stdout);
    }

    let (handler, signals) = (&args[0], &args[1..]);
    if signals.is_empty() {
        return ExecOutcome::failure("sandsh: trap: usage: trap action signal ...\n", 2);
    }

    for signal in signals {
        let name = normalize_signal(signal);
        if handler == "-" {
            state.traps.remove(&name);
        } else {
            state.traps.insert(name, handler.clone());
        }
    }
    ExecOutcome::ok()
}

fn normalize_signal(signal: &str) -> String {
    let upper = signal.to_ascii_uppercase();
    match upper.as_str() {
        "0" => "EXIT".to_string(),
        other => other.strip_prefix("SIG").unwrap_or(other).to_string(),
    }
}
