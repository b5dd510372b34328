//! The `read` builtin.
//!
//! Consumes one line from staged stdin. Inside a pipeline stage the line
//! comes straight from the handler's stdin; inside a loop body it comes
//! from the reserved `__STDIN__` slot, which holds whatever input remains.
//! An absent (or exhausted) slot means EOF.

use crate::interp::engine::Engine;
use crate::interp::expand::DEFAULT_IFS;
use crate::interp::state::{ExecOutcome, ShellState, STDIN_SLOT};

pub fn read(_: &Engine, state: &mut ShellState, args: &[String], stdin: &str) -> ExecOutcome {
    let mut names: Vec<&String> = Vec::new();
    for arg in args {
        if arg == "-r" {
            // Raw mode is the only mode this shell implements; `-r` is
            // accepted for script compatibility.
            continue;
        }
        names.push(arg);
    }

    let (data, from_slot) = if !stdin.is_empty() {
        (stdin.to_string(), false)
    } else {
        match state.env.get(STDIN_SLOT) {
            Some(slot) if !slot.is_empty() => (slot.clone(), true),
            Some(_) => {
                state.env.remove(STDIN_SLOT);
                return ExecOutcome::with_code(1);
            }
            None => return ExecOutcome::with_code(1),
        }
    };

    let (line, rest) = match data.split_once('\n') {
        Some((line, rest)) => (line.to_string(), rest.to_string()),
        None => (data, String::new()),
    };
    if from_slot {
        state.env.insert(STDIN_SLOT.to_string(), rest);
    }

    assign_fields(state, &names, &line);
    ExecOutcome::ok()
}

/// Split the line on IFS and bind the pieces; the last variable swallows
/// the remainder.
fn assign_fields(state: &mut ShellState, names: &[&String], line: &str) {
    if names.is_empty() {
        state.set_var("REPLY", line);
        return;
    }
    let ifs = state.env.get("IFS").cloned().unwrap_or_else(|| DEFAULT_IFS.to_string());
    let trimmed = line.trim_matches(|c: char| ifs.contains(c) && c.is_ascii_whitespace());

    let mut remaining = trimmed;
    for (i, name) in names.iter().enumerate() {
        if i == names.len() - 1 {
            state.set_var(name, remaining);
            return;
        }
        match remaining.find(|c: char| ifs.contains(c)) {
            Some(idx) => {
                let (field, rest) = remaining.split_at(idx);
                state.set_var(name, field);
                remaining = rest.trim_start_matches(|c: char| ifs.contains(c));
            }
            None => {
                state.set_var(name, remaining);
                remaining = "";
            }
        }
    }
}
