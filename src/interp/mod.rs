//! Interpreter
//!
//! State, executor, expansion and builtins for the sandboxed shell.

pub mod arith;
pub mod builtins;
pub mod engine;
pub mod expand;
pub mod redirect;
pub mod state;

pub use engine::Engine;
pub use state::{ControlFlow, ExecLimits, ExecOutcome, SetOptions, ShellState};
