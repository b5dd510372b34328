//! Interpreter State
//!
//! The value-typed session record every command reads and mutates, plus the
//! result/control types that thread non-local flow through the executor
//! without exceptions.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::ast::FunctionDef;
use crate::fs::FileSystem;
use crate::net::{HttpClient, NetworkConfig};

/// Reserved env slot holding unconsumed stdin for `read` across calls.
pub const STDIN_SLOT: &str = "__STDIN__";

/// Non-local control flow carried on [`ExecOutcome`]. Loops consume
/// break/continue, functions consume return, the top level consumes exit;
/// every other boundary re-emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlFlow {
    #[default]
    None,
    Break(u32),
    Continue(u32),
    Return(i32),
    Exit(i32),
}

/// What one command or construct produced.
#[derive(Debug, Clone, Default)]
pub struct ExecOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub control: ControlFlow,
}

impl ExecOutcome {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_code(exit_code: i32) -> Self {
        Self { exit_code, ..Self::default() }
    }

    pub fn success(stdout: impl Into<String>) -> Self {
        Self { stdout: stdout.into(), ..Self::default() }
    }

    pub fn failure(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self { stderr: stderr.into(), exit_code, ..Self::default() }
    }

    /// Push earlier output in front of this outcome's streams.
    pub fn prepend(mut self, stdout: &str, stderr: &str) -> Self {
        self.stdout = format!("{}{}", stdout, self.stdout);
        self.stderr = format!("{}{}", stderr, self.stderr);
        self
    }
}

/// Options toggled by `set`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    /// `set -e`: a failing command terminates the script.
    pub errexit: bool,
    /// `set -u`: expanding an unset variable is an error.
    pub nounset: bool,
    /// `set -o pipefail`: a pipeline fails if any stage fails.
    pub pipefail: bool,
    /// `set -x`: trace commands to stderr before running them.
    pub xtrace: bool,
}

/// Guards against runaway scripts.
#[derive(Debug, Clone, Copy)]
pub struct ExecLimits {
    pub max_commands: u64,
    pub max_loop_iterations: u64,
    pub max_call_depth: u32,
}

impl Default for ExecLimits {
    fn default() -> Self {
        Self { max_commands: 200_000, max_loop_iterations: 1_000_000, max_call_depth: 200 }
    }
}

/// The complete shell session state. Cloned for subshells; the filesystem
/// handle is shared, so file effects escape subshells while variable and
/// cwd changes do not.
#[derive(Clone)]
pub struct ShellState {
    pub cwd: String,
    pub previous_dir: String,
    pub env: HashMap<String, String>,
    pub exported: HashSet<String>,
    /// `$1..$N`; `$0` is fixed.
    pub positional: Vec<String>,
    pub functions: HashMap<String, FunctionDef>,
    pub options: SetOptions,
    /// Signal name -> handler text. Only EXIT ever fires.
    pub traps: HashMap<String, String>,
    pub last_exit: i32,
    /// One entry per active function call: variable -> shadowed value.
    pub local_scopes: Vec<HashMap<String, Option<String>>>,
    pub loop_depth: u32,
    pub call_depth: u32,
    /// Nesting depth of `source`, for `return` inside sourced scripts.
    pub source_depth: u32,
    /// Condition context (if/while/until, `!`, `&&`/`||` left side):
    /// errexit stays quiet here.
    pub in_condition: bool,
    pub command_count: u64,
    /// Virtual pid reported by `$$`.
    pub pid: u32,
    /// Pinned clock for `date`; `None` reads the real clock.
    pub fixed_time: Option<chrono::DateTime<chrono::Utc>>,
    pub fs: Arc<dyn FileSystem>,
    pub http: Option<Arc<dyn HttpClient>>,
    pub network: NetworkConfig,
}

impl ShellState {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            cwd: "/".to_string(),
            previous_dir: "/".to_string(),
            env: HashMap::new(),
            exported: HashSet::new(),
            positional: Vec::new(),
            functions: HashMap::new(),
            options: SetOptions::default(),
            traps: HashMap::new(),
            last_exit: 0,
            local_scopes: Vec::new(),
            loop_depth: 0,
            call_depth: 0,
            source_depth: 0,
            in_condition: false,
            command_count: 0,
            pid: 4200 + (std::process::id() % 1000),
            fixed_time: None,
            fs,
            http: None,
            network: NetworkConfig::default(),
        }
    }

    // -- variables -----------------------------------------------------------

    pub fn get_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    pub fn set_var(&mut self, name: &str, value: impl Into<String>) {
        self.env.insert(name.to_string(), value.into());
    }

    pub fn unset_var(&mut self, name: &str) {
        self.env.remove(name);
        self.exported.remove(name);
    }

    /// Declare `name` local to the innermost function scope, remembering the
    /// value it shadows so function exit can restore it.
    pub fn declare_local(&mut self, name: &str) {
        if let Some(scope) = self.local_scopes.last_mut() {
            if !scope.contains_key(name) {
                let shadowed = self.env.get(name).cloned();
                scope.insert(name.to_string(), shadowed);
            }
        }
    }

    /// Enter a function call scope.
    pub fn push_scope(&mut self) {
        self.local_scopes.push(HashMap::new());
        self.call_depth += 1;
    }

    /// Leave a function call scope, restoring shadowed variables.
    pub fn pop_scope(&mut self) {
        if let Some(scope) = self.local_scopes.pop() {
            for (name, shadowed) in scope {
                match shadowed {
                    Some(value) => {
                        self.env.insert(name, value);
                    }
                    None => {
                        self.env.remove(&name);
                    }
                }
            }
        }
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// The env map a command handler sees (exported vars plus the whole
    /// environment; the sandbox draws no hard line between shell and
    /// exported variables).
    pub fn command_env(&self) -> HashMap<String, String> {
        self.env.clone()
    }

    pub fn absolute(&self, path: &str) -> String {
        self.fs.resolve_path(&self.cwd, path)
    }
}

/// Clamp an exit code into the POSIX 0..=255 range.
pub fn wrap_exit_code(code: i32) -> i32 {
    code.rem_euclid(256)
}
