//! Shell Session
//!
//! The public surface: build a sandboxed session, feed it scripts, collect
//! `{stdout, stderr, exit_code}` results. All state lives in the session
//! value; nothing touches the host system.

use std::collections::HashMap;
use std::sync::Arc;

use crate::commands::CommandRegistry;
use crate::fs::{FileSystem, InMemoryFs, InitialFiles};
use crate::interp::state::{wrap_exit_code, STDIN_SLOT};
use crate::interp::{ControlFlow, Engine, ExecLimits, ShellState};
use crate::net::{HttpClient, NetworkConfig};

/// Options for creating a session.
#[derive(Default)]
pub struct SessionOptions {
    pub cwd: Option<String>,
    pub env: Option<HashMap<String, String>>,
    /// Initial filesystem population: path -> contents.
    pub files: Option<InitialFiles>,
    pub network: Option<NetworkConfig>,
    pub http_client: Option<Arc<dyn HttpClient>>,
    /// Pin `date` to a fixed instant; keeps `exec` reproducible.
    pub fixed_time: Option<chrono::DateTime<chrono::Utc>>,
    pub limits: Option<ExecLimits>,
}

/// The result of one `exec` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// A sandboxed shell session.
pub struct Session {
    state: ShellState,
    registry: CommandRegistry,
    limits: ExecLimits,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let cwd = options.cwd.unwrap_or_else(|| "/home/user".to_string());

        let fs: Arc<dyn FileSystem> = match &options.files {
            Some(files) => Arc::new(InMemoryFs::with_files(files)),
            None => Arc::new(InMemoryFs::new()),
        };
        for dir in ["/home/user", "/tmp", "/etc", "/usr/bin", "/bin"] {
            let _ = fs.mkdir(dir, true);
        }
        let _ = fs.mkdir(&cwd, true);

        let mut state = ShellState::new(fs);
        state.cwd = cwd.clone();
        state.previous_dir = cwd.clone();

        let mut env = HashMap::new();
        env.insert("HOME".to_string(), "/home/user".to_string());
        env.insert("PATH".to_string(), "/usr/bin:/bin".to_string());
        env.insert("IFS".to_string(), " \t\n".to_string());
        env.insert("PWD".to_string(), cwd.clone());
        env.insert("OLDPWD".to_string(), cwd);
        env.insert("SHELL".to_string(), "/bin/sandsh".to_string());
        for key in ["HOME", "PATH", "PWD", "OLDPWD", "SHELL"] {
            state.exported.insert(key.to_string());
        }
        if let Some(user_env) = options.env {
            for (key, value) in user_env {
                state.exported.insert(key.clone());
                env.insert(key, value);
            }
        }
        state.env = env;

        state.network = options.network.unwrap_or_default();
        state.http = options.http_client;
        state.fixed_time = options.fixed_time;

        Self {
            state,
            registry: CommandRegistry::with_defaults(),
            limits: options.limits.unwrap_or_default(),
        }
    }

    /// Execute a script against the session state. The EXIT trap (if set)
    /// runs after the script; its output is appended and its exit code
    /// ignored.
    pub fn exec(&mut self, script: &str) -> ExecResult {
        if script.trim().is_empty() {
            return ExecResult { stdout: String::new(), stderr: String::new(), exit_code: 0 };
        }

        self.state.command_count = 0;
        let engine = Engine::new(&self.registry, &self.limits);

        let mut result = match crate::parser::parse(script) {
            Ok(ast) => {
                let mut out = engine.run_lists(&mut self.state, &ast.lists);
                match out.control {
                    ControlFlow::Exit(code) | ControlFlow::Return(code) => out.exit_code = code,
                    _ => {}
                }
                ExecResult {
                    stdout: out.stdout,
                    stderr: out.stderr,
                    exit_code: out.exit_code,
                }
            }
            Err(e) => ExecResult {
                stdout: String::new(),
                stderr: format!("sandsh: syntax error: {}\n", e),
                exit_code: 2,
            },
        };

        // Leftover staged stdin never leaks into the next exec.
        self.state.env.remove(STDIN_SLOT);
        self.state.last_exit = result.exit_code;

        // Traps live until cleared; EXIT fires at the end of every exec.
        if let Some(handler) = self.state.traps.get("EXIT").cloned() {
            if let Ok(ast) = crate::parser::parse(&handler) {
                let out = engine.run_lists(&mut self.state, &ast.lists);
                result.stdout.push_str(&out.stdout);
                result.stderr.push_str(&out.stderr);
            }
        }

        result.exit_code = wrap_exit_code(result.exit_code);
        self.state.last_exit = result.exit_code;
        result
    }

    pub fn cwd(&self) -> &str {
        &self.state.cwd
    }

    pub fn env(&self) -> &HashMap<String, String> {
        &self.state.env
    }

    /// Direct filesystem access for host-side setup and assertions.
    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.state.fs
    }
}
