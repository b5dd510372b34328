//! Command Implementations
//!
//! Everything dispatched through the registry: coreutils-style text and
//! file tools plus the embedded awk/sed/jq engines. Commands are pure
//! transducers over the [`CommandContext`]; anything that must mutate shell
//! state (cd, export, read, ...) lives with the interpreter builtins
//! instead.

pub mod args;
pub mod registry;

pub mod awk;
pub mod base64_cmd;
pub mod basename;
pub mod cat;
pub mod chmod;
pub mod cp;
pub mod curl;
pub mod cut;
pub mod date;
pub mod dirname;
pub mod echo;
pub mod env_cmd;
pub mod find;
pub mod grep;
pub mod head;
pub mod jq;
pub mod ln;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod printf;
pub mod pwd;
pub mod readlink_cmd;
pub mod rev;
pub mod rm;
pub mod rmdir;
pub mod sed;
pub mod seq;
pub mod sleep_cmd;
pub mod sort;
pub mod tac;
pub mod tail;
pub mod test_cmd;
pub mod touch;
pub mod tr;
pub mod true_cmd;
pub mod uniq;
pub mod wc;

use std::collections::HashMap;
use std::sync::Arc;

use crate::fs::FileSystem;
use crate::net::{HttpClient, NetworkConfig};

pub use registry::CommandRegistry;

/// What a command handler gets to work with. Reads come from `stdin` and
/// the filesystem; all output goes into the returned [`CommandResult`].
pub struct CommandContext {
    pub args: Vec<String>,
    pub stdin: String,
    pub cwd: String,
    pub env: HashMap<String, String>,
    pub fs: Arc<dyn FileSystem>,
    pub http: Option<Arc<dyn HttpClient>>,
    pub network: NetworkConfig,
    /// Pinned clock for `date`; `None` reads the host clock.
    pub fixed_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl CommandContext {
    /// Resolve a command-line path operand against the working directory.
    pub fn absolute(&self, path: &str) -> String {
        self.fs.resolve_path(&self.cwd, path)
    }

    /// Read an operand that may be `-` for stdin.
    pub fn read_input(&self, operand: &str) -> Result<String, String> {
        if operand == "-" {
            return Ok(self.stdin.clone());
        }
        self.fs
            .read_file(&self.absolute(operand))
            .map_err(|e| format!("{}: {}", operand, e.reason()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self { stdout: stdout.into(), stderr: String::new(), exit_code: 0 }
    }

    pub fn error(stderr: impl Into<String>) -> Self {
        Self { stdout: String::new(), stderr: stderr.into(), exit_code: 1 }
    }

    pub fn error_with_code(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self { stdout: String::new(), stderr: stderr.into(), exit_code }
    }

    pub fn with_exit_code(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self { stdout, stderr, exit_code }
    }
}

/// The uniform handler signature commands implement.
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(&self, ctx: CommandContext) -> CommandResult;
}

#[cfg(test)]
pub(crate) mod testkit {
    //! Shared scaffolding for command unit tests.

    use super::*;
    use crate::fs::InMemoryFs;

    pub fn ctx(args: &[&str], stdin: &str) -> CommandContext {
        ctx_with_files(args, stdin, &[])
    }

    pub fn ctx_with_files(args: &[&str], stdin: &str, files: &[(&str, &str)]) -> CommandContext {
        let fs = InMemoryFs::new();
        for (path, content) in files {
            let dir = crate::fs::dir_name(path);
            if dir != "/" {
                fs.mkdir(&dir, true).unwrap();
            }
            fs.write_file(path, content.as_bytes()).unwrap();
        }
        CommandContext {
            args: args.iter().map(|s| s.to_string()).collect(),
            stdin: stdin.to_string(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs: Arc::new(fs),
            http: None,
            network: NetworkConfig::default(),
            fixed_time: None,
        }
    }
}
