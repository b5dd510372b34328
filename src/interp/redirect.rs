//! Redirection Plumbing
//!
//! Redirections translate to staged string I/O over the in-memory fs:
//! inputs are read before the command runs, output files are opened
//! (created/truncated) up front, and the command's stdout/stderr strings
//! are routed afterwards. Fd duplication copies sink assignments.

use std::collections::HashMap;

use crate::ast::{RedirOp, RedirTarget, Redirection};
use crate::interp::engine::Engine;
use crate::interp::expand::Expander;
use crate::interp::state::{ExecOutcome, ShellState};

#[derive(Debug, Clone, PartialEq)]
enum Sink {
    Stdout,
    Stderr,
    File { path: String },
    Null,
}

/// A prepared set of redirections: staged stdin plus per-fd output sinks.
#[derive(Debug)]
pub struct RedirPlan {
    pub stdin: Option<String>,
    sinks: HashMap<u32, Sink>,
}

impl RedirPlan {
    fn empty() -> Self {
        let mut sinks = HashMap::new();
        sinks.insert(1, Sink::Stdout);
        sinks.insert(2, Sink::Stderr);
        Self { stdin: None, sinks }
    }

    /// Route the command's output through the plan. Returns the stdout and
    /// stderr that remain on the live streams.
    pub fn apply(
        &self,
        state: &ShellState,
        stdout: String,
        stderr: String,
    ) -> Result<(String, String), String> {
        let mut live_stdout = String::new();
        let mut live_stderr = String::new();
        for (content, fd) in [(stdout, 1u32), (stderr, 2u32)] {
            match self.sinks.get(&fd).unwrap_or(&Sink::Null) {
                Sink::Stdout => live_stdout.push_str(&content),
                Sink::Stderr => live_stderr.push_str(&content),
                Sink::Null => {}
                Sink::File { path } => {
                    state
                        .fs
                        .append_file(path, content.as_bytes())
                        .map_err(|e| format!("sandsh: {}: {}\n", path, e.reason()))?;
                }
            }
        }
        Ok((live_stdout, live_stderr))
    }
}

impl Engine<'_> {
    /// Expand targets and open files for a redirection list. Errors come
    /// back as a ready-to-return failure outcome (the command never runs).
    pub fn prepare_redirections(
        &self,
        state: &mut ShellState,
        redirections: &[Redirection],
    ) -> Result<RedirPlan, ExecOutcome> {
        let mut plan = RedirPlan::empty();
        if redirections.is_empty() {
            return Ok(plan);
        }

        for redirection in redirections {
            let default_fd = match redirection.op {
                RedirOp::In | RedirOp::HereDoc | RedirOp::HereString | RedirOp::DupIn => 0,
                _ => 1,
            };
            let fd = redirection.fd.unwrap_or(default_fd);

            match (&redirection.op, &redirection.target) {
                (RedirOp::HereDoc, RedirTarget::HereDoc { body, .. }) => {
                    let text = self.expand_redirect_string(state, body)?;
                    plan.stdin = Some(text);
                }
                (_, RedirTarget::HereDoc { .. }) => unreachable!("heredoc target on non-heredoc op"),
                (op, RedirTarget::Word(word)) => {
                    let target = self.expand_redirect_string(state, word)?;
                    match op {
                        RedirOp::In => {
                            let path = state.absolute(&target);
                            match state.fs.read_file(&path) {
                                Ok(content) => plan.stdin = Some(content),
                                Err(e) => {
                                    return Err(ExecOutcome::failure(
                                        format!("sandsh: {}: {}\n", target, e.reason()),
                                        1,
                                    ))
                                }
                            }
                        }
                        RedirOp::HereString => {
                            plan.stdin = Some(format!("{}\n", target));
                        }
                        RedirOp::Out | RedirOp::Append => {
                            let sink = self.open_sink(state, &target, *op == RedirOp::Out)?;
                            plan.sinks.insert(fd, sink);
                        }
                        RedirOp::OutBoth | RedirOp::AppendBoth => {
                            let sink =
                                self.open_sink(state, &target, *op == RedirOp::OutBoth)?;
                            plan.sinks.insert(1, sink.clone());
                            plan.sinks.insert(2, sink);
                        }
                        RedirOp::DupOut => {
                            if target == "-" {
                                plan.sinks.insert(fd, Sink::Null);
                            } else if let Ok(source_fd) = target.parse::<u32>() {
                                let sink = plan
                                    .sinks
                                    .get(&source_fd)
                                    .cloned()
                                    .unwrap_or(Sink::Null);
                                plan.sinks.insert(fd, sink);
                            } else {
                                return Err(ExecOutcome::failure(
                                    format!("sandsh: {}: ambiguous redirect\n", target),
                                    1,
                                ));
                            }
                        }
                        RedirOp::DupIn => {
                            // `<&-` closes stdin: the command reads EOF even
                            // inside a pipeline. `<&0` keeps it. Stdin is
                            // the only readable descriptor in this model,
                            // so any other source is a bad fd.
                            if target == "-" {
                                if fd == 0 {
                                    plan.stdin = Some(String::new());
                                }
                            } else if target == "0" {
                                // no-op: stdin from stdin
                            } else {
                                return Err(ExecOutcome::failure(
                                    format!("sandsh: {}: Bad file descriptor\n", target),
                                    1,
                                ));
                            }
                        }
                        RedirOp::HereDoc => unreachable!("handled above"),
                    }
                }
            }
        }
        Ok(plan)
    }

    /// Create/truncate the target file now so `> f` with a silent command
    /// still leaves an empty file behind.
    fn open_sink(
        &self,
        state: &mut ShellState,
        target: &str,
        truncate: bool,
    ) -> Result<Sink, ExecOutcome> {
        if target == "/dev/null" {
            return Ok(Sink::Null);
        }
        let path = state.absolute(target);
        let opened = if truncate {
            state.fs.write_file(&path, b"")
        } else {
            state.fs.append_file(&path, b"")
        };
        if let Err(e) = opened {
            return Err(ExecOutcome::failure(format!("sandsh: {}: {}\n", target, e.reason()), 1));
        }
        Ok(Sink::File { path })
    }

    fn expand_redirect_string(
        &self,
        state: &mut ShellState,
        word: &crate::ast::Word,
    ) -> Result<String, ExecOutcome> {
        let mut expander = Expander::new(state, self);
        expander
            .expand_to_string(word)
            .map_err(|e| ExecOutcome::failure(format!("{}\n", e.message), e.exit_code))
    }
}
