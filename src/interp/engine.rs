//! Execution Engine
//!
//! Tree-walks the script AST: lists with `&&`/`||` short-circuiting and
//! errexit, sequential pipelines, compound commands, function calls, and
//! dispatch to builtins and the command registry. Non-local flow travels on
//! [`ControlFlow`] values; nothing is thrown.

use crate::ast::{
    AndOrList, Command, CompoundCommand, CompoundKind, FunctionDef, ListOp, Pipeline, Script,
    SimpleCommand, Word,
};
use crate::commands::{CommandContext, CommandRegistry};

use super::arith::eval_arith;
use super::builtins;
use super::expand::pattern::pattern_match;
use super::expand::Expander;
use super::state::{ControlFlow, ExecLimits, ExecOutcome, ShellState, STDIN_SLOT};

pub struct Engine<'e> {
    pub registry: &'e CommandRegistry,
    pub limits: &'e ExecLimits,
}

impl<'e> Engine<'e> {
    pub fn new(registry: &'e CommandRegistry, limits: &'e ExecLimits) -> Self {
        Self { registry, limits }
    }

    /// Run a whole script, consuming any `exit`/`return` that reaches the
    /// top. Used for `exec`, command substitution and `eval`-like contexts.
    pub fn run_script(&self, state: &mut ShellState, script: &Script) -> ExecOutcome {
        let mut out = self.run_lists(state, &script.lists);
        match out.control {
            ControlFlow::Exit(code) | ControlFlow::Return(code) => out.exit_code = code,
            _ => {}
        }
        out.control = ControlFlow::None;
        out
    }

    /// Run a statement sequence, stopping at the first control signal.
    pub fn run_lists(&self, state: &mut ShellState, lists: &[AndOrList]) -> ExecOutcome {
        let mut acc = ExecOutcome::ok();
        for list in lists {
            let out = self.run_list(state, list);
            acc.stdout.push_str(&out.stdout);
            acc.stderr.push_str(&out.stderr);
            acc.exit_code = out.exit_code;
            if out.control != ControlFlow::None {
                acc.control = out.control;
                return acc;
            }
        }
        acc
    }

    /// One `&&`/`||`/`;` chain, with the errexit rules applied after each
    /// pipeline that is not the left side of `&&`/`||`.
    fn run_list(&self, state: &mut ShellState, list: &AndOrList) -> ExecOutcome {
        let mut acc = ExecOutcome::ok();
        for (i, pipeline) in list.pipelines.iter().enumerate() {
            if i > 0 {
                match list.operators[i - 1] {
                    ListOp::And if acc.exit_code != 0 => continue,
                    ListOp::Or if acc.exit_code == 0 => continue,
                    _ => {}
                }
            }

            let out = self.run_pipeline(state, pipeline);
            acc.stdout.push_str(&out.stdout);
            acc.stderr.push_str(&out.stderr);
            acc.exit_code = out.exit_code;
            state.last_exit = out.exit_code;

            if out.control != ControlFlow::None {
                acc.control = out.control;
                return acc;
            }

            let followed_by_andor = list
                .operators
                .get(i)
                .is_some_and(|op| matches!(op, ListOp::And | ListOp::Or));
            if acc.exit_code != 0
                && state.options.errexit
                && !state.in_condition
                && !pipeline.negated
                && !followed_by_andor
            {
                acc.control = ControlFlow::Exit(acc.exit_code);
                return acc;
            }
        }
        acc
    }

    /// Stages run left to right, each stage's stdout becoming the next
    /// stage's stdin. Control signals only escape single-command pipelines;
    /// a multi-stage pipeline behaves like a row of subshells.
    fn run_pipeline(&self, state: &mut ShellState, pipeline: &Pipeline) -> ExecOutcome {
        let single = pipeline.commands.len() == 1;
        let mut stdin = String::new();
        let mut stderr = String::new();
        let mut codes: Vec<i32> = Vec::new();

        for command in &pipeline.commands {
            let out = self.run_command(state, command, &stdin);
            stderr.push_str(&out.stderr);
            if single {
                let mut result = out;
                result.stderr = stderr;
                if result.control == ControlFlow::None && pipeline.negated {
                    result.exit_code = i32::from(result.exit_code == 0);
                }
                return result;
            }
            let code = match out.control {
                ControlFlow::Exit(c) | ControlFlow::Return(c) => c,
                _ => out.exit_code,
            };
            codes.push(code);
            stdin = out.stdout;
        }

        let mut exit_code = if state.options.pipefail {
            codes.iter().rev().find(|c| **c != 0).copied().unwrap_or(0)
        } else {
            codes.last().copied().unwrap_or(0)
        };
        if pipeline.negated {
            exit_code = i32::from(exit_code == 0);
        }
        ExecOutcome { stdout: stdin, stderr, exit_code, control: ControlFlow::None }
    }

    pub fn run_command(&self, state: &mut ShellState, command: &Command, stdin: &str) -> ExecOutcome {
        match command {
            Command::Simple(simple) => self.run_simple(state, simple, stdin),
            Command::Compound(compound) => self.run_compound(state, compound, stdin),
            Command::FunctionDef(def) => {
                state.functions.insert(def.name.clone(), def.clone());
                ExecOutcome::ok()
            }
        }
    }

    // -- simple commands -----------------------------------------------------

    fn run_simple(&self, state: &mut ShellState, cmd: &SimpleCommand, stdin: &str) -> ExecOutcome {
        state.command_count += 1;
        if state.command_count > self.limits.max_commands {
            let mut out = ExecOutcome::failure(
                format!("sandsh: maximum command count ({}) exceeded\n", self.limits.max_commands),
                126,
            );
            out.control = ControlFlow::Exit(126);
            return out;
        }

        // Assignments commit left to right before argv expands; previous
        // values are remembered for prefix-assignment restore.
        let mut saved: Vec<(String, Option<String>)> = Vec::new();
        let expansion = {
            let mut expander = Expander::new(state, self);
            let mut failed = None;
            for assignment in &cmd.assignments {
                let value = match &assignment.value {
                    Some(word) => match expander.expand_to_string(word) {
                        Ok(value) => value,
                        Err(e) => {
                            failed = Some(e);
                            break;
                        }
                    },
                    None => String::new(),
                };
                let old = expander.state.env.get(&assignment.name).cloned();
                let value = if assignment.append {
                    format!("{}{}", old.clone().unwrap_or_default(), value)
                } else {
                    value
                };
                saved.push((assignment.name.clone(), old));
                expander.state.set_var(&assignment.name, value);
            }

            let argv = match failed {
                Some(e) => Err(e),
                None => expander.expand_words(&cmd.words),
            };
            (argv, expander.stderr, expander.last_sub_exit)
        };
        let (argv, expansion_stderr, last_sub_exit) = expansion;

        let argv = match argv {
            Ok(argv) => argv,
            Err(e) => {
                restore_assignments(state, saved);
                let mut out = ExecOutcome {
                    stdout: String::new(),
                    stderr: format!("{}{}\n", expansion_stderr, e.message),
                    exit_code: e.exit_code,
                    control: ControlFlow::None,
                };
                if e.fatal {
                    out.control = ControlFlow::Exit(e.exit_code);
                }
                return out;
            }
        };

        // Assignment-only command: assignments persist; exit code comes
        // from the last command substitution, if any ran.
        if argv.is_empty() {
            let mut out = match self.prepare_redirections(state, &cmd.redirections) {
                Ok(_) => ExecOutcome::with_code(last_sub_exit.unwrap_or(0)),
                Err(err) => err,
            };
            out.stderr = format!("{}{}", expansion_stderr, out.stderr);
            return out;
        }

        let plan = match self.prepare_redirections(state, &cmd.redirections) {
            Ok(plan) => plan,
            Err(err) => {
                restore_assignments(state, saved);
                return err.prepend("", &expansion_stderr);
            }
        };
        let effective_stdin = plan.stdin.clone().unwrap_or_else(|| stdin.to_string());

        let mut trace = String::new();
        if state.options.xtrace {
            trace = format!("+ {}\n", argv.join(" "));
        }

        let name = argv[0].as_str();
        let out = if let Some(def) = state.functions.get(name).cloned() {
            self.run_function(state, &def, &argv[1..], &effective_stdin)
        } else if let Some(builtin) = builtins::lookup(name) {
            builtin(self, state, &argv[1..], &effective_stdin)
        } else if let Some(command) = self.registry.get(name) {
            let result = command.execute(CommandContext {
                args: argv[1..].to_vec(),
                stdin: effective_stdin,
                cwd: state.cwd.clone(),
                env: state.command_env(),
                fs: state.fs.clone(),
                http: state.http.clone(),
                network: state.network.clone(),
                fixed_time: state.fixed_time,
            });
            ExecOutcome {
                stdout: result.stdout,
                stderr: result.stderr,
                exit_code: result.exit_code,
                control: ControlFlow::None,
            }
        } else {
            ExecOutcome::failure(format!("sandsh: {}: command not found\n", name), 127)
        };

        restore_assignments(state, saved);

        let control = out.control;
        let exit_code = out.exit_code;
        let (stdout, routed_stderr) = match plan.apply(state, out.stdout, out.stderr) {
            Ok(streams) => streams,
            Err(message) => {
                return ExecOutcome::failure(format!("{}{}{}", expansion_stderr, trace, message), 1)
            }
        };

        ExecOutcome {
            stdout,
            stderr: format!("{}{}{}", expansion_stderr, trace, routed_stderr),
            exit_code,
            control,
        }
    }

    // -- functions -----------------------------------------------------------

    pub fn run_function(
        &self,
        state: &mut ShellState,
        def: &FunctionDef,
        args: &[String],
        stdin: &str,
    ) -> ExecOutcome {
        if state.call_depth >= self.limits.max_call_depth {
            let mut out = ExecOutcome::failure(
                format!("sandsh: {}: maximum function nesting exceeded\n", def.name),
                126,
            );
            out.control = ControlFlow::Exit(126);
            return out;
        }

        let saved_positional = std::mem::replace(&mut state.positional, args.to_vec());
        state.push_scope();
        let mut out = self.run_command(state, &def.body, stdin);
        state.pop_scope();
        state.positional = saved_positional;

        if let ControlFlow::Return(code) = out.control {
            out.exit_code = code;
            out.control = ControlFlow::None;
        }
        out
    }

    // -- compound commands ---------------------------------------------------

    fn run_compound(
        &self,
        state: &mut ShellState,
        compound: &CompoundCommand,
        stdin: &str,
    ) -> ExecOutcome {
        let plan = match self.prepare_redirections(state, &compound.redirections) {
            Ok(plan) => plan,
            Err(err) => return err,
        };
        let effective_stdin = plan.stdin.clone().unwrap_or_else(|| stdin.to_string());

        // Stage stdin where `read` can consume it incrementally; nested
        // compounds without their own stdin inherit the enclosing slot.
        let saved_slot = state.env.get(STDIN_SLOT).cloned();
        if !effective_stdin.is_empty() {
            state.env.insert(STDIN_SLOT.to_string(), effective_stdin);
        }

        let out = match &compound.kind {
            CompoundKind::If { arms, else_body } => self.run_if(state, arms, else_body.as_deref()),
            CompoundKind::While { condition, body } => self.run_loop(state, condition, body, false),
            CompoundKind::Until { condition, body } => self.run_loop(state, condition, body, true),
            CompoundKind::For { var, words, body } => self.run_for(state, var, words.as_deref(), body),
            CompoundKind::CStyleFor { init, condition, update, body } => {
                self.run_cstyle_for(state, init.as_ref(), condition.as_ref(), update.as_ref(), body)
            }
            CompoundKind::Case { subject, arms } => self.run_case(state, subject, arms),
            CompoundKind::Group(body) => self.run_lists(state, body),
            CompoundKind::Subshell(body) => self.run_subshell(state, body),
            CompoundKind::Arith(expr) => match eval_arith(state, expr) {
                Ok(value) => ExecOutcome::with_code(i32::from(value == 0)),
                Err(message) => ExecOutcome::failure(format!("sandsh: {}\n", message), 1),
            },
        };

        match saved_slot {
            Some(value) => {
                state.env.insert(STDIN_SLOT.to_string(), value);
            }
            None => {
                state.env.remove(STDIN_SLOT);
            }
        }

        let control = out.control;
        let exit_code = out.exit_code;
        match plan.apply(state, out.stdout, out.stderr) {
            Ok((stdout, stderr)) => ExecOutcome { stdout, stderr, exit_code, control },
            Err(message) => ExecOutcome::failure(message, 1),
        }
    }

    fn run_condition(&self, state: &mut ShellState, lists: &[AndOrList]) -> ExecOutcome {
        let was = state.in_condition;
        state.in_condition = true;
        let out = self.run_lists(state, lists);
        state.in_condition = was;
        out
    }

    fn run_if(
        &self,
        state: &mut ShellState,
        arms: &[(Vec<AndOrList>, Vec<AndOrList>)],
        else_body: Option<&[AndOrList]>,
    ) -> ExecOutcome {
        let mut acc = ExecOutcome::ok();
        for (condition, body) in arms {
            let cond = self.run_condition(state, condition);
            let matched = cond.exit_code == 0;
            let control = cond.control;
            acc.stdout.push_str(&cond.stdout);
            acc.stderr.push_str(&cond.stderr);
            if control != ControlFlow::None {
                acc.control = control;
                acc.exit_code = cond.exit_code;
                return acc;
            }
            if matched {
                let body_out = self.run_lists(state, body);
                acc.stdout.push_str(&body_out.stdout);
                acc.stderr.push_str(&body_out.stderr);
                acc.exit_code = body_out.exit_code;
                acc.control = body_out.control;
                return acc;
            }
        }
        if let Some(body) = else_body {
            let body_out = self.run_lists(state, body);
            acc.stdout.push_str(&body_out.stdout);
            acc.stderr.push_str(&body_out.stderr);
            acc.exit_code = body_out.exit_code;
            acc.control = body_out.control;
            return acc;
        }
        acc.exit_code = 0;
        acc
    }

    fn run_loop(
        &self,
        state: &mut ShellState,
        condition: &[AndOrList],
        body: &[AndOrList],
        until: bool,
    ) -> ExecOutcome {
        let mut acc = ExecOutcome::ok();
        let mut iterations: u64 = 0;
        loop {
            iterations += 1;
            if iterations > self.limits.max_loop_iterations {
                return self.loop_limit_exceeded(acc);
            }

            let cond = self.run_condition(state, condition);
            acc.stdout.push_str(&cond.stdout);
            acc.stderr.push_str(&cond.stderr);
            if cond.control != ControlFlow::None {
                acc.control = cond.control;
                acc.exit_code = cond.exit_code;
                return acc;
            }
            if (cond.exit_code == 0) == until {
                break;
            }

            state.loop_depth += 1;
            let body_out = self.run_lists(state, body);
            state.loop_depth -= 1;
            acc.stdout.push_str(&body_out.stdout);
            acc.stderr.push_str(&body_out.stderr);
            acc.exit_code = body_out.exit_code;

            match body_out.control {
                ControlFlow::None => {}
                ControlFlow::Break(n) => {
                    if n > 1 {
                        acc.control = ControlFlow::Break(n - 1);
                        return acc;
                    }
                    break;
                }
                ControlFlow::Continue(n) => {
                    if n > 1 {
                        acc.control = ControlFlow::Continue(n - 1);
                        return acc;
                    }
                }
                other => {
                    acc.control = other;
                    return acc;
                }
            }
        }
        acc.control = ControlFlow::None;
        acc
    }

    fn run_for(
        &self,
        state: &mut ShellState,
        var: &str,
        words: Option<&[Word]>,
        body: &[AndOrList],
    ) -> ExecOutcome {
        let items = match words {
            Some(words) => {
                let mut expander = Expander::new(state, self);
                match expander.expand_words(words) {
                    Ok(items) => items,
                    Err(e) => {
                        let mut out =
                            ExecOutcome::failure(format!("{}\n", e.message), e.exit_code);
                        if e.fatal {
                            out.control = ControlFlow::Exit(e.exit_code);
                        }
                        return out;
                    }
                }
            }
            None => state.positional.clone(),
        };

        let mut acc = ExecOutcome::ok();
        let mut iterations: u64 = 0;
        'items: for item in items {
            iterations += 1;
            if iterations > self.limits.max_loop_iterations {
                return self.loop_limit_exceeded(acc);
            }
            state.set_var(var, item);

            state.loop_depth += 1;
            let body_out = self.run_lists(state, body);
            state.loop_depth -= 1;
            acc.stdout.push_str(&body_out.stdout);
            acc.stderr.push_str(&body_out.stderr);
            acc.exit_code = body_out.exit_code;

            match body_out.control {
                ControlFlow::None => {}
                ControlFlow::Break(n) => {
                    if n > 1 {
                        acc.control = ControlFlow::Break(n - 1);
                        return acc;
                    }
                    break 'items;
                }
                ControlFlow::Continue(n) => {
                    if n > 1 {
                        acc.control = ControlFlow::Continue(n - 1);
                        return acc;
                    }
                }
                other => {
                    acc.control = other;
                    return acc;
                }
            }
        }
        acc
    }

    fn run_cstyle_for(
        &self,
        state: &mut ShellState,
        init: Option<&crate::ast::ArithExpr>,
        condition: Option<&crate::ast::ArithExpr>,
        update: Option<&crate::ast::ArithExpr>,
        body: &[AndOrList],
    ) -> ExecOutcome {
        let mut acc = ExecOutcome::ok();
        if let Some(expr) = init {
            if let Err(message) = eval_arith(state, expr) {
                return ExecOutcome::failure(format!("sandsh: {}\n", message), 1);
            }
        }

        let mut iterations: u64 = 0;
        loop {
            iterations += 1;
            if iterations > self.limits.max_loop_iterations {
                return self.loop_limit_exceeded(acc);
            }

            if let Some(expr) = condition {
                match eval_arith(state, expr) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(message) => {
                        acc.stderr.push_str(&format!("sandsh: {}\n", message));
                        acc.exit_code = 1;
                        return acc;
                    }
                }
            }

            state.loop_depth += 1;
            let body_out = self.run_lists(state, body);
            state.loop_depth -= 1;
            acc.stdout.push_str(&body_out.stdout);
            acc.stderr.push_str(&body_out.stderr);
            acc.exit_code = body_out.exit_code;

            match body_out.control {
                ControlFlow::None => {}
                ControlFlow::Break(n) => {
                    if n > 1 {
                        acc.control = ControlFlow::Break(n - 1);
                        return acc;
                    }
                    break;
                }
                ControlFlow::Continue(n) if n > 1 => {
                    acc.control = ControlFlow::Continue(n - 1);
                    return acc;
                }
                ControlFlow::Continue(_) => {}
                other => {
                    acc.control = other;
                    return acc;
                }
            }

            if let Some(expr) = update {
                if let Err(message) = eval_arith(state, expr) {
                    acc.stderr.push_str(&format!("sandsh: {}\n", message));
                    acc.exit_code = 1;
                    return acc;
                }
            }
        }
        acc
    }

    fn run_case(
        &self,
        state: &mut ShellState,
        subject: &Word,
        arms: &[crate::ast::CaseArm],
    ) -> ExecOutcome {
        let subject_text = {
            let mut expander = Expander::new(state, self);
            match expander.expand_to_string(subject) {
                Ok(text) => text,
                Err(e) => return ExecOutcome::failure(format!("{}\n", e.message), e.exit_code),
            }
        };

        for arm in arms {
            for pattern_word in &arm.patterns {
                let pattern = {
                    let mut expander = Expander::new(state, self);
                    match expander.expand_to_pattern(pattern_word) {
                        Ok(p) => p,
                        Err(e) => {
                            return ExecOutcome::failure(format!("{}\n", e.message), e.exit_code)
                        }
                    }
                };
                if pattern_match(&pattern, &subject_text) {
                    return self.run_lists(state, &arm.body);
                }
            }
        }
        ExecOutcome::ok()
    }

    /// `( ... )`: a clone of the state; env/cwd changes are discarded, file
    /// effects persist through the shared fs handle, and every control
    /// signal stops at the boundary.
    fn run_subshell(&self, state: &mut ShellState, body: &[AndOrList]) -> ExecOutcome {
        let mut sub = state.clone();
        sub.in_condition = false;
        let mut out = self.run_lists(&mut sub, body);
        state.command_count = sub.command_count;
        match out.control {
            ControlFlow::Exit(code) | ControlFlow::Return(code) => out.exit_code = code,
            _ => {}
        }
        out.control = ControlFlow::None;
        out
    }

    fn loop_limit_exceeded(&self, mut acc: ExecOutcome) -> ExecOutcome {
        acc.stderr.push_str(&format!(
            "sandsh: maximum loop iterations ({}) exceeded\n",
            self.limits.max_loop_iterations
        ));
        acc.exit_code = 126;
        acc.control = ControlFlow::Exit(126);
        acc
    }
}

fn restore_assignments(state: &mut ShellState, saved: Vec<(String, Option<String>)>) {
    for (name, old) in saved.into_iter().rev() {
        match old {
            Some(value) => {
                state.env.insert(name, value);
            }
            None => {
                state.env.remove(&name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use std::sync::Arc;

    fn run(script: &str) -> ExecOutcome {
        run_with(script, |_| {})
    }

    fn run_with(script: &str, setup: impl FnOnce(&mut ShellState)) -> ExecOutcome {
        let registry = CommandRegistry::with_defaults();
        let limits = ExecLimits::default();
        let engine = Engine::new(&registry, &limits);
        let mut state = ShellState::new(Arc::new(InMemoryFs::new()));
        setup(&mut state);
        let ast = crate::parser::parse(script).unwrap();
        engine.run_script(&mut state, &ast)
    }

    #[test]
    fn test_echo() {
        let out = run("echo hello world");
        assert_eq!(out.stdout, "hello world\n");
        assert_eq!(out.exit_code, 0);
    }

    #[test]
    fn test_command_not_found() {
        let out = run("no_such_command");
        assert_eq!(out.exit_code, 127);
        assert!(out.stderr.contains("command not found"));
    }

    #[test]
    fn test_and_or() {
        assert_eq!(run("true && echo yes").stdout, "yes\n");
        assert_eq!(run("false && echo no").stdout, "");
        assert_eq!(run("false || echo fallback").stdout, "fallback\n");
        assert_eq!(run("true || echo skipped").stdout, "");
    }

    #[test]
    fn test_pipeline_stdout_chains() {
        let out = run("echo hello | rev");
        assert_eq!(out.stdout, "olleh\n");
    }

    #[test]
    fn test_pipeline_exit_is_last_stage() {
        assert_eq!(run("false | true").exit_code, 0);
        assert_eq!(run("true | false").exit_code, 1);
    }

    #[test]
    fn test_pipefail() {
        let out = run_with("false | true", |st| st.options.pipefail = true);
        assert_eq!(out.exit_code, 1);
    }

    #[test]
    fn test_negation() {
        assert_eq!(run("! false").exit_code, 0);
        assert_eq!(run("! true").exit_code, 1);
    }

    #[test]
    fn test_if_else() {
        assert_eq!(run("if true; then echo a; else echo b; fi").stdout, "a\n");
        assert_eq!(run("if false; then echo a; else echo b; fi").stdout, "b\n");
    }

    #[test]
    fn test_while_with_arithmetic() {
        let out = run("i=0; while (( i < 3 )); do echo $i; i=$((i+1)); done");
        assert_eq!(out.stdout, "0\n1\n2\n");
    }

    #[test]
    fn test_until_loop() {
        let out = run("i=0; until (( i >= 2 )); do echo $i; i=$((i+1)); done");
        assert_eq!(out.stdout, "0\n1\n");
    }

    #[test]
    fn test_for_loop_brace_range() {
        let out = run("for i in {1..3}; do echo $i; done");
        assert_eq!(out.stdout, "1\n2\n3\n");
        assert_eq!(out.exit_code, 0);
    }

    #[test]
    fn test_cstyle_for() {
        let out = run("for ((i=0; i<3; i++)); do echo $i; done");
        assert_eq!(out.stdout, "0\n1\n2\n");
    }

    #[test]
    fn test_break_and_continue() {
        let out = run("for i in 1 2 3 4; do if [ $i = 3 ]; then break; fi; echo $i; done");
        assert_eq!(out.stdout, "1\n2\n");

        let out = run("for i in 1 2 3; do if [ $i = 2 ]; then continue; fi; echo $i; done");
        assert_eq!(out.stdout, "1\n3\n");
    }

    #[test]
    fn test_break_n() {
        let out = run(
            "for i in 1 2; do for j in a b; do echo $i$j; break 2; done; done; echo after",
        );
        assert_eq!(out.stdout, "1a\nafter\n");
    }

    #[test]
    fn test_case() {
        let out = run("case hello in h*) echo starts-with-h;; *) echo other;; esac");
        assert_eq!(out.stdout, "starts-with-h\n");

        let out = run("case xyz in a|b) echo ab;; *) echo fallthrough;; esac");
        assert_eq!(out.stdout, "fallthrough\n");
    }

    #[test]
    fn test_function_definition_and_call() {
        let out = run("greet() { echo hi $1; }; greet world");
        assert_eq!(out.stdout, "hi world\n");
    }

    #[test]
    fn test_function_return_code() {
        let out = run("f() { return 3; }; f; echo $?");
        assert_eq!(out.stdout, "3\n");
    }

    #[test]
    fn test_function_assignment_persists() {
        let out = run("f() { x=inside; }; f; echo $x");
        assert_eq!(out.stdout, "inside\n");
    }

    #[test]
    fn test_local_is_scoped() {
        let out = run("x=outer; f() { local x=inner; echo $x; }; f; echo $x");
        assert_eq!(out.stdout, "inner\nouter\n");
    }

    #[test]
    fn test_subshell_isolation() {
        let out = run("x=outer; (x=inner; echo $x); echo $x");
        assert_eq!(out.stdout, "inner\nouter\n");
    }

    #[test]
    fn test_subshell_file_effects_persist() {
        let out = run("(echo data > /f); cat /f");
        assert_eq!(out.stdout, "data\n");
    }

    #[test]
    fn test_group_shares_state() {
        let out = run("{ x=1; }; echo $x");
        assert_eq!(out.stdout, "1\n");
    }

    #[test]
    fn test_exit_stops_script() {
        let out = run("echo before; exit 7; echo after");
        assert_eq!(out.stdout, "before\n");
        assert_eq!(out.exit_code, 7);
    }

    #[test]
    fn test_errexit() {
        let out = run_with("echo before\nfalse\necho after", |st| st.options.errexit = true);
        assert_eq!(out.stdout, "before\n");
        assert_eq!(out.exit_code, 1);
    }

    #[test]
    fn test_errexit_spares_condition_and_andor_left() {
        let out = run_with("if false; then echo t; fi; echo ok", |st| st.options.errexit = true);
        assert_eq!(out.stdout, "ok\n");

        let out = run_with("false && echo no\necho survived", |st| st.options.errexit = true);
        assert_eq!(out.stdout, "survived\n");

        let out = run_with("false || echo caught\necho end", |st| st.options.errexit = true);
        assert_eq!(out.stdout, "caught\nend\n");
    }

    #[test]
    fn test_errexit_with_pipefail_scenario() {
        // set -euo pipefail; echo before; false | true; echo after
        let out = run("set -euo pipefail\necho before\nfalse | true\necho after");
        assert_eq!(out.stdout, "before\n");
        assert_eq!(out.exit_code, 1);
        assert_eq!(out.stderr, "");
    }

    #[test]
    fn test_negated_failure_does_not_errexit() {
        let out = run_with("! false\necho ok", |st| st.options.errexit = true);
        assert_eq!(out.stdout, "ok\n");
    }

    #[test]
    fn test_prefix_assignment_is_temporary() {
        let out = run("FOO=bar env | grep ^FOO=; echo \"[$FOO]\"");
        assert_eq!(out.stdout, "FOO=bar\n[]\n");
    }

    #[test]
    fn test_assignment_only_persists() {
        let out = run("x=5; echo $x");
        assert_eq!(out.stdout, "5\n");
    }

    #[test]
    fn test_assignment_sequence_left_to_right() {
        let out = run("a=1 b=$a sh_dummy 2>/dev/null; a=1; b=$a; echo $b");
        assert_eq!(out.stdout, "1\n");
    }

    #[test]
    fn test_output_redirection_roundtrip() {
        let out = run("echo X > /file; cat /file");
        assert_eq!(out.stdout, "X\n");
    }

    #[test]
    fn test_stderr_redirection() {
        let out = run("no_such_cmd 2> /err; cat /err");
        assert_eq!(out.stdout, "sandsh: no_such_cmd: command not found\n");
        assert_eq!(out.stderr, "");
    }

    #[test]
    fn test_heredoc_stdin() {
        let out = run("cat <<EOF\nline one\nEOF");
        assert_eq!(out.stdout, "line one\n");
    }

    #[test]
    fn test_read_loop_across_pipe() {
        let out = run("printf 'a\\nb\\n' | while read x; do echo \"R:$x\"; done");
        assert_eq!(out.stdout, "R:a\nR:b\n");
    }

    #[test]
    fn test_command_substitution_in_word() {
        let out = run("echo \"x$(echo hello)y\"");
        assert_eq!(out.stdout, "xhelloy\n");
    }

    #[test]
    fn test_arith_precedence_scenario() {
        let out = run("echo $((1 + 2 * 3))");
        assert_eq!(out.stdout, "7\n");
    }

    #[test]
    fn test_nested_parameter_default_scenarios() {
        let out = run("x=outer; echo ${x:-${y:-default}}");
        assert_eq!(out.stdout, "outer\n");
        let out = run("echo ${x:-${y:-default}}");
        assert_eq!(out.stdout, "default\n");
    }

    #[test]
    fn test_exit_code_wraps_modulo_256() {
        let out = run("exit 300");
        assert_eq!(out.exit_code, 300);
        // wrapping happens at the session boundary
    }

    #[test]
    fn test_xtrace() {
        let out = run("set -x; echo hi");
        assert_eq!(out.stdout, "hi\n");
        assert!(out.stderr.contains("+ echo hi"));
    }

    #[test]
    fn test_exit_in_multi_stage_pipeline_is_contained() {
        let out = run("exit 3 | true; echo still here");
        assert_eq!(out.stdout, "still here\n");
    }

    #[test]
    fn test_close_stdin_overrides_pipe() {
        // `<&-` reads EOF even with a producer upstream.
        let out = run("echo data | cat <&-");
        assert_eq!(out.stdout, "");
        assert_eq!(out.exit_code, 0);
    }

    #[test]
    fn test_dup_stdin_bad_fd_is_error() {
        let out = run("cat <&3");
        assert_eq!(out.exit_code, 1);
        assert!(out.stderr.contains("Bad file descriptor"));
    }
}
