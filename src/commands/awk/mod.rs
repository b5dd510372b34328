//! The AWK engine.
//!
//! Lexer -> parser -> tree-walking evaluator. The driver here owns rule
//! dispatch: BEGIN blocks, per-record pattern matching with stateful range
//! patterns, END blocks, and the `exit`/`next` short-circuits. `exit` in a
//! BEGIN block still runs END blocks (with its exit code preserved).

pub mod ast;
pub mod builtins;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod stmt;
pub mod value;

use ast::{Pattern, Program, Rule};
use eval::{eval_expr, regex_matches};
use runtime::AwkRuntime;
use stmt::{exec_block, Flow};
use value::is_truthy;

use super::{Command, CommandContext, CommandResult};

pub struct AwkCommand;

impl Command for AwkCommand {
    fn name(&self) -> &'static str {
        "awk"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let invocation = match parse_invocation(&ctx) {
            Ok(invocation) => invocation,
            Err(message) => return CommandResult::error_with_code(format!("awk: {}\n", message), 2),
        };

        let program = match parser::parse_program(&invocation.program_text) {
            Ok(program) => program,
            Err(message) => {
                return CommandResult::error_with_code(format!("awk: syntax error: {}\n", message), 2)
            }
        };

        let mut runner = Runner::new(&program);
        runner.rt.fs = invocation.field_sep.unwrap_or_else(|| " ".to_string());
        for (name, value) in invocation.assignments {
            runner.rt.set_var(&name, value);
        }

        // Gather input up front; getline consumes from the same stream.
        let mut input: Vec<String> = Vec::new();
        let mut stderr = String::new();
        if invocation.files.is_empty() {
            push_records(&mut input, &ctx.stdin);
        } else {
            for file in &invocation.files {
                if file == "-" {
                    push_records(&mut input, &ctx.stdin);
                    continue;
                }
                match ctx.fs.read_file(&ctx.absolute(file)) {
                    Ok(content) => {
                        runner.rt.filename = file.clone();
                        push_records(&mut input, &content);
                    }
                    Err(e) => {
                        return CommandResult::error_with_code(
                            format!("awk: can't open file {}: {}\n", file, e.reason()),
                            2,
                        )
                    }
                }
            }
        }
        runner.rt.input = input.clone();

        runner.run_begin();
        if !runner.rt.exiting {
            while runner.rt.input_pos < runner.rt.input.len() {
                let line = runner.rt.input[runner.rt.input_pos].clone();
                runner.rt.input_pos += 1;
                runner.run_record(&line);
                if runner.rt.exiting {
                    break;
                }
            }
        }
        runner.run_end();

        if let Some(message) = runner.rt.runtime_error.clone() {
            stderr.push_str(&format!("awk: {}\n", message));
            return CommandResult::with_exit_code(runner.rt.output.clone(), stderr, 2);
        }

        // Flush print redirections through the filesystem contract.
        for (path, (content, truncate)) in &runner.rt.file_output {
            let resolved = ctx.absolute(path);
            let result = if *truncate {
                ctx.fs.write_file(&resolved, content.as_bytes())
            } else {
                ctx.fs.append_file(&resolved, content.as_bytes())
            };
            if let Err(e) = result {
                stderr.push_str(&format!("awk: can't redirect to {}: {}\n", path, e.reason()));
            }
        }

        CommandResult::with_exit_code(runner.rt.output.clone(), stderr, runner.rt.exit_code)
    }
}

/// Records are newline-separated; a trailing newline does not produce a
/// final empty record.
fn push_records(input: &mut Vec<String>, content: &str) {
    if content.is_empty() {
        return;
    }
    let trimmed = content.strip_suffix('\n').unwrap_or(content);
    if trimmed.is_empty() {
        input.push(String::new());
        return;
    }
    input.extend(trimmed.split('\n').map(String::from));
}

struct Invocation {
    program_text: String,
    field_sep: Option<String>,
    assignments: Vec<(String, String)>,
    files: Vec<String>,
}

fn parse_invocation(ctx: &CommandContext) -> Result<Invocation, String> {
    let mut field_sep = None;
    let mut assignments = Vec::new();
    let mut program_text: Option<String> = None;
    let mut files = Vec::new();

    let mut iter = ctx.args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-F" => {
                let sep = iter.next().ok_or("option -F requires an argument")?;
                field_sep = Some(unescape_sep(sep));
            }
            s if s.starts_with("-F") && s.len() > 2 => {
                field_sep = Some(unescape_sep(&s[2..]));
            }
            "-v" => {
                let spec = iter.next().ok_or("option -v requires an argument")?;
                let (name, value) =
                    spec.split_once('=').ok_or(format!("invalid -v assignment: {}", spec))?;
                assignments.push((name.to_string(), value.to_string()));
            }
            "-f" => {
                let path = iter.next().ok_or("option -f requires an argument")?;
                let content = ctx
                    .fs
                    .read_file(&ctx.absolute(path))
                    .map_err(|e| format!("can't open file {}: {}", path, e.reason()))?;
                program_text = Some(content);
            }
            "--" => {}
            _ => {
                if program_text.is_none() {
                    program_text = Some(arg.clone());
                } else if let Some((name, value)) = operand_assignment(arg) {
                    assignments.push((name, value));
                } else {
                    files.push(arg.clone());
                }
            }
        }
    }

    Ok(Invocation {
        program_text: program_text.ok_or("no program text")?,
        field_sep,
        assignments,
        files,
    })
}

/// `name=value` operands between file names act like -v assignments.
fn operand_assignment(arg: &str) -> Option<(String, String)> {
    let (name, value) = arg.split_once('=')?;
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some((name.to_string(), value.to_string()))
    } else {
        None
    }
}

/// `-F '\t'` passes a literal backslash-t through the shell.
fn unescape_sep(sep: &str) -> String {
    sep.replace("\\t", "\t").replace("\\n", "\n")
}

// ---------------------------------------------------------------------------
// Rule dispatch
// ---------------------------------------------------------------------------

struct Runner<'p> {
    rt: AwkRuntime,
    program: &'p Program,
    /// One flag per rule for stateful range patterns.
    range_active: Vec<bool>,
}

impl<'p> Runner<'p> {
    fn new(program: &'p Program) -> Self {
        Self { rt: AwkRuntime::new(), program, range_active: vec![false; program.rules.len()] }
    }

    fn run_begin(&mut self) {
        let program = self.program;
        for rule in &program.rules {
            if self.rt.exiting {
                break;
            }
            if matches!(rule.pattern, Some(Pattern::Begin)) {
                self.run_action(rule);
            }
        }
    }

    fn run_record(&mut self, line: &str) {
        let program = self.program;
        self.rt.set_record(line);
        self.rt.nr += 1;

        for (index, rule) in program.rules.iter().enumerate() {
            if self.rt.exiting {
                return;
            }
            if matches!(rule.pattern, Some(Pattern::Begin) | Some(Pattern::End)) {
                continue;
            }
            if !self.rule_matches(index) {
                continue;
            }
            if self.run_action(rule) == Flow::Next {
                return;
            }
        }
    }

    fn run_end(&mut self) {
        let program = self.program;
        let had_exit = self.rt.exiting;
        // END blocks still run after exit; their own exit stops the rest.
        self.rt.exiting = false;
        for rule in &program.rules {
            if matches!(rule.pattern, Some(Pattern::End)) {
                self.run_action(rule);
                if self.rt.exiting {
                    break;
                }
            }
        }
        self.rt.exiting = had_exit || self.rt.exiting;
    }

    fn run_action(&mut self, rule: &Rule) -> Flow {
        match &rule.action {
            None => {
                // Default action: print $0.
                let line = self.rt.get_field(0);
                let ors = self.rt.ors.clone();
                self.rt.emit(&line);
                self.rt.emit(&ors);
                Flow::Normal
            }
            Some(stmts) => exec_block(&mut self.rt, self.program, stmts),
        }
    }

    fn rule_matches(&mut self, index: usize) -> bool {
        let pattern = match &self.program.rules[index].pattern {
            None => return true,
            Some(pattern) => pattern.clone(),
        };
        match pattern {
            Pattern::Begin | Pattern::End => false,
            Pattern::Regex(re) => {
                let record = self.rt.get_field(0);
                regex_matches(&mut self.rt, &re, &record)
            }
            Pattern::Expr(expr) => {
                let value = eval_expr(&mut self.rt, self.program, &expr);
                is_truthy(&value)
            }
            Pattern::Range(start, end) => {
                if self.range_active[index] {
                    // Inside the range: every record matches until the end
                    // pattern closes it (inclusive).
                    if self.single_matches(&end) {
                        self.range_active[index] = false;
                    }
                    true
                } else if self.single_matches(&start) {
                    // The end pattern may close on the same record.
                    self.range_active[index] = !self.single_matches(&end);
                    true
                } else {
                    false
                }
            }
        }
    }

    fn single_matches(&mut self, pattern: &Pattern) -> bool {
        match pattern {
            Pattern::Regex(re) => {
                let record = self.rt.get_field(0);
                regex_matches(&mut self.rt, re, &record)
            }
            Pattern::Expr(expr) => {
                let value = eval_expr(&mut self.rt, self.program, expr);
                is_truthy(&value)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::{ctx, ctx_with_files};

    fn awk(args: &[&str], stdin: &str) -> CommandResult {
        AwkCommand.execute(ctx(args, stdin))
    }

    #[test]
    fn test_sum_fields_begin_end() {
        let r = awk(&["BEGIN{s=0} {s+=$1} END{print s}"], "1\n2\n3\n");
        assert_eq!(r.stdout, "6\n");
        assert_eq!(r.exit_code, 0);
    }

    #[test]
    fn test_exit_short_circuits_but_runs_end() {
        let r = awk(&["{if($1==2)exit 5} END{print \"end\"}"], "1\n2\n3\n");
        assert_eq!(r.stdout, "end\n");
        assert_eq!(r.exit_code, 5);
    }

    #[test]
    fn test_exit_in_begin_still_runs_end() {
        let r = awk(&["BEGIN{print \"b\"; exit 3} {print} END{print \"e\"}"], "x\n");
        assert_eq!(r.stdout, "b\ne\n");
        assert_eq!(r.exit_code, 3);
    }

    #[test]
    fn test_default_action_prints_matching() {
        let r = awk(&["/b/"], "abc\nxyz\nweb\n");
        assert_eq!(r.stdout, "abc\nweb\n");
    }

    #[test]
    fn test_next_skips_remaining_rules() {
        let r = awk(&["/skip/ {next} {print \"kept:\" $0}"], "a\nskip me\nb\n");
        assert_eq!(r.stdout, "kept:a\nkept:b\n");
    }

    #[test]
    fn test_field_separator_flag() {
        let r = awk(&["-F", ":", "{print $2}"], "a:b:c\n");
        assert_eq!(r.stdout, "b\n");
    }

    #[test]
    fn test_nr_nf() {
        let r = awk(&["{print NR, NF}"], "a b\nc d e\n");
        assert_eq!(r.stdout, "1 2\n2 3\n");
    }

    #[test]
    fn test_dash_v_assignment() {
        let r = awk(&["-v", "x=7", "BEGIN{print x}"], "");
        assert_eq!(r.stdout, "7\n");
    }

    #[test]
    fn test_range_pattern() {
        let r = awk(&["/start/,/stop/"], "a\nstart\nmid\nstop\nz\n");
        assert_eq!(r.stdout, "start\nmid\nstop\n");
    }

    #[test]
    fn test_range_pattern_single_line() {
        let r = awk(&["/both/,/both/"], "x\nboth\ny\nboth\nz\n");
        assert_eq!(r.stdout, "both\nboth\n");
    }

    #[test]
    fn test_expression_pattern() {
        let r = awk(&["NR % 2 == 1"], "1\n2\n3\n4\n");
        assert_eq!(r.stdout, "1\n3\n");
    }

    #[test]
    fn test_reads_files() {
        let r = AwkCommand.execute(ctx_with_files(
            &["{print FILENAME \":\" $0}", "/data.txt"],
            "",
            &[("/data.txt", "line\n")],
        ));
        assert_eq!(r.stdout, "/data.txt:line\n");
    }

    #[test]
    fn test_missing_file_is_error() {
        let r = awk(&["{print}", "/nope"], "");
        assert_eq!(r.exit_code, 2);
    }

    #[test]
    fn test_syntax_error_exit_2() {
        let r = awk(&["{ print ( }"], "");
        assert_eq!(r.exit_code, 2);
        assert!(r.stderr.contains("syntax error"));
    }

    #[test]
    fn test_no_trailing_record_from_final_newline() {
        let r = awk(&["END{print NR}"], "a\nb\n");
        assert_eq!(r.stdout, "2\n");
    }

    #[test]
    fn test_print_redirect_writes_file() {
        let context = ctx(&["{print $1 > \"/out\"}"], "x y\n");
        let fs = context.fs.clone();
        let r = AwkCommand.execute(context);
        assert_eq!(r.exit_code, 0);
        assert_eq!(fs.read_file("/out").unwrap(), "x\n");
    }

    #[test]
    fn test_fs_assignment_in_begin() {
        let r = awk(&["BEGIN{FS=\",\"} {print $2}"], "a,b\n");
        assert_eq!(r.stdout, "b\n");
    }

    #[test]
    fn test_ofs_on_field_rebuild() {
        let r = awk(&["BEGIN{OFS=\"-\"} {$1=$1; print}"], "a b c\n");
        assert_eq!(r.stdout, "a-b-c\n");
    }

    #[test]
    fn test_uninitialized_vars() {
        let r = awk(&["{print x+0, \"[\" y \"]\"}"], "line\n");
        assert_eq!(r.stdout, "0 []\n");
    }

    #[test]
    fn test_operand_assignment_between_files() {
        let r = AwkCommand.execute(ctx_with_files(
            &["{print v, $0}", "v=1", "/f.txt"],
            "",
            &[("/f.txt", "x\n")],
        ));
        assert_eq!(r.stdout, "1 x\n");
    }
}
