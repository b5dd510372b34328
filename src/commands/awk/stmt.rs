//! AWK Statement Execution
//!
//! Statements return a [`Flow`] value: loops consume break/continue, the
//! per-record driver consumes next, `exit` sets the runtime's exiting flag
//! and unwinds everything up to the END blocks.

use crate::commands::printf::format::{parse_format, render, FormatPiece};

use super::ast::{Program, RedirectKind, Stmt};
use super::eval::eval_expr;
use super::runtime::AwkRuntime;
use super::value::{is_truthy, to_num};

const MAX_LOOP_ITERATIONS: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Next,
    Exit,
    Return(String),
}

pub fn exec_block(rt: &mut AwkRuntime, program: &Program, stmts: &[Stmt]) -> Flow {
    for stmt in stmts {
        match exec_stmt(rt, program, stmt) {
            Flow::Normal => {}
            other => return other,
        }
    }
    Flow::Normal
}

pub fn exec_stmt(rt: &mut AwkRuntime, program: &Program, stmt: &Stmt) -> Flow {
    if rt.exiting {
        return Flow::Exit;
    }
    match stmt {
        Stmt::Expr(expr) => {
            eval_expr(rt, program, expr);
            if rt.exiting {
                Flow::Exit
            } else {
                Flow::Normal
            }
        }
        Stmt::Block(stmts) => exec_block(rt, program, stmts),
        Stmt::Print { args, redirect } => {
            let text = if args.is_empty() {
                format!("{}{}", rt.get_field(0), rt.ors)
            } else {
                let rendered: Vec<String> =
                    args.iter().map(|a| eval_expr(rt, program, a)).collect();
                format!("{}{}", rendered.join(&rt.ofs.clone()), rt.ors)
            };
            write_output(rt, program, redirect.as_ref(), &text);
            Flow::Normal
        }
        Stmt::Printf { args, redirect } => {
            let format = eval_expr(rt, program, &args[0]);
            let values: Vec<String> =
                args[1..].iter().map(|a| eval_expr(rt, program, a)).collect();
            let text = render_printf(&format, &values);
            write_output(rt, program, redirect.as_ref(), &text);
            Flow::Normal
        }
        Stmt::If { cond, then, otherwise } => {
            if is_truthy(&eval_expr(rt, program, cond)) {
                exec_stmt(rt, program, then)
            } else if let Some(otherwise) = otherwise {
                exec_stmt(rt, program, otherwise)
            } else {
                Flow::Normal
            }
        }
        Stmt::While { cond, body } => {
            let mut iterations = 0u64;
            while is_truthy(&eval_expr(rt, program, cond)) {
                if rt.exiting {
                    return Flow::Exit;
                }
                iterations += 1;
                if iterations > MAX_LOOP_ITERATIONS {
                    rt.fail("maximum loop iterations exceeded");
                    return Flow::Exit;
                }
                match exec_stmt(rt, program, body) {
                    Flow::Normal | Flow::Continue => {}
                    Flow::Break => break,
                    other => return other,
                }
            }
            Flow::Normal
        }
        Stmt::DoWhile { body, cond } => {
            let mut iterations = 0u64;
            loop {
                iterations += 1;
                if iterations > MAX_LOOP_ITERATIONS {
                    rt.fail("maximum loop iterations exceeded");
                    return Flow::Exit;
                }
                match exec_stmt(rt, program, body) {
                    Flow::Normal | Flow::Continue => {}
                    Flow::Break => break,
                    other => return other,
                }
                if !is_truthy(&eval_expr(rt, program, cond)) || rt.exiting {
                    break;
                }
            }
            if rt.exiting {
                Flow::Exit
            } else {
                Flow::Normal
            }
        }
        Stmt::For { init, cond, update, body } => {
            if let Some(init) = init {
                match exec_stmt(rt, program, init) {
                    Flow::Normal => {}
                    other => return other,
                }
            }
            let mut iterations = 0u64;
            loop {
                if let Some(cond) = cond {
                    if !is_truthy(&eval_expr(rt, program, cond)) {
                        break;
                    }
                }
                if rt.exiting {
                    return Flow::Exit;
                }
                iterations += 1;
                if iterations > MAX_LOOP_ITERATIONS {
                    rt.fail("maximum loop iterations exceeded");
                    return Flow::Exit;
                }
                match exec_stmt(rt, program, body) {
                    Flow::Normal | Flow::Continue => {}
                    Flow::Break => break,
                    other => return other,
                }
                if let Some(update) = update {
                    match exec_stmt(rt, program, update) {
                        Flow::Normal => {}
                        other => return other,
                    }
                }
            }
            Flow::Normal
        }
        Stmt::ForIn { var, array, body } => {
            let actual = rt.resolve_array(array);
            let keys: Vec<String> = rt
                .arrays
                .get(&actual)
                .map(|a| a.keys().cloned().collect())
                .unwrap_or_default();
            for key in keys {
                rt.set_var(var, key);
                match exec_stmt(rt, program, body) {
                    Flow::Normal | Flow::Continue => {}
                    Flow::Break => break,
                    other => return other,
                }
            }
            Flow::Normal
        }
        Stmt::Break => Flow::Break,
        Stmt::Continue => Flow::Continue,
        Stmt::Next => Flow::Next,
        Stmt::Exit(code) => {
            if let Some(code) = code {
                rt.exit_code = to_num(&eval_expr(rt, program, code)) as i32;
            }
            rt.exiting = true;
            Flow::Exit
        }
        Stmt::Return(value) => {
            let result = match value {
                Some(expr) => eval_expr(rt, program, expr),
                None => String::new(),
            };
            Flow::Return(result)
        }
        Stmt::Delete { array, subscripts } => {
            let actual = rt.resolve_array(array);
            if subscripts.is_empty() {
                rt.arrays.shift_remove(&actual);
            } else {
                let key = super::eval::eval_subscripts(rt, program, subscripts);
                if let Some(entries) = rt.arrays.get_mut(&actual) {
                    entries.shift_remove(&key);
                }
            }
            Flow::Normal
        }
    }
}

fn write_output(
    rt: &mut AwkRuntime,
    program: &Program,
    redirect: Option<&super::ast::OutputRedirect>,
    text: &str,
) {
    match redirect {
        None => rt.emit(text),
        Some(redirect) => {
            let path = eval_expr(rt, program, &redirect.target);
            rt.emit_to_file(&path, text, redirect.kind == RedirectKind::Truncate);
        }
    }
}

/// awk printf: directives consume arguments once (no format cycling).
pub fn render_printf(format: &str, values: &[String]) -> String {
    let mut out = String::new();
    let mut next = 0usize;
    for piece in parse_format(format) {
        match piece {
            FormatPiece::Literal(text) => out.push_str(&text),
            FormatPiece::Directive(directive) => {
                let arg = values.get(next).map(String::as_str).unwrap_or("");
                next += 1;
                out.push_str(&render(&directive, arg));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::awk::parser::parse_program;

    fn run_begin(body: &str) -> AwkRuntime {
        let program = parse_program(&format!("BEGIN {{ {} }}", body)).unwrap();
        let mut rt = AwkRuntime::new();
        let stmts = program.rules[0].action.clone().unwrap();
        exec_block(&mut rt, &program, &stmts);
        rt
    }

    #[test]
    fn test_print_defaults_to_record() {
        let program = parse_program("{ print }").unwrap();
        let mut rt = AwkRuntime::new();
        rt.set_record("the line");
        let stmts = program.rules[0].action.clone().unwrap();
        exec_block(&mut rt, &program, &stmts);
        assert_eq!(rt.output, "the line\n");
    }

    #[test]
    fn test_print_joins_with_ofs() {
        let rt = run_begin("OFS = \"-\"; print \"a\", \"b\", \"c\"");
        assert_eq!(rt.output, "a-b-c\n");
    }

    #[test]
    fn test_print_respects_ors() {
        let rt = run_begin("ORS = \"|\"; print \"x\"; print \"y\"");
        assert_eq!(rt.output, "x|y|");
    }

    #[test]
    fn test_printf_no_cycling() {
        let rt = run_begin("printf \"%s-%s\", \"a\", \"b\"");
        assert_eq!(rt.output, "a-b");
    }

    #[test]
    fn test_printf_formats_numbers() {
        let rt = run_begin("printf \"%05.1f|%d|%x\\n\", 3.14159, 42, 255");
        assert_eq!(rt.output, "003.1|42|ff\n");
    }

    #[test]
    fn test_if_else() {
        let rt = run_begin("if (1 > 2) print \"a\"; else print \"b\"");
        assert_eq!(rt.output, "b\n");
    }

    #[test]
    fn test_while_loop() {
        let rt = run_begin("i = 0; while (i < 3) { print i; i++ }");
        assert_eq!(rt.output, "0\n1\n2\n");
    }

    #[test]
    fn test_do_while_runs_once() {
        let rt = run_begin("i = 10; do { print i } while (i < 5)");
        assert_eq!(rt.output, "10\n");
    }

    #[test]
    fn test_for_loop() {
        let rt = run_begin("for (i = 1; i <= 3; i++) print i");
        assert_eq!(rt.output, "1\n2\n3\n");
    }

    #[test]
    fn test_break_continue() {
        let rt = run_begin("for (i = 0; i < 10; i++) { if (i == 2) continue; if (i == 4) break; print i }");
        assert_eq!(rt.output, "0\n1\n3\n");
    }

    #[test]
    fn test_for_in_insertion_order() {
        let rt = run_begin("a[\"x\"]=1; a[\"y\"]=2; a[\"z\"]=3; for (k in a) print k");
        assert_eq!(rt.output, "x\ny\nz\n");
    }

    #[test]
    fn test_delete_element_and_array() {
        let rt = run_begin("a[1]=1; a[2]=2; delete a[1]; n1 = length(a); delete a; n2 = length(a)");
        assert_eq!(rt.get_var("n1"), "1");
        assert_eq!(rt.get_var("n2"), "0");
    }

    #[test]
    fn test_exit_sets_code_and_flag() {
        let rt = run_begin("print \"before\"; exit 5; print \"after\"");
        assert_eq!(rt.output, "before\n");
        assert_eq!(rt.exit_code, 5);
        assert!(rt.exiting);
    }

    #[test]
    fn test_print_redirect_to_file() {
        let rt = run_begin("print \"data\" > \"out.txt\"");
        assert!(rt.output.is_empty());
        assert_eq!(rt.file_output.get("out.txt").map(|(c, _)| c.as_str()), Some("data\n"));
    }

    #[test]
    fn test_nested_loop_break_is_inner() {
        let rt = run_begin(
            "for (i = 0; i < 2; i++) { for (j = 0; j < 9; j++) { if (j == 1) break; print i, j } }",
        );
        assert_eq!(rt.output, "0 0\n1 0\n");
    }
}
