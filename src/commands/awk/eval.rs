//! AWK Expression Evaluation
//!
//! One recursive function over the expression AST with the runtime
//! threaded through. Values are strings; numeric operators go through the
//! coercion helpers. Division by zero yields 0 by contract.

use indexmap::IndexMap;

use crate::commands::grep::translate_posix_classes;

use super::ast::{AssignOp, BinOp, Expr, Program, UnOp};
use super::builtins;
use super::runtime::{AwkRuntime, Frame};
use super::stmt::{exec_block, Flow};
use super::value::{bool_val, compare, is_truthy, num_to_str, to_num};

pub fn eval_expr(rt: &mut AwkRuntime, program: &Program, expr: &Expr) -> String {
    if rt.exiting {
        return String::new();
    }
    match expr {
        Expr::Num(value) => num_to_str(*value),
        Expr::Str(value) => value.clone(),
        Expr::Regex(re) => {
            // A bare regex matches against the current record.
            let record = rt.get_field(0);
            bool_val(regex_matches(rt, re, &record))
        }
        Expr::Field(index) => {
            let index = to_num(&eval_expr(rt, program, index));
            if index < 0.0 {
                rt.fail("attempt to access field with negative index");
                return String::new();
            }
            rt.get_field(index as usize)
        }
        Expr::Var(name) => rt.get_var(name),
        Expr::Index { array, subscripts } => {
            let key = eval_subscripts(rt, program, subscripts);
            rt.array_get(array, &key)
        }
        Expr::Unary { op, operand } => {
            let value = eval_expr(rt, program, operand);
            match op {
                UnOp::Neg => num_to_str(-to_num(&value)),
                UnOp::Pos => num_to_str(to_num(&value)),
                UnOp::Not => bool_val(!is_truthy(&value)),
            }
        }
        Expr::Binary { op, lhs, rhs } => eval_binary(rt, program, *op, lhs, rhs),
        Expr::Concat { lhs, rhs } => {
            let mut out = eval_expr(rt, program, lhs);
            out.push_str(&eval_expr(rt, program, rhs));
            out
        }
        Expr::Ternary { cond, yes, no } => {
            if is_truthy(&eval_expr(rt, program, cond)) {
                eval_expr(rt, program, yes)
            } else {
                eval_expr(rt, program, no)
            }
        }
        Expr::PreIncr(target) => step_lvalue(rt, program, target, 1.0, true),
        Expr::PreDecr(target) => step_lvalue(rt, program, target, -1.0, true),
        Expr::PostIncr(target) => step_lvalue(rt, program, target, 1.0, false),
        Expr::PostDecr(target) => step_lvalue(rt, program, target, -1.0, false),
        Expr::Assign { op, target, value } => {
            let rhs = eval_expr(rt, program, value);
            let new_value = match op {
                AssignOp::Set => rhs,
                compound => {
                    let current = to_num(&read_lvalue(rt, program, target));
                    let operand = to_num(&rhs);
                    let result = match compound {
                        AssignOp::Add => current + operand,
                        AssignOp::Sub => current - operand,
                        AssignOp::Mul => current * operand,
                        AssignOp::Div => safe_div(current, operand),
                        AssignOp::Mod => safe_mod(current, operand),
                        AssignOp::Pow => current.powf(operand),
                        AssignOp::Set => unreachable!(),
                    };
                    num_to_str(result)
                }
            };
            write_lvalue(rt, program, target, new_value.clone());
            new_value
        }
        Expr::In { subscripts, array } => {
            let key = eval_subscripts(rt, program, subscripts);
            bool_val(rt.array_has(array, &key))
        }
        Expr::Getline { var } => {
            if rt.input_pos >= rt.input.len() {
                return "0".to_string();
            }
            let line = rt.input[rt.input_pos].clone();
            rt.input_pos += 1;
            rt.nr += 1;
            match var {
                Some(name) => rt.set_var(name, line),
                None => rt.set_record(&line),
            }
            "1".to_string()
        }
        Expr::Call { name, args } => eval_call(rt, program, name, args),
    }
}

fn eval_binary(rt: &mut AwkRuntime, program: &Program, op: BinOp, lhs: &Expr, rhs: &Expr) -> String {
    match op {
        BinOp::And => {
            if !is_truthy(&eval_expr(rt, program, lhs)) {
                return "0".to_string();
            }
            return bool_val(is_truthy(&eval_expr(rt, program, rhs)));
        }
        BinOp::Or => {
            if is_truthy(&eval_expr(rt, program, lhs)) {
                return "1".to_string();
            }
            return bool_val(is_truthy(&eval_expr(rt, program, rhs)));
        }
        BinOp::Match | BinOp::NotMatch => {
            let subject = eval_expr(rt, program, lhs);
            let pattern = match rhs {
                Expr::Regex(re) => re.clone(),
                other => eval_expr(rt, program, other),
            };
            let matched = regex_matches(rt, &pattern, &subject);
            return bool_val(matched == (op == BinOp::Match));
        }
        _ => {}
    }

    let a = eval_expr(rt, program, lhs);
    let b = eval_expr(rt, program, rhs);
    match op {
        BinOp::Add => num_to_str(to_num(&a) + to_num(&b)),
        BinOp::Sub => num_to_str(to_num(&a) - to_num(&b)),
        BinOp::Mul => num_to_str(to_num(&a) * to_num(&b)),
        BinOp::Div => num_to_str(safe_div(to_num(&a), to_num(&b))),
        BinOp::Mod => num_to_str(safe_mod(to_num(&a), to_num(&b))),
        BinOp::Pow => num_to_str(to_num(&a).powf(to_num(&b))),
        BinOp::Lt => bool_val(compare(&a, &b).is_lt()),
        BinOp::Le => bool_val(compare(&a, &b).is_le()),
        BinOp::Gt => bool_val(compare(&a, &b).is_gt()),
        BinOp::Ge => bool_val(compare(&a, &b).is_ge()),
        BinOp::Eq => bool_val(compare(&a, &b).is_eq()),
        BinOp::Ne => bool_val(compare(&a, &b).is_ne()),
        BinOp::And | BinOp::Or | BinOp::Match | BinOp::NotMatch => unreachable!(),
    }
}

/// Division by zero yields 0 by the engine contract.
fn safe_div(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

fn safe_mod(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a % b
    }
}

pub fn regex_matches(rt: &mut AwkRuntime, pattern: &str, subject: &str) -> bool {
    match compile_regex(pattern) {
        Ok(re) => re.is_match(subject),
        Err(message) => {
            rt.fail(message);
            false
        }
    }
}

pub fn compile_regex(pattern: &str) -> Result<regex_lite::Regex, String> {
    regex_lite::Regex::new(&translate_posix_classes(pattern))
        .map_err(|_| format!("invalid regex: /{}/", pattern))
}

pub fn eval_subscripts(rt: &mut AwkRuntime, program: &Program, subscripts: &[Expr]) -> String {
    let parts: Vec<String> = subscripts.iter().map(|s| eval_expr(rt, program, s)).collect();
    rt.subscript_key(&parts)
}

pub fn read_lvalue(rt: &mut AwkRuntime, program: &Program, target: &Expr) -> String {
    match target {
        Expr::Var(name) => rt.get_var(name),
        Expr::Field(index) => {
            let index = to_num(&eval_expr(rt, program, index)).max(0.0) as usize;
            rt.get_field(index)
        }
        Expr::Index { array, subscripts } => {
            let key = eval_subscripts(rt, program, subscripts);
            rt.array_get(array, &key)
        }
        _ => String::new(),
    }
}

pub fn write_lvalue(rt: &mut AwkRuntime, program: &Program, target: &Expr, value: String) {
    match target {
        Expr::Var(name) => rt.set_var(name, value),
        Expr::Field(index) => {
            let index = to_num(&eval_expr(rt, program, index)).max(0.0) as usize;
            rt.set_field(index, value);
        }
        Expr::Index { array, subscripts } => {
            let key = eval_subscripts(rt, program, subscripts);
            rt.array_set(array, key, value);
        }
        _ => {}
    }
}

fn step_lvalue(
    rt: &mut AwkRuntime,
    program: &Program,
    target: &Expr,
    delta: f64,
    pre: bool,
) -> String {
    let old = to_num(&read_lvalue(rt, program, target));
    let new = old + delta;
    write_lvalue(rt, program, target, num_to_str(new));
    num_to_str(if pre { new } else { old })
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

fn eval_call(rt: &mut AwkRuntime, program: &Program, name: &str, args: &[Expr]) -> String {
    // Builtins that need AST access (lvalues, array names, regex literals).
    match name {
        "sub" | "gsub" => return eval_substitute(rt, program, name == "gsub", args),
        "match" => return eval_match_fn(rt, program, args),
        "split" => return eval_split(rt, program, args),
        "length" => return eval_length(rt, program, args),
        _ => {}
    }

    if builtins::is_builtin(name) {
        let values: Vec<String> = args.iter().map(|a| eval_expr(rt, program, a)).collect();
        return builtins::call(rt, name, &values);
    }

    let Some(def) = program.functions.iter().find(|f| f.name == name).cloned() else {
        rt.fail(format!("calling undefined function {}", name));
        return String::new();
    };
    call_function(rt, program, &def, args)
}

fn call_function(
    rt: &mut AwkRuntime,
    program: &Program,
    def: &super::ast::FunctionDef,
    args: &[Expr],
) -> String {
    if rt.at_call_depth_limit() {
        rt.fail(format!("function {}: recursion limit reached", def.name));
        return String::new();
    }

    // Evaluate scalar arguments before entering the new scope.
    let mut scalar_args: Vec<Option<String>> = Vec::with_capacity(def.params.len());
    let mut aliases: IndexMap<String, String> = IndexMap::new();
    let mut local_arrays: Vec<String> = Vec::new();

    for (i, param) in def.params.iter().enumerate() {
        match args.get(i) {
            Some(Expr::Var(arg_name)) if rt.arrays.contains_key(&rt.resolve_array(arg_name)) => {
                aliases.insert(param.clone(), rt.resolve_array(arg_name));
                scalar_args.push(None);
            }
            Some(expr) => scalar_args.push(Some(eval_expr(rt, program, expr))),
            None => {
                // Extra params are locals; give each a private array in
                // case the body uses it as one.
                let hidden = format!("__local_{}_{}", rt.frames.len(), param);
                aliases.insert(param.clone(), hidden.clone());
                local_arrays.push(hidden);
                scalar_args.push(Some(String::new()));
            }
        }
    }

    let mut saved_scalars = Vec::new();
    for (param, value) in def.params.iter().zip(&scalar_args) {
        if let Some(value) = value {
            saved_scalars.push((param.clone(), rt.vars.get(param).cloned()));
            rt.vars.insert(param.clone(), value.clone());
        }
    }

    rt.frames.push(Frame { saved_scalars, array_aliases: aliases, local_arrays });

    let flow = exec_block(rt, program, &def.body);
    let result = match flow {
        Flow::Return(value) => value,
        _ => String::new(),
    };

    let frame = rt.frames.pop().expect("frame pushed above");
    for (param, shadowed) in frame.saved_scalars {
        match shadowed {
            Some(value) => {
                rt.vars.insert(param, value);
            }
            None => {
                rt.vars.shift_remove(&param);
            }
        }
    }
    for hidden in frame.local_arrays {
        rt.arrays.shift_remove(&hidden);
    }
    result
}

// -- the AST-aware builtins --------------------------------------------------

/// `sub(re, repl [, target])` / `gsub`: modify the target in place and
/// return the replacement count. `&` in the replacement is the match.
fn eval_substitute(rt: &mut AwkRuntime, program: &Program, global: bool, args: &[Expr]) -> String {
    if args.len() < 2 {
        rt.fail("sub/gsub: expected 2 or 3 arguments");
        return String::new();
    }
    let pattern = match &args[0] {
        Expr::Regex(re) => re.clone(),
        other => eval_expr(rt, program, other),
    };
    let replacement = eval_expr(rt, program, &args[1]);
    let default_target = Expr::Field(Box::new(Expr::Num(0.0)));
    let target = args.get(2).unwrap_or(&default_target);

    let re = match compile_regex(&pattern) {
        Ok(re) => re,
        Err(message) => {
            rt.fail(message);
            return String::new();
        }
    };

    let subject = read_lvalue(rt, program, target);
    let mut out = String::new();
    let mut count = 0usize;
    let mut last = 0usize;
    for m in re.find_iter(&subject) {
        if !global && count == 1 {
            break;
        }
        out.push_str(&subject[last..m.start()]);
        out.push_str(&expand_replacement(&replacement, m.as_str()));
        last = m.end();
        count += 1;
        // An empty match must still advance.
        if m.start() == m.end() && last < subject.len() {
            let next = subject[last..].chars().next().unwrap();
            out.push(next);
            last += next.len_utf8();
        }
        if !global {
            break;
        }
    }
    out.push_str(&subject[last..]);

    if count > 0 {
        write_lvalue(rt, program, target, out);
    }
    count.to_string()
}

/// `&` expands to the match, `\&` is a literal ampersand.
fn expand_replacement(replacement: &str, matched: &str) -> String {
    let mut out = String::new();
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some('&') => {
                    out.push('&');
                    chars.next();
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                _ => out.push('\\'),
            },
            '&' => out.push_str(matched),
            other => out.push(other),
        }
    }
    out
}

/// `match(s, re)`: sets RSTART/RLENGTH, returns RSTART (0 when no match).
fn eval_match_fn(rt: &mut AwkRuntime, program: &Program, args: &[Expr]) -> String {
    if args.len() != 2 {
        rt.fail("match: expected 2 arguments");
        return String::new();
    }
    let subject = eval_expr(rt, program, &args[0]);
    let pattern = match &args[1] {
        Expr::Regex(re) => re.clone(),
        other => eval_expr(rt, program, other),
    };
    let re = match compile_regex(&pattern) {
        Ok(re) => re,
        Err(message) => {
            rt.fail(message);
            return String::new();
        }
    };
    match re.find(&subject) {
        Some(m) => {
            let start = subject[..m.start()].chars().count() + 1;
            rt.rstart = start;
            rt.rlength = m.as_str().chars().count() as i64;
            start.to_string()
        }
        None => {
            rt.rstart = 0;
            rt.rlength = -1;
            "0".to_string()
        }
    }
}

/// `split(s, arr [, fs])`: fills `arr[1..n]`, returns n.
fn eval_split(rt: &mut AwkRuntime, program: &Program, args: &[Expr]) -> String {
    if args.len() < 2 {
        rt.fail("split: expected 2 or 3 arguments");
        return String::new();
    }
    let subject = eval_expr(rt, program, &args[0]);
    let Expr::Var(array_name) = &args[1] else {
        rt.fail("split: second argument must be an array");
        return String::new();
    };
    let sep = match args.get(2) {
        Some(Expr::Regex(re)) => re.clone(),
        Some(other) => eval_expr(rt, program, other),
        None => rt.fs.clone(),
    };

    let pieces: Vec<String> = if subject.is_empty() {
        Vec::new()
    } else if sep == " " {
        subject.split_whitespace().map(String::from).collect()
    } else {
        let re = super::runtime::field_separator_regex(&sep);
        re.split(&subject).map(String::from).collect()
    };

    let actual = rt.resolve_array(array_name);
    rt.arrays.insert(actual.clone(), IndexMap::new());
    let n = pieces.len();
    for (i, piece) in pieces.into_iter().enumerate() {
        rt.arrays
            .get_mut(&actual)
            .expect("array created above")
            .insert((i + 1).to_string(), piece);
    }
    n.to_string()
}

/// `length`, `length($0)`, `length(arr)`.
fn eval_length(rt: &mut AwkRuntime, program: &Program, args: &[Expr]) -> String {
    match args.first() {
        None => rt.get_field(0).chars().count().to_string(),
        Some(Expr::Var(name)) if rt.arrays.contains_key(&rt.resolve_array(name)) => {
            let actual = rt.resolve_array(name);
            rt.arrays[&actual].len().to_string()
        }
        Some(expr) => eval_expr(rt, program, expr).chars().count().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::awk::parser::parse_program;
    use crate::commands::awk::stmt::exec_block;

    /// Run `BEGIN { ... }` style statements and return the runtime.
    fn run_begin(body: &str) -> AwkRuntime {
        let program = parse_program(&format!("BEGIN {{ {} }}", body)).unwrap();
        let mut rt = AwkRuntime::new();
        let stmts = program.rules[0].action.clone().unwrap();
        exec_block(&mut rt, &program, &stmts);
        rt
    }

    #[test]
    fn test_arithmetic_and_coercion() {
        let rt = run_begin("x = \"3\" + 4; y = \"2abc\" * 2");
        assert_eq!(rt.get_var("x"), "7");
        assert_eq!(rt.get_var("y"), "4");
    }

    #[test]
    fn test_division_by_zero_yields_zero() {
        let rt = run_begin("x = 1 / 0; y = 5 % 0");
        assert_eq!(rt.get_var("x"), "0");
        assert_eq!(rt.get_var("y"), "0");
    }

    #[test]
    fn test_string_concat() {
        let rt = run_begin("x = \"a\" \"b\" 3");
        assert_eq!(rt.get_var("x"), "ab3");
    }

    #[test]
    fn test_comparisons_mixed_type() {
        let rt = run_begin("a = (\"9\" < \"10\"); b = (\"9a\" < \"10a\")");
        assert_eq!(rt.get_var("a"), "1", "numeric-looking strings compare numerically");
        assert_eq!(rt.get_var("b"), "0", "non-numeric strings compare lexicographically");
    }

    #[test]
    fn test_logical_short_circuit() {
        let rt = run_begin("x = (0 && (y = 5)); z = (1 || (w = 5))");
        assert_eq!(rt.get_var("x"), "0");
        assert_eq!(rt.get_var("y"), "", "rhs of && not evaluated");
        assert_eq!(rt.get_var("z"), "1");
        assert_eq!(rt.get_var("w"), "");
    }

    #[test]
    fn test_increment_decrement() {
        let rt = run_begin("i = 5; a = i++; b = ++i; c = i--");
        assert_eq!(rt.get_var("a"), "5");
        assert_eq!(rt.get_var("b"), "7");
        assert_eq!(rt.get_var("c"), "7");
        assert_eq!(rt.get_var("i"), "6");
    }

    #[test]
    fn test_array_access_and_in() {
        let rt = run_begin("a[\"k\"] = 1; x = (\"k\" in a); y = (\"q\" in a)");
        assert_eq!(rt.get_var("x"), "1");
        assert_eq!(rt.get_var("y"), "0");
    }

    #[test]
    fn test_multi_subscript_uses_subsep() {
        let rt = run_begin("a[1, 2] = \"v\"; x = ((1, 2) in a)");
        assert_eq!(rt.get_var("x"), "1");
        assert!(rt.arrays["a"].contains_key("1\u{1c}2"));
    }

    #[test]
    fn test_ternary() {
        let rt = run_begin("x = 1 ? \"yes\" : \"no\"");
        assert_eq!(rt.get_var("x"), "yes");
    }

    #[test]
    fn test_match_operator() {
        let mut rt = AwkRuntime::new();
        rt.set_record("hello world");
        let program = parse_program("{ x = ($0 ~ /wor/); y = ($0 !~ /xyz/) }").unwrap();
        let stmts = program.rules[0].action.clone().unwrap();
        exec_block(&mut rt, &program, &stmts);
        assert_eq!(rt.get_var("x"), "1");
        assert_eq!(rt.get_var("y"), "1");
    }

    #[test]
    fn test_sub_and_gsub() {
        let rt = run_begin("s = \"aaa\"; n = gsub(/a/, \"b\", s); t = \"aaa\"; m = sub(/a/, \"b\", t)");
        assert_eq!(rt.get_var("s"), "bbb");
        assert_eq!(rt.get_var("n"), "3");
        assert_eq!(rt.get_var("t"), "baa");
        assert_eq!(rt.get_var("m"), "1");
    }

    #[test]
    fn test_gsub_ampersand() {
        let rt = run_begin("s = \"ab\"; gsub(/b/, \"[&]\", s)");
        assert_eq!(rt.get_var("s"), "a[b]");
    }

    #[test]
    fn test_match_function_sets_rstart_rlength() {
        let rt = run_begin("p = match(\"foobar\", /oba/)");
        assert_eq!(rt.get_var("p"), "3");
        assert_eq!(rt.rstart, 3);
        assert_eq!(rt.rlength, 3);

        let rt = run_begin("p = match(\"abc\", /xyz/)");
        assert_eq!(rt.get_var("p"), "0");
        assert_eq!(rt.rlength, -1);
    }

    #[test]
    fn test_split() {
        let rt = run_begin("n = split(\"a:b:c\", parts, \":\")");
        assert_eq!(rt.get_var("n"), "3");
        assert_eq!(rt.array_get("parts", "1"), "a");
        assert_eq!(rt.array_get("parts", "3"), "c");
    }

    #[test]
    fn test_length_variants() {
        let rt = run_begin("a[1]=1; a[2]=2; x = length(\"hello\"); y = length(a)");
        assert_eq!(rt.get_var("x"), "5");
        assert_eq!(rt.get_var("y"), "2");
    }

    #[test]
    fn test_user_function_call() {
        let program = parse_program("function double(x) { return x * 2 } BEGIN { r = double(21) }")
            .unwrap();
        let mut rt = AwkRuntime::new();
        let stmts = program.rules[0].action.clone().unwrap();
        exec_block(&mut rt, &program, &stmts);
        assert_eq!(rt.get_var("r"), "42");
    }

    #[test]
    fn test_function_params_are_local() {
        let program = parse_program(
            "function f(x, tmp) { tmp = x + 1; return tmp } BEGIN { tmp = \"outer\"; r = f(1) }",
        )
        .unwrap();
        let mut rt = AwkRuntime::new();
        let stmts = program.rules[0].action.clone().unwrap();
        exec_block(&mut rt, &program, &stmts);
        assert_eq!(rt.get_var("r"), "2");
        assert_eq!(rt.get_var("tmp"), "outer");
    }

    #[test]
    fn test_array_passed_by_reference() {
        let program = parse_program(
            "function fill(arr) { arr[\"k\"] = \"v\" } BEGIN { a[\"seed\"] = 1; fill(a); r = a[\"k\"] }",
        )
        .unwrap();
        let mut rt = AwkRuntime::new();
        let stmts = program.rules[0].action.clone().unwrap();
        exec_block(&mut rt, &program, &stmts);
        assert_eq!(rt.get_var("r"), "v");
    }

    #[test]
    fn test_getline_advances() {
        let program = parse_program("{ getline; x = $0 }").unwrap();
        let mut rt = AwkRuntime::new();
        rt.input = vec!["one".to_string(), "two".to_string()];
        rt.input_pos = 1;
        rt.set_record("one");
        rt.nr = 1;
        let stmts = program.rules[0].action.clone().unwrap();
        exec_block(&mut rt, &program, &stmts);
        assert_eq!(rt.get_var("x"), "two");
        assert_eq!(rt.nr, 2);
    }

    #[test]
    fn test_undefined_function_fails() {
        let rt = run_begin("nope(1)");
        assert!(rt.runtime_error.is_some());
    }
}
