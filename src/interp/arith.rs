//! Arithmetic Evaluation
//!
//! Evaluates [`ArithExpr`] over 64-bit integers, reading and writing shell
//! variables. Variables that do not parse as integers read as 0.

use crate::ast::{ArithBinaryOp, ArithExpr, ArithUnaryOp};

use super::state::ShellState;

pub fn eval_arith(state: &mut ShellState, expr: &ArithExpr) -> Result<i64, String> {
    match expr {
        ArithExpr::Number(n) => Ok(*n),
        ArithExpr::Var(name) => Ok(read_var(state, name)),
        ArithExpr::Unary { op, operand } => {
            let v = eval_arith(state, operand)?;
            Ok(match op {
                ArithUnaryOp::Neg => v.wrapping_neg(),
                ArithUnaryOp::Pos => v,
                ArithUnaryOp::Not => i64::from(v == 0),
                ArithUnaryOp::BitNot => !v,
            })
        }
        ArithExpr::Binary { op, left, right } => {
            // Logical operators short-circuit.
            match op {
                ArithBinaryOp::LogAnd => {
                    if eval_arith(state, left)? == 0 {
                        return Ok(0);
                    }
                    return Ok(i64::from(eval_arith(state, right)? != 0));
                }
                ArithBinaryOp::LogOr => {
                    if eval_arith(state, left)? != 0 {
                        return Ok(1);
                    }
                    return Ok(i64::from(eval_arith(state, right)? != 0));
                }
                _ => {}
            }
            let a = eval_arith(state, left)?;
            let b = eval_arith(state, right)?;
            apply_binary(*op, a, b)
        }
        ArithExpr::Ternary { cond, then, otherwise } => {
            if eval_arith(state, cond)? != 0 {
                eval_arith(state, then)
            } else {
                eval_arith(state, otherwise)
            }
        }
        ArithExpr::Assign { name, op, value } => {
            let rhs = eval_arith(state, value)?;
            let result = match op {
                None => rhs,
                Some(op) => apply_binary(*op, read_var(state, name), rhs)?,
            };
            state.set_var(name, result.to_string());
            Ok(result)
        }
        ArithExpr::PreIncrement(name) => {
            let v = read_var(state, name).wrapping_add(1);
            state.set_var(name, v.to_string());
            Ok(v)
        }
        ArithExpr::PreDecrement(name) => {
            let v = read_var(state, name).wrapping_sub(1);
            state.set_var(name, v.to_string());
            Ok(v)
        }
        ArithExpr::PostIncrement(name) => {
            let v = read_var(state, name);
            state.set_var(name, v.wrapping_add(1).to_string());
            Ok(v)
        }
        ArithExpr::PostDecrement(name) => {
            let v = read_var(state, name);
            state.set_var(name, v.wrapping_sub(1).to_string());
            Ok(v)
        }
        ArithExpr::Sequence(exprs) => {
            let mut last = 0;
            for e in exprs {
                last = eval_arith(state, e)?;
            }
            Ok(last)
        }
    }
}

fn apply_binary(op: ArithBinaryOp, a: i64, b: i64) -> Result<i64, String> {
    Ok(match op {
        ArithBinaryOp::Add => a.wrapping_add(b),
        ArithBinaryOp::Sub => a.wrapping_sub(b),
        ArithBinaryOp::Mul => a.wrapping_mul(b),
        ArithBinaryOp::Div => {
            if b == 0 {
                return Err("division by 0".to_string());
            }
            a.wrapping_div(b)
        }
        ArithBinaryOp::Mod => {
            if b == 0 {
                return Err("division by 0".to_string());
            }
            a.wrapping_rem(b)
        }
        ArithBinaryOp::Pow => {
            if b < 0 {
                return Err("exponent less than 0".to_string());
            }
            let mut result: i64 = 1;
            for _ in 0..b {
                result = result.wrapping_mul(a);
            }
            result
        }
        ArithBinaryOp::Shl => a.wrapping_shl(b as u32),
        ArithBinaryOp::Shr => a.wrapping_shr(b as u32),
        ArithBinaryOp::Lt => i64::from(a < b),
        ArithBinaryOp::Le => i64::from(a <= b),
        ArithBinaryOp::Gt => i64::from(a > b),
        ArithBinaryOp::Ge => i64::from(a >= b),
        ArithBinaryOp::Eq => i64::from(a == b),
        ArithBinaryOp::Ne => i64::from(a != b),
        ArithBinaryOp::BitAnd => a & b,
        ArithBinaryOp::BitXor => a ^ b,
        ArithBinaryOp::BitOr => a | b,
        ArithBinaryOp::LogAnd | ArithBinaryOp::LogOr => unreachable!("short-circuited above"),
    })
}

/// Read a variable as an integer; 0x/0 prefixes honored, garbage reads 0.
fn read_var(state: &ShellState, name: &str) -> i64 {
    let Some(raw) = state.get_var(name) else { return 0 };
    let text = raw.trim();
    let (neg, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).unwrap_or(0)
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).unwrap_or(0)
    } else {
        digits.parse::<i64>().unwrap_or(0)
    };
    if neg {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use crate::parser::arith::parse_arith;
    use std::sync::Arc;

    fn eval(state: &mut ShellState, text: &str) -> Result<i64, String> {
        let expr = parse_arith(text, 1).map_err(|e| e.to_string())?;
        eval_arith(state, &expr)
    }

    fn state() -> ShellState {
        ShellState::new(Arc::new(InMemoryFs::new()))
    }

    #[test]
    fn test_precedence() {
        let mut st = state();
        assert_eq!(eval(&mut st, "1 + 2 * 3").unwrap(), 7);
        assert_eq!(eval(&mut st, "(1 + 2) * 3").unwrap(), 9);
    }

    #[test]
    fn test_variables_default_zero() {
        let mut st = state();
        assert_eq!(eval(&mut st, "missing + 1").unwrap(), 1);
        st.set_var("x", "5");
        assert_eq!(eval(&mut st, "x * 2").unwrap(), 10);
        st.set_var("junk", "hello");
        assert_eq!(eval(&mut st, "junk + 3").unwrap(), 3);
    }

    #[test]
    fn test_hex_octal_variables() {
        let mut st = state();
        st.set_var("h", "0xff");
        st.set_var("o", "010");
        assert_eq!(eval(&mut st, "h").unwrap(), 255);
        assert_eq!(eval(&mut st, "o").unwrap(), 8);
    }

    #[test]
    fn test_assignment_writes_back() {
        let mut st = state();
        assert_eq!(eval(&mut st, "x = 3").unwrap(), 3);
        assert_eq!(st.get_var("x"), Some("3"));
        assert_eq!(eval(&mut st, "x += 4").unwrap(), 7);
        assert_eq!(st.get_var("x"), Some("7"));
    }

    #[test]
    fn test_increments() {
        let mut st = state();
        st.set_var("i", "5");
        assert_eq!(eval(&mut st, "i++").unwrap(), 5);
        assert_eq!(st.get_var("i"), Some("6"));
        assert_eq!(eval(&mut st, "++i").unwrap(), 7);
    }

    #[test]
    fn test_division_by_zero() {
        let mut st = state();
        assert!(eval(&mut st, "1 / 0").is_err());
        assert!(eval(&mut st, "1 % 0").is_err());
    }

    #[test]
    fn test_power() {
        let mut st = state();
        assert_eq!(eval(&mut st, "2 ** 10").unwrap(), 1024);
        assert!(eval(&mut st, "2 ** -1").is_err());
    }

    #[test]
    fn test_logical_short_circuit() {
        let mut st = state();
        // The right side would divide by zero; && must not evaluate it.
        assert_eq!(eval(&mut st, "0 && (1 / 0)").unwrap(), 0);
        assert_eq!(eval(&mut st, "1 || (1 / 0)").unwrap(), 1);
    }

    #[test]
    fn test_ternary() {
        let mut st = state();
        assert_eq!(eval(&mut st, "1 ? 10 : 20").unwrap(), 10);
        assert_eq!(eval(&mut st, "0 ? 10 : 20").unwrap(), 20);
    }

    #[test]
    fn test_comparisons_and_bitops() {
        let mut st = state();
        assert_eq!(eval(&mut st, "3 < 5").unwrap(), 1);
        assert_eq!(eval(&mut st, "3 >= 5").unwrap(), 0);
        assert_eq!(eval(&mut st, "6 & 3").unwrap(), 2);
        assert_eq!(eval(&mut st, "6 | 3").unwrap(), 7);
        assert_eq!(eval(&mut st, "6 ^ 3").unwrap(), 5);
        assert_eq!(eval(&mut st, "1 << 4").unwrap(), 16);
    }

    #[test]
    fn test_comma_sequence() {
        let mut st = state();
        assert_eq!(eval(&mut st, "x = 1, x + 10").unwrap(), 11);
    }
}
