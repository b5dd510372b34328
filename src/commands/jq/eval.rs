//! jq Evaluation
//!
//! A filter maps one input value to a stream of output values; streams are
//! realized as vectors. Errors abort the whole invocation, except where a
//! trailing `?` asked for them to be swallowed.

use serde_json::{Map, Value};

use super::parser::{number, Filter, JqOp};

pub fn eval(filter: &Filter, input: &Value) -> Result<Vec<Value>, String> {
    match filter {
        Filter::Identity => Ok(vec![input.clone()]),
        Filter::Literal(value) => Ok(vec![value.clone()]),
        Filter::Field { name, optional } => match input {
            Value::Object(map) => Ok(vec![map.get(name).cloned().unwrap_or(Value::Null)]),
            Value::Null => Ok(vec![Value::Null]),
            other => {
                if *optional {
                    Ok(Vec::new())
                } else {
                    Err(format!("Cannot index {} with \"{}\"", type_name(other), name))
                }
            }
        },
        Filter::Index { index, optional } => {
            let mut out = Vec::new();
            for idx in eval(index, input)? {
                match (input, &idx) {
                    (Value::Array(items), Value::Number(n)) => {
                        let i = n.as_f64().unwrap_or(0.0) as i64;
                        let len = items.len() as i64;
                        let resolved = if i < 0 { len + i } else { i };
                        if resolved >= 0 && resolved < len {
                            out.push(items[resolved as usize].clone());
                        } else {
                            out.push(Value::Null);
                        }
                    }
                    (Value::Object(map), Value::String(key)) => {
                        out.push(map.get(key).cloned().unwrap_or(Value::Null));
                    }
                    (Value::Null, _) => out.push(Value::Null),
                    (other, idx) => {
                        if !*optional {
                            return Err(format!(
                                "Cannot index {} with {}",
                                type_name(other),
                                type_name(idx)
                            ));
                        }
                    }
                }
            }
            Ok(out)
        }
        Filter::Iterate { optional } => match input {
            Value::Array(items) => Ok(items.clone()),
            Value::Object(map) => Ok(map.values().cloned().collect()),
            other => {
                if *optional {
                    Ok(Vec::new())
                } else {
                    Err(format!("Cannot iterate over {}", type_name(other)))
                }
            }
        },
        Filter::Pipe(lhs, rhs) => {
            let mut out = Vec::new();
            for value in eval(lhs, input)? {
                out.extend(eval(rhs, &value)?);
            }
            Ok(out)
        }
        Filter::Comma(filters) => {
            let mut out = Vec::new();
            for f in filters {
                out.extend(eval(f, input)?);
            }
            Ok(out)
        }
        Filter::Array(inner) => {
            let items = match inner {
                Some(f) => eval(f, input)?,
                None => Vec::new(),
            };
            Ok(vec![Value::Array(items)])
        }
        Filter::Object(entries) => {
            // Cartesian product over entry value streams.
            let mut results: Vec<Map<String, Value>> = vec![Map::new()];
            for (key, value_filter) in entries {
                let values = match value_filter {
                    Some(f) => eval(f, input)?,
                    None => eval(&Filter::Field { name: key.clone(), optional: false }, input)?,
                };
                let mut next = Vec::new();
                for base in &results {
                    for value in &values {
                        let mut map = base.clone();
                        map.insert(key.clone(), value.clone());
                        next.push(map);
                    }
                }
                results = next;
            }
            Ok(results.into_iter().map(Value::Object).collect())
        }
        Filter::Neg(inner) => {
            let mut out = Vec::new();
            for value in eval(inner, input)? {
                match value.as_f64() {
                    Some(n) => out.push(number(-n)),
                    None => return Err(format!("{} cannot be negated", type_name(&value))),
                }
            }
            Ok(out)
        }
        Filter::BinOp { op, lhs, rhs } => {
            let mut out = Vec::new();
            for l in eval(lhs, input)? {
                for r in eval(rhs, input)? {
                    out.push(binop(*op, &l, &r)?);
                }
            }
            Ok(out)
        }
        Filter::If { cond, then, otherwise } => {
            let mut out = Vec::new();
            for c in eval(cond, input)? {
                if truthy(&c) {
                    out.extend(eval(then, input)?);
                } else if let Some(otherwise) = otherwise {
                    out.extend(eval(otherwise, input)?);
                } else {
                    out.push(input.clone());
                }
            }
            Ok(out)
        }
        Filter::Call { name, args } => call(name, args, input),
    }
}

fn binop(op: JqOp, lhs: &Value, rhs: &Value) -> Result<Value, String> {
    match op {
        JqOp::And => return Ok(Value::Bool(truthy(lhs) && truthy(rhs))),
        JqOp::Or => return Ok(Value::Bool(truthy(lhs) || truthy(rhs))),
        JqOp::Eq => return Ok(Value::Bool(lhs == rhs)),
        JqOp::Ne => return Ok(Value::Bool(lhs != rhs)),
        JqOp::Lt => return Ok(Value::Bool(order(lhs, rhs).is_lt())),
        JqOp::Le => return Ok(Value::Bool(order(lhs, rhs).is_le())),
        JqOp::Gt => return Ok(Value::Bool(order(lhs, rhs).is_gt())),
        JqOp::Ge => return Ok(Value::Bool(order(lhs, rhs).is_ge())),
        _ => {}
    }

    match (op, lhs, rhs) {
        (JqOp::Add, Value::Null, other) | (JqOp::Add, other, Value::Null) => Ok(other.clone()),
        (JqOp::Add, Value::Number(a), Value::Number(b)) => {
            Ok(number(a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0)))
        }
        (JqOp::Add, Value::String(a), Value::String(b)) => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (JqOp::Add, Value::Array(a), Value::Array(b)) => {
            let mut items = a.clone();
            items.extend(b.clone());
            Ok(Value::Array(items))
        }
        (JqOp::Add, Value::Object(a), Value::Object(b)) => {
            let mut map = a.clone();
            for (k, v) in b {
                map.insert(k.clone(), v.clone());
            }
            Ok(Value::Object(map))
        }
        (JqOp::Sub, Value::Number(a), Value::Number(b)) => {
            Ok(number(a.as_f64().unwrap_or(0.0) - b.as_f64().unwrap_or(0.0)))
        }
        (JqOp::Sub, Value::Array(a), Value::Array(b)) => {
            Ok(Value::Array(a.iter().filter(|v| !b.contains(v)).cloned().collect()))
        }
        (JqOp::Mul, Value::Number(a), Value::Number(b)) => {
            Ok(number(a.as_f64().unwrap_or(0.0) * b.as_f64().unwrap_or(0.0)))
        }
        (JqOp::Div, Value::Number(a), Value::Number(b)) => {
            let b = b.as_f64().unwrap_or(0.0);
            if b == 0.0 {
                return Err("cannot divide by zero".to_string());
            }
            Ok(number(a.as_f64().unwrap_or(0.0) / b))
        }
        (JqOp::Div, Value::String(a), Value::String(b)) => Ok(Value::Array(
            a.split(b.as_str()).map(|piece| Value::String(piece.to_string())).collect(),
        )),
        (JqOp::Mod, Value::Number(a), Value::Number(b)) => {
            let b = b.as_f64().unwrap_or(0.0) as i64;
            if b == 0 {
                return Err("cannot mod by zero".to_string());
            }
            Ok(number((a.as_f64().unwrap_or(0.0) as i64 % b) as f64))
        }
        (op, lhs, rhs) => Err(format!(
            "{} and {} cannot be combined with {:?}",
            type_name(lhs),
            type_name(rhs),
            op
        )),
    }
}

/// jq's total order: null < false < true < numbers < strings < arrays <
/// objects.
fn order(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    let rank = |v: &Value| match v {
        Value::Null => 0,
        Value::Bool(false) => 1,
        Value::Bool(true) => 2,
        Value::Number(_) => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    };
    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .unwrap_or(0.0)
                .partial_cmp(&y.as_f64().unwrap_or(0.0))
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Array(x), Value::Array(y)) => {
                for (xv, yv) in x.iter().zip(y.iter()) {
                    let o = order(xv, yv);
                    if o != Ordering::Equal {
                        return o;
                    }
                }
                x.len().cmp(&y.len())
            }
            _ => Ordering::Equal,
        },
        other => other,
    }
}

pub fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn call(name: &str, args: &[Filter], input: &Value) -> Result<Vec<Value>, String> {
    match (name, args.len()) {
        ("empty", 0) => Ok(Vec::new()),
        ("not", 0) => Ok(vec![Value::Bool(!truthy(input))]),
        ("length", 0) => Ok(vec![match input {
            Value::Null => number(0.0),
            Value::String(s) => number(s.chars().count() as f64),
            Value::Array(items) => number(items.len() as f64),
            Value::Object(map) => number(map.len() as f64),
            Value::Number(n) => number(n.as_f64().unwrap_or(0.0).abs()),
            Value::Bool(_) => return Err("boolean has no length".to_string()),
        }]),
        ("type", 0) => Ok(vec![Value::String(type_name(input).to_string())]),
        ("keys", 0) => match input {
            Value::Object(map) => {
                let mut keys: Vec<String> = map.keys().cloned().collect();
                keys.sort();
                Ok(vec![Value::Array(keys.into_iter().map(Value::String).collect())])
            }
            Value::Array(items) => Ok(vec![Value::Array(
                (0..items.len()).map(|i| number(i as f64)).collect(),
            )]),
            other => Err(format!("{} has no keys", type_name(other))),
        },
        ("keys_unsorted", 0) => match input {
            Value::Object(map) => {
                Ok(vec![Value::Array(map.keys().cloned().map(Value::String).collect())])
            }
            other => Err(format!("{} has no keys", type_name(other))),
        },
        ("has", 1) => {
            let mut out = Vec::new();
            for key in eval(&args[0], input)? {
                let present = match (input, &key) {
                    (Value::Object(map), Value::String(k)) => map.contains_key(k),
                    (Value::Array(items), Value::Number(n)) => {
                        let i = n.as_f64().unwrap_or(-1.0);
                        i >= 0.0 && (i as usize) < items.len()
                    }
                    _ => return Err("has: invalid arguments".to_string()),
                };
                out.push(Value::Bool(present));
            }
            Ok(out)
        }
        ("select", 1) => {
            let mut out = Vec::new();
            for verdict in eval(&args[0], input)? {
                if truthy(&verdict) {
                    out.push(input.clone());
                }
            }
            Ok(out)
        }
        ("map", 1) => {
            let Value::Array(items) = input else {
                return Err(format!("Cannot iterate over {}", type_name(input)));
            };
            let mut mapped = Vec::new();
            for item in items {
                mapped.extend(eval(&args[0], item)?);
            }
            Ok(vec![Value::Array(mapped)])
        }
        ("add", 0) => {
            let Value::Array(items) = input else {
                return Err(format!("Cannot iterate over {}", type_name(input)));
            };
            let mut acc = Value::Null;
            for item in items {
                acc = binop(JqOp::Add, &acc, item)?;
            }
            Ok(vec![acc])
        }
        ("join", 1) => {
            let Value::Array(items) = input else {
                return Err(format!("Cannot iterate over {}", type_name(input)));
            };
            let mut out = Vec::new();
            for sep in eval(&args[0], input)? {
                let Value::String(sep) = sep else {
                    return Err("join: separator must be a string".to_string());
                };
                let pieces: Vec<String> = items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        Value::Null => String::new(),
                        other => stringify(other),
                    })
                    .collect();
                out.push(Value::String(pieces.join(&sep)));
            }
            Ok(out)
        }
        ("split", 1) => {
            let Value::String(subject) = input else {
                return Err(format!("split input must be a string, not {}", type_name(input)));
            };
            let mut out = Vec::new();
            for sep in eval(&args[0], input)? {
                let Value::String(sep) = sep else {
                    return Err("split: separator must be a string".to_string());
                };
                out.push(Value::Array(
                    subject.split(sep.as_str()).map(|p| Value::String(p.to_string())).collect(),
                ));
            }
            Ok(out)
        }
        ("tostring", 0) => Ok(vec![Value::String(match input {
            Value::String(s) => s.clone(),
            other => stringify(other),
        })]),
        ("tonumber", 0) => match input {
            Value::Number(_) => Ok(vec![input.clone()]),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(|n| vec![number(n)])
                .map_err(|_| format!("Cannot parse '{}' as number", s)),
            other => Err(format!("Cannot parse {} as number", type_name(other))),
        },
        ("sort", 0) => {
            let Value::Array(items) = input else {
                return Err(format!("{} cannot be sorted", type_name(input)));
            };
            let mut sorted = items.clone();
            sorted.sort_by(|a, b| order(a, b));
            Ok(vec![Value::Array(sorted)])
        }
        ("reverse", 0) => {
            let Value::Array(items) = input else {
                return Err(format!("{} cannot be reversed", type_name(input)));
            };
            Ok(vec![Value::Array(items.iter().rev().cloned().collect())])
        }
        _ => Err(format!("{}/{} is not defined", name, args.len())),
    }
}

/// Compact JSON text of a value (used by tostring/join).
pub fn stringify(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::jq::parser::parse_filter;
    use serde_json::json;

    fn run(filter: &str, input: Value) -> Vec<Value> {
        eval(&parse_filter(filter).unwrap(), &input).unwrap()
    }

    fn run_err(filter: &str, input: Value) -> String {
        eval(&parse_filter(filter).unwrap(), &input).unwrap_err()
    }

    #[test]
    fn test_identity() {
        assert_eq!(run(".", json!({"a": 1})), vec![json!({"a": 1})]);
    }

    #[test]
    fn test_field_access() {
        assert_eq!(run(".a", json!({"a": 42})), vec![json!(42)]);
        assert_eq!(run(".missing", json!({})), vec![Value::Null]);
        assert_eq!(run(".a.b", json!({"a": {"b": "deep"}})), vec![json!("deep")]);
    }

    #[test]
    fn test_field_on_non_object_errors() {
        assert!(run_err(".a", json!(5)).contains("Cannot index"));
        assert!(run(".a?", json!(5)).is_empty());
    }

    #[test]
    fn test_array_index() {
        assert_eq!(run(".[0]", json!([10, 20])), vec![json!(10)]);
        assert_eq!(run(".[-1]", json!([10, 20])), vec![json!(20)]);
        assert_eq!(run(".[9]", json!([10])), vec![Value::Null]);
    }

    #[test]
    fn test_iterate() {
        assert_eq!(run(".[]", json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(run(".[]", json!({"a": 1, "b": 2})), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_pipe_and_comma() {
        assert_eq!(run(".a | .b", json!({"a": {"b": 7}})), vec![json!(7)]);
        assert_eq!(run(".a, .b", json!({"a": 1, "b": 2})), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_array_construction() {
        assert_eq!(run("[.[] | . + 1]", json!([1, 2])), vec![json!([2, 3])]);
    }

    #[test]
    fn test_object_construction() {
        assert_eq!(
            run("{x: .a, y: 2}", json!({"a": 1})),
            vec![json!({"x": 1, "y": 2})]
        );
        assert_eq!(run("{a}", json!({"a": 5, "b": 6})), vec![json!({"a": 5})]);
    }

    #[test]
    fn test_select() {
        assert_eq!(
            run("[.[] | select(. > 2)]", json!([1, 2, 3, 4])),
            vec![json!([3, 4])]
        );
    }

    #[test]
    fn test_keys_and_length() {
        assert_eq!(run("keys", json!({"b": 1, "a": 2})), vec![json!(["a", "b"])]);
        assert_eq!(run("keys_unsorted", json!({"b": 1, "a": 2})), vec![json!(["b", "a"])]);
        assert_eq!(run("length", json!([1, 2, 3])), vec![json!(3)]);
        assert_eq!(run("length", json!("héllo")), vec![json!(5)]);
    }

    #[test]
    fn test_has_and_type() {
        assert_eq!(run("has(\"a\")", json!({"a": 1})), vec![json!(true)]);
        assert_eq!(run("type", json!([1])), vec![json!("array")]);
    }

    #[test]
    fn test_map_add_join_split() {
        assert_eq!(run("map(. * 2)", json!([1, 2])), vec![json!([2, 4])]);
        assert_eq!(run("add", json!([1, 2, 3])), vec![json!(6)]);
        assert_eq!(run("join(\"-\")", json!(["a", "b"])), vec![json!("a-b")]);
        assert_eq!(run("split(\",\")", json!("a,b")), vec![json!(["a", "b"])]);
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run(". + 1", json!(2)), vec![json!(3)]);
        assert_eq!(run("\"a\" + \"b\"", json!(null)), vec![json!("ab")]);
        assert_eq!(run("[1] + [2]", json!(null)), vec![json!([1, 2])]);
        assert_eq!(run("10 / 4", json!(null)), vec![json!(2.5)]);
        assert_eq!(run("7 % 3", json!(null)), vec![json!(1)]);
    }

    #[test]
    fn test_division_by_zero_errors() {
        assert!(run_err("1 / 0", json!(null)).contains("zero"));
    }

    #[test]
    fn test_comparisons_and_ordering() {
        assert_eq!(run(". == 5", json!(5)), vec![json!(true)]);
        assert_eq!(run("2 < 10", json!(null)), vec![json!(true)]);
        assert_eq!(run("\"abc\" < \"abd\"", json!(null)), vec![json!(true)]);
        // null sorts before everything
        assert_eq!(run("null < 0", json!(null)), vec![json!(true)]);
    }

    #[test]
    fn test_if_else() {
        assert_eq!(run("if . > 2 then \"big\" else \"small\" end", json!(5)), vec![json!("big")]);
        assert_eq!(run("if . > 2 then \"big\" else \"small\" end", json!(1)), vec![json!("small")]);
    }

    #[test]
    fn test_tostring_tonumber() {
        assert_eq!(run("tostring", json!([1, 2])), vec![json!("[1,2]")]);
        assert_eq!(run("tonumber", json!("42")), vec![json!(42)]);
    }

    #[test]
    fn test_sort_reverse() {
        assert_eq!(run("sort", json!([3, 1, 2])), vec![json!([1, 2, 3])]);
        assert_eq!(run("reverse", json!([1, 2])), vec![json!([2, 1])]);
    }

    #[test]
    fn test_empty() {
        assert!(run("empty", json!(1)).is_empty());
    }

    #[test]
    fn test_undefined_function() {
        assert!(run_err("frobnicate", json!(1)).contains("not defined"));
    }
}
