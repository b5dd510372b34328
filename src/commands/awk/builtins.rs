//! AWK Built-in Functions
//!
//! The value-in/value-out builtins. The ones that need AST access
//! (`sub`/`gsub`, `match`, `split`, `length`) live with the evaluator.

use rand::{Rng, SeedableRng};

use super::runtime::AwkRuntime;
use super::stmt::render_printf;
use super::value::{num_to_str, to_num};

pub fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "substr"
            | "tolower"
            | "toupper"
            | "index"
            | "sprintf"
            | "int"
            | "sqrt"
            | "sin"
            | "cos"
            | "exp"
            | "log"
            | "atan2"
            | "rand"
            | "srand"
    )
}

pub fn call(rt: &mut AwkRuntime, name: &str, args: &[String]) -> String {
    let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or("");
    match name {
        "substr" => {
            let chars: Vec<char> = arg(0).chars().collect();
            let m = to_num(arg(1));
            // Positions are 1-based; out-of-range prefixes clamp.
            let start = (m.max(1.0) as usize).saturating_sub(1);
            let adjust = if m < 1.0 { (1.0 - m) as usize } else { 0 };
            match args.get(2) {
                Some(len_arg) => {
                    let wanted = to_num(len_arg).max(0.0) as usize;
                    let wanted = wanted.saturating_sub(adjust);
                    chars.iter().skip(start).take(wanted).collect()
                }
                None => chars.iter().skip(start).collect(),
            }
        }
        "tolower" => arg(0).to_lowercase(),
        "toupper" => arg(0).to_uppercase(),
        "index" => {
            let haystack = arg(0);
            let needle = arg(1);
            match haystack.find(needle) {
                Some(byte_pos) => (haystack[..byte_pos].chars().count() + 1).to_string(),
                None => "0".to_string(),
            }
        }
        "sprintf" => render_printf(arg(0), &args[1..]),
        "int" => num_to_str(to_num(arg(0)).trunc()),
        "sqrt" => num_to_str(to_num(arg(0)).sqrt()),
        "sin" => num_to_str(to_num(arg(0)).sin()),
        "cos" => num_to_str(to_num(arg(0)).cos()),
        "exp" => num_to_str(to_num(arg(0)).exp()),
        "log" => num_to_str(to_num(arg(0)).ln()),
        "atan2" => num_to_str(to_num(arg(0)).atan2(to_num(arg(1)))),
        "rand" => {
            let value: f64 = rt.rng.gen_range(0.0..1.0);
            num_to_str(value)
        }
        "srand" => {
            let previous = rt.seed;
            let seed = if args.is_empty() { 0.0 } else { to_num(arg(0)) };
            rt.rng = rand::rngs::StdRng::seed_from_u64(seed as u64);
            rt.seed = seed;
            num_to_str(previous)
        }
        _ => {
            rt.fail(format!("unknown builtin {}", name));
            String::new()
        }
    }
}
