//! The printf format machine.
//!
//! Implemented directly (no delegation to Rust's formatter) so width,
//! precision and flag behavior stay portable and predictable. Shared by
//! the `printf` command and the AWK `printf`/`sprintf` builtins.

/// One parsed `%` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub left_align: bool,
    pub zero_pad: bool,
    pub space_sign: bool,
    pub plus_sign: bool,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub conversion: char,
}

/// A format string split into literal runs and directives.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatPiece {
    Literal(String),
    Directive(Directive),
}

/// Parse a format string. `%%` becomes a literal percent; a malformed
/// trailing directive is kept literally.
pub fn parse_format(format: &str) -> Vec<FormatPiece> {
    let chars: Vec<char> = format.chars().collect();
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            literal.push(chars[i]);
            i += 1;
            continue;
        }
        if chars.get(i + 1) == Some(&'%') {
            literal.push('%');
            i += 2;
            continue;
        }

        let start = i;
        i += 1;
        let mut directive = Directive {
            left_align: false,
            zero_pad: false,
            space_sign: false,
            plus_sign: false,
            width: None,
            precision: None,
            conversion: 's',
        };
        while let Some(&c) = chars.get(i) {
            match c {
                '-' => directive.left_align = true,
                '0' => directive.zero_pad = true,
                ' ' => directive.space_sign = true,
                '+' => directive.plus_sign = true,
                _ => break,
            }
            i += 1;
        }
        let mut width = String::new();
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            width.push(chars[i]);
            i += 1;
        }
        if !width.is_empty() {
            directive.width = width.parse().ok();
        }
        if chars.get(i) == Some(&'.') {
            i += 1;
            let mut precision = String::new();
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                precision.push(chars[i]);
                i += 1;
            }
            directive.precision = Some(precision.parse().unwrap_or(0));
        }
        match chars.get(i) {
            Some(&c) if "sdioxXufeEgGc".contains(c) => {
                directive.conversion = c;
                i += 1;
                if !literal.is_empty() {
                    pieces.push(FormatPiece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(FormatPiece::Directive(directive));
            }
            _ => {
                // Not a directive after all; emit the raw text.
                literal.extend(&chars[start..i.min(chars.len())]);
                if i < chars.len() {
                    literal.push(chars[i]);
                    i += 1;
                }
            }
        }
    }

    if !literal.is_empty() {
        pieces.push(FormatPiece::Literal(literal));
    }
    pieces
}

/// Render one directive against a string argument, applying the numeric
/// coercions the conversion demands.
pub fn render(directive: &Directive, arg: &str) -> String {
    let body = match directive.conversion {
        's' => {
            let mut s = arg.to_string();
            if let Some(precision) = directive.precision {
                s = s.chars().take(precision).collect();
            }
            s
        }
        'c' => arg.chars().next().map(String::from).unwrap_or_default(),
        'd' | 'i' => format_signed(directive, to_i64(arg)),
        'u' => format_signed(directive, to_i64(arg).max(0)),
        'o' => format_radix(to_i64(arg), 8, false),
        'x' => format_radix(to_i64(arg), 16, false),
        'X' => format_radix(to_i64(arg), 16, true),
        'f' => {
            let precision = directive.precision.unwrap_or(6);
            format!("{:.*}", precision, to_f64(arg))
        }
        'e' | 'E' => {
            let precision = directive.precision.unwrap_or(6);
            let s = format_exponential(to_f64(arg), precision);
            if directive.conversion == 'E' {
                s.to_ascii_uppercase()
            } else {
                s
            }
        }
        'g' | 'G' => {
            let s = format_general(to_f64(arg), directive.precision.unwrap_or(6));
            if directive.conversion == 'G' {
                s.to_ascii_uppercase()
            } else {
                s
            }
        }
        other => format!("%{}", other),
    };
    let numeric = !matches!(directive.conversion, 's' | 'c');
    pad(directive, body, numeric)
}

fn pad(directive: &Directive, body: String, numeric: bool) -> String {
    let Some(width) = directive.width else { return body };
    let len = body.chars().count();
    if len >= width {
        return body;
    }
    let fill = width - len;
    if directive.left_align {
        format!("{}{}", body, " ".repeat(fill))
    } else if directive.zero_pad && numeric {
        // Zero padding goes after a sign.
        if let Some(rest) = body.strip_prefix('-') {
            format!("-{}{}", "0".repeat(fill), rest)
        } else {
            format!("{}{}", "0".repeat(fill), body)
        }
    } else {
        format!("{}{}", " ".repeat(fill), body)
    }
}

fn format_signed(directive: &Directive, value: i64) -> String {
    let mut s = value.to_string();
    if value >= 0 {
        if directive.plus_sign {
            s = format!("+{}", s);
        } else if directive.space_sign {
            s = format!(" {}", s);
        }
    }
    s
}

fn format_radix(value: i64, radix: u32, upper: bool) -> String {
    let unsigned = value as u64;
    let mut digits = String::new();
    let mut n = unsigned;
    if n == 0 {
        return "0".to_string();
    }
    while n > 0 {
        let d = (n % radix as u64) as u32;
        let c = std::char::from_digit(d, radix).unwrap();
        digits.push(if upper { c.to_ascii_uppercase() } else { c });
        n /= radix as u64;
    }
    digits.chars().rev().collect()
}

fn format_exponential(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return format!("{:.*}e+00", precision, 0.0);
    }
    let mut exponent = 0i32;
    let mut mantissa = value.abs();
    while mantissa >= 10.0 {
        mantissa /= 10.0;
        exponent += 1;
    }
    while mantissa < 1.0 {
        mantissa *= 10.0;
        exponent -= 1;
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let exp_sign = if exponent < 0 { '-' } else { '+' };
    format!("{}{:.*}e{}{:02}", sign, precision, mantissa, exp_sign, exponent.abs())
}

/// `%g`: the shorter of `%e`/`%f`, trailing zeros trimmed.
fn format_general(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if value == 0.0 {
        return "0".to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= precision as i32 {
        let s = format_exponential(value, precision.saturating_sub(1));
        trim_exponential_zeros(&s)
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        let s = format!("{:.*}", decimals, value);
        trim_decimal_zeros(&s)
    }
}

fn trim_decimal_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn trim_exponential_zeros(s: &str) -> String {
    match s.split_once('e') {
        Some((mantissa, exp)) => format!("{}e{}", trim_decimal_zeros(mantissa), exp),
        None => s.to_string(),
    }
}

/// Leading-integer coercion (`"12abc"` reads 12, garbage reads 0).
pub fn to_i64(text: &str) -> i64 {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).unwrap_or(0);
    }
    let mut end = 0;
    let bytes = text.as_bytes();
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    text[..end].parse().unwrap_or(0)
}

/// Leading-float coercion.
pub fn to_f64(text: &str) -> f64 {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    let mut seen_dot = false;
    let mut seen_exp = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if !seen_exp && end > 0 => {
                seen_exp = true;
                if end + 1 < bytes.len() && (bytes[end + 1] == b'-' || bytes[end + 1] == b'+') {
                    end += 1;
                }
            }
            _ => break,
        }
        end += 1;
    }
    text[..end].parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(format: &str, arg: &str) -> String {
        let pieces = parse_format(format);
        let mut out = String::new();
        for piece in pieces {
            match piece {
                FormatPiece::Literal(s) => out.push_str(&s),
                FormatPiece::Directive(d) => out.push_str(&render(&d, arg)),
            }
        }
        out
    }

    #[test]
    fn test_string_and_percent() {
        assert_eq!(fmt("[%s]", "hi"), "[hi]");
        assert_eq!(fmt("100%%", ""), "100%");
    }

    #[test]
    fn test_width_and_alignment() {
        assert_eq!(fmt("%5s", "ab"), "   ab");
        assert_eq!(fmt("%-5s|", "ab"), "ab   |");
    }

    #[test]
    fn test_integer() {
        assert_eq!(fmt("%d", "42"), "42");
        assert_eq!(fmt("%d", "-7"), "-7");
        assert_eq!(fmt("%d", "abc"), "0");
        assert_eq!(fmt("%d", "12abc"), "12");
        assert_eq!(fmt("%05d", "42"), "00042");
        assert_eq!(fmt("%05d", "-42"), "-0042");
    }

    #[test]
    fn test_hex_octal() {
        assert_eq!(fmt("%x", "255"), "ff");
        assert_eq!(fmt("%X", "255"), "FF");
        assert_eq!(fmt("%o", "8"), "10");
    }

    #[test]
    fn test_float() {
        assert_eq!(fmt("%f", "3.5"), "3.500000");
        assert_eq!(fmt("%.2f", "3.14159"), "3.14");
    }

    #[test]
    fn test_exponential() {
        assert_eq!(fmt("%e", "12345"), "1.234500e+04");
        assert_eq!(fmt("%.2e", "0.00123"), "1.23e-03");
    }

    #[test]
    fn test_general() {
        assert_eq!(fmt("%g", "0.0001"), "0.0001");
        assert_eq!(fmt("%g", "1000000"), "1e+06");
        assert_eq!(fmt("%g", "3.5"), "3.5");
    }

    #[test]
    fn test_char() {
        assert_eq!(fmt("%c", "hello"), "h");
        assert_eq!(fmt("%c", ""), "");
    }

    #[test]
    fn test_string_precision() {
        assert_eq!(fmt("%.3s", "abcdef"), "abc");
    }

    #[test]
    fn test_malformed_directive_is_literal() {
        assert_eq!(fmt("%z", "x"), "%z");
        assert_eq!(fmt("100%", "x"), "100%");
    }

    #[test]
    fn test_coercions() {
        assert_eq!(to_i64(" 42 "), 42);
        assert_eq!(to_i64("0x1f"), 31);
        assert_eq!(to_f64("3.5rest"), 3.5);
        assert_eq!(to_f64("nope"), 0.0);
    }
}
