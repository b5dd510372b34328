//! Arithmetic Expression Parser
//!
//! Parses the C-like expression language of `$(( ... ))` and the C-style
//! `for` header into [`ArithExpr`]. Evaluation lives in the interpreter.

use crate::ast::{ArithBinaryOp, ArithExpr, ArithUnaryOp};

use super::ParseError;

pub fn parse_arith(input: &str, line: usize) -> Result<ArithExpr, ParseError> {
    let tokens = tokenize(input, line)?;
    let mut parser = ArithParser { tokens, pos: 0, line };
    if parser.at_end() {
        // An empty expression evaluates to 0 (e.g. `for (( ; ; ))`).
        return Ok(ArithExpr::Number(0));
    }
    let expr = parser.parse_comma()?;
    if !parser.at_end() {
        return Err(ParseError::new(
            format!("arithmetic syntax error near '{}'", parser.peek_text()),
            line,
            0,
        ));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum ATok {
    Num(i64),
    Ident(String),
    Op(&'static str),
}

fn tokenize(input: &str, line: usize) -> Result<Vec<ATok>, ParseError> {
    const OPS: &[&str] = &[
        "<<=", ">>=", "**", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "++", "--", "+=",
        "-=", "*=", "/=", "%=", "&=", "^=", "|=", "?", ":", ",", "+", "-", "*", "/", "%", "<",
        ">", "!", "~", "&", "^", "|", "=", "(", ")",
    ];

    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    'outer: while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric()) {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value = parse_integer_literal(&text)
                .ok_or_else(|| ParseError::new(format!("invalid number '{}'", text), line, 0))?;
            tokens.push(ATok::Num(value));
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let mut name = String::new();
            if c == '$' {
                i += 1; // `$x` and `x` read the same variable
                if i >= chars.len() || !(chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    return Err(ParseError::new("arithmetic syntax error near '$'", line, 0));
                }
            }
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                name.push(chars[i]);
                i += 1;
            }
            tokens.push(ATok::Ident(name));
            continue;
        }
        for op in OPS {
            let op_chars: Vec<char> = op.chars().collect();
            if chars[i..].starts_with(&op_chars) {
                tokens.push(ATok::Op(op));
                i += op_chars.len();
                continue 'outer;
            }
        }
        return Err(ParseError::new(format!("arithmetic syntax error near '{}'", c), line, 0));
    }
    Ok(tokens)
}

/// `0x` hex, leading-`0` octal, decimal otherwise.
fn parse_integer_literal(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        i64::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse::<i64>().ok()
    }
}

struct ArithParser {
    tokens: Vec<ATok>,
    pos: usize,
    line: usize,
}

impl ArithParser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&ATok> {
        self.tokens.get(self.pos)
    }

    fn peek_text(&self) -> String {
        match self.peek() {
            Some(ATok::Num(n)) => n.to_string(),
            Some(ATok::Ident(name)) => name.clone(),
            Some(ATok::Op(op)) => op.to_string(),
            None => "end of expression".to_string(),
        }
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if matches!(self.peek(), Some(ATok::Op(o)) if *o == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<(), ParseError> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("arithmetic syntax error: expected '{}', found '{}'", op, self.peek_text()),
                self.line,
                0,
            ))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.line, 0)
    }

    fn parse_comma(&mut self) -> Result<ArithExpr, ParseError> {
        let first = self.parse_assign()?;
        if !matches!(self.peek(), Some(ATok::Op(","))) {
            return Ok(first);
        }
        let mut seq = vec![first];
        while self.eat_op(",") {
            seq.push(self.parse_assign()?);
        }
        Ok(ArithExpr::Sequence(seq))
    }

    fn parse_assign(&mut self) -> Result<ArithExpr, ParseError> {
        // Lookahead: identifier followed by an assignment operator.
        if let Some(ATok::Ident(name)) = self.peek().cloned() {
            if let Some(ATok::Op(op)) = self.tokens.get(self.pos + 1) {
                let compound = match *op {
                    "=" => Some(None),
                    "+=" => Some(Some(ArithBinaryOp::Add)),
                    "-=" => Some(Some(ArithBinaryOp::Sub)),
                    "*=" => Some(Some(ArithBinaryOp::Mul)),
                    "/=" => Some(Some(ArithBinaryOp::Div)),
                    "%=" => Some(Some(ArithBinaryOp::Mod)),
                    "<<=" => Some(Some(ArithBinaryOp::Shl)),
                    ">>=" => Some(Some(ArithBinaryOp::Shr)),
                    "&=" => Some(Some(ArithBinaryOp::BitAnd)),
                    "^=" => Some(Some(ArithBinaryOp::BitXor)),
                    "|=" => Some(Some(ArithBinaryOp::BitOr)),
                    _ => None,
                };
                if let Some(op) = compound {
                    self.pos += 2;
                    let value = self.parse_assign()?;
                    return Ok(ArithExpr::Assign { name, op, value: Box::new(value) });
                }
            }
        }
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<ArithExpr, ParseError> {
        let cond = self.parse_binary(0)?;
        if self.eat_op("?") {
            let then = self.parse_assign()?;
            self.expect_op(":")?;
            let otherwise = self.parse_assign()?;
            return Ok(ArithExpr::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(cond)
    }

    /// Precedence-climbing over the left-associative binary tiers.
    fn parse_binary(&mut self, min_level: usize) -> Result<ArithExpr, ParseError> {
        const LEVELS: &[&[(&str, ArithBinaryOp)]] = &[
            &[("||", ArithBinaryOp::LogOr)],
            &[("&&", ArithBinaryOp::LogAnd)],
            &[("|", ArithBinaryOp::BitOr)],
            &[("^", ArithBinaryOp::BitXor)],
            &[("&", ArithBinaryOp::BitAnd)],
            &[("==", ArithBinaryOp::Eq), ("!=", ArithBinaryOp::Ne)],
            &[
                ("<=", ArithBinaryOp::Le),
                (">=", ArithBinaryOp::Ge),
                ("<", ArithBinaryOp::Lt),
                (">", ArithBinaryOp::Gt),
            ],
            &[("<<", ArithBinaryOp::Shl), (">>", ArithBinaryOp::Shr)],
            &[("+", ArithBinaryOp::Add), ("-", ArithBinaryOp::Sub)],
            &[
                ("*", ArithBinaryOp::Mul),
                ("/", ArithBinaryOp::Div),
                ("%", ArithBinaryOp::Mod),
            ],
        ];

        if min_level >= LEVELS.len() {
            return self.parse_power();
        }
        let mut left = self.parse_binary(min_level + 1)?;
        'scan: loop {
            for (text, op) in LEVELS[min_level] {
                if self.eat_op(text) {
                    let right = self.parse_binary(min_level + 1)?;
                    left = ArithExpr::Binary { op: *op, left: Box::new(left), right: Box::new(right) };
                    continue 'scan;
                }
            }
            return Ok(left);
        }
    }

    /// `**` binds tighter than `*` and associates right.
    fn parse_power(&mut self) -> Result<ArithExpr, ParseError> {
        let base = self.parse_unary()?;
        if self.eat_op("**") {
            let exponent = self.parse_power()?;
            return Ok(ArithExpr::Binary {
                op: ArithBinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<ArithExpr, ParseError> {
        for (text, op) in [
            ("!", ArithUnaryOp::Not),
            ("~", ArithUnaryOp::BitNot),
            ("-", ArithUnaryOp::Neg),
            ("+", ArithUnaryOp::Pos),
        ] {
            if self.eat_op(text) {
                let operand = self.parse_unary()?;
                return Ok(ArithExpr::Unary { op, operand: Box::new(operand) });
            }
        }
        if self.eat_op("++") {
            let name = self.expect_ident("++")?;
            return Ok(ArithExpr::PreIncrement(name));
        }
        if self.eat_op("--") {
            let name = self.expect_ident("--")?;
            return Ok(ArithExpr::PreDecrement(name));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<ArithExpr, ParseError> {
        let primary = self.parse_primary()?;
        if let ArithExpr::Var(name) = &primary {
            if self.eat_op("++") {
                return Ok(ArithExpr::PostIncrement(name.clone()));
            }
            if self.eat_op("--") {
                return Ok(ArithExpr::PostDecrement(name.clone()));
            }
        }
        Ok(primary)
    }

    fn parse_primary(&mut self) -> Result<ArithExpr, ParseError> {
        match self.peek().cloned() {
            Some(ATok::Num(n)) => {
                self.pos += 1;
                Ok(ArithExpr::Number(n))
            }
            Some(ATok::Ident(name)) => {
                self.pos += 1;
                Ok(ArithExpr::Var(name))
            }
            Some(ATok::Op("(")) => {
                self.pos += 1;
                let inner = self.parse_comma()?;
                self.expect_op(")")?;
                Ok(inner)
            }
            _ => Err(self.error(format!("arithmetic syntax error near '{}'", self.peek_text()))),
        }
    }

    fn expect_ident(&mut self, after: &str) -> Result<String, ParseError> {
        match self.peek().cloned() {
            Some(ATok::Ident(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error(format!("'{}' requires a variable operand", after))),
        }
    }
}
