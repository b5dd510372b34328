//! jq Filter Parser
//!
//! Precedence, loosest first: `|`, `,`, `or`, `and`, comparison,
//! additive, multiplicative, unary minus, postfix accessors, primary.

use serde_json::Value;

use super::lexer::{tokenize, JqTok};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Identity,
    Field { name: String, optional: bool },
    /// `.[f]` — number indexes arrays (negative from the end), string
    /// indexes objects.
    Index { index: Box<Filter>, optional: bool },
    /// `.[]`
    Iterate { optional: bool },
    Pipe(Box<Filter>, Box<Filter>),
    Comma(Vec<Filter>),
    Literal(Value),
    /// `[f]`
    Array(Option<Box<Filter>>),
    /// `{a: f, "b": g, c}`
    Object(Vec<(String, Option<Filter>)>),
    Neg(Box<Filter>),
    BinOp { op: JqOp, lhs: Box<Filter>, rhs: Box<Filter> },
    Call { name: String, args: Vec<Filter> },
    If { cond: Box<Filter>, then: Box<Filter>, otherwise: Option<Box<Filter>> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JqOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

pub fn parse_filter(source: &str) -> Result<Filter, String> {
    let tokens = tokenize(source)?;
    let mut parser = JqParser { tokens, pos: 0 };
    let filter = parser.parse_pipe()?;
    if parser.peek() != &JqTok::Eof {
        return Err(format!("unexpected token {:?}", parser.peek()));
    }
    Ok(filter)
}

struct JqParser {
    tokens: Vec<JqTok>,
    pos: usize,
}

impl JqParser {
    fn peek(&self) -> &JqTok {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> JqTok {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &JqTok) -> bool {
        if self.peek() == tok {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: JqTok) -> Result<(), String> {
        if self.eat(&tok) {
            Ok(())
        } else {
            Err(format!("expected {:?}, found {:?}", tok, self.peek()))
        }
    }

    fn parse_pipe(&mut self) -> Result<Filter, String> {
        let lhs = self.parse_comma()?;
        if self.eat(&JqTok::Pipe) {
            let rhs = self.parse_pipe()?;
            return Ok(Filter::Pipe(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_comma(&mut self) -> Result<Filter, String> {
        let first = self.parse_or()?;
        if self.peek() != &JqTok::Comma {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&JqTok::Comma) {
            items.push(self.parse_or()?);
        }
        Ok(Filter::Comma(items))
    }

    fn parse_or(&mut self) -> Result<Filter, String> {
        let mut lhs = self.parse_and()?;
        while self.eat(&JqTok::Or) {
            let rhs = self.parse_and()?;
            lhs = Filter::BinOp { op: JqOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Filter, String> {
        let mut lhs = self.parse_comparison()?;
        while self.eat(&JqTok::And) {
            let rhs = self.parse_comparison()?;
            lhs = Filter::BinOp { op: JqOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Filter, String> {
        let lhs = self.parse_additive()?;
        let op = match self.peek() {
            JqTok::Eq => JqOp::Eq,
            JqTok::Ne => JqOp::Ne,
            JqTok::Lt => JqOp::Lt,
            JqTok::Le => JqOp::Le,
            JqTok::Gt => JqOp::Gt,
            JqTok::Ge => JqOp::Ge,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_additive()?;
        Ok(Filter::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
    }

    fn parse_additive(&mut self) -> Result<Filter, String> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                JqTok::Plus => JqOp::Add,
                JqTok::Minus => JqOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Filter::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Filter, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                JqTok::Star => JqOp::Mul,
                JqTok::Slash => JqOp::Div,
                JqTok::Percent => JqOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Filter::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Filter, String> {
        if self.eat(&JqTok::Minus) {
            let operand = self.parse_postfix()?;
            return Ok(Filter::Neg(Box::new(operand)));
        }
        self.parse_postfix()
    }

    /// A primary plus its accessor chain: `.a.b[0][]?`.
    fn parse_postfix(&mut self) -> Result<Filter, String> {
        let mut current = self.parse_primary()?;
        loop {
            match self.peek() {
                JqTok::Dot => {
                    // Only continue for `.ident`; a lone dot here ends the
                    // chain (it would be a new identity filter).
                    if let Some(JqTok::Ident(_)) = self.tokens.get(self.pos + 1) {
                        self.advance();
                        let name = match self.advance() {
                            JqTok::Ident(name) => name,
                            _ => unreachable!("checked above"),
                        };
                        let optional = self.eat(&JqTok::Question);
                        current = Filter::Pipe(
                            Box::new(current),
                            Box::new(Filter::Field { name, optional }),
                        );
                    } else {
                        break;
                    }
                }
                JqTok::LBracket => {
                    self.advance();
                    if self.eat(&JqTok::RBracket) {
                        let optional = self.eat(&JqTok::Question);
                        current =
                            Filter::Pipe(Box::new(current), Box::new(Filter::Iterate { optional }));
                    } else {
                        let index = self.parse_pipe()?;
                        self.expect(JqTok::RBracket)?;
                        let optional = self.eat(&JqTok::Question);
                        current = Filter::Pipe(
                            Box::new(current),
                            Box::new(Filter::Index { index: Box::new(index), optional }),
                        );
                    }
                }
                _ => break,
            }
        }
        Ok(current)
    }

    fn parse_primary(&mut self) -> Result<Filter, String> {
        match self.advance() {
            JqTok::Dot => match self.peek().clone() {
                JqTok::Ident(name) => {
                    self.advance();
                    let optional = self.eat(&JqTok::Question);
                    Ok(Filter::Field { name, optional })
                }
                JqTok::Str(name) => {
                    // ."key with spaces"
                    self.advance();
                    let optional = self.eat(&JqTok::Question);
                    Ok(Filter::Field { name, optional })
                }
                _ => Ok(Filter::Identity),
            },
            JqTok::Num(value) => Ok(Filter::Literal(number(value))),
            JqTok::Str(value) => Ok(Filter::Literal(Value::String(value))),
            JqTok::True => Ok(Filter::Literal(Value::Bool(true))),
            JqTok::False => Ok(Filter::Literal(Value::Bool(false))),
            JqTok::Null => Ok(Filter::Literal(Value::Null)),
            JqTok::LParen => {
                let inner = self.parse_pipe()?;
                self.expect(JqTok::RParen)?;
                Ok(inner)
            }
            JqTok::LBracket => {
                if self.eat(&JqTok::RBracket) {
                    return Ok(Filter::Array(None));
                }
                let inner = self.parse_pipe()?;
                self.expect(JqTok::RBracket)?;
                Ok(Filter::Array(Some(Box::new(inner))))
            }
            JqTok::LBrace => self.parse_object(),
            JqTok::If => {
                let cond = self.parse_pipe()?;
                self.expect(JqTok::Then)?;
                let then = self.parse_pipe()?;
                let otherwise = self.parse_if_tail()?;
                Ok(Filter::If { cond: Box::new(cond), then: Box::new(then), otherwise })
            }
            JqTok::Ident(name) => {
                if self.eat(&JqTok::LParen) {
                    let mut args = vec![self.parse_pipe()?];
                    while self.eat(&JqTok::Comma) {
                        // jq separates filter args with ';', but a single
                        // arg covers this builtin set.
                        args.push(self.parse_pipe()?);
                    }
                    self.expect(JqTok::RParen)?;
                    Ok(Filter::Call { name, args })
                } else {
                    Ok(Filter::Call { name, args: Vec::new() })
                }
            }
            other => Err(format!("unexpected token {:?}", other)),
        }
    }

    fn parse_if_tail(&mut self) -> Result<Option<Box<Filter>>, String> {
        if self.eat(&JqTok::Elif) {
            let cond = self.parse_pipe()?;
            self.expect(JqTok::Then)?;
            let then = self.parse_pipe()?;
            let otherwise = self.parse_if_tail()?;
            return Ok(Some(Box::new(Filter::If {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise,
            })));
        }
        if self.eat(&JqTok::Else) {
            let otherwise = self.parse_pipe()?;
            self.expect(JqTok::End)?;
            return Ok(Some(Box::new(otherwise)));
        }
        self.expect(JqTok::End)?;
        Ok(None)
    }

    fn parse_object(&mut self) -> Result<Filter, String> {
        let mut entries = Vec::new();
        if self.eat(&JqTok::RBrace) {
            return Ok(Filter::Object(entries));
        }
        loop {
            let key = match self.advance() {
                JqTok::Ident(name) => name,
                JqTok::Str(name) => name,
                other => return Err(format!("expected object key, found {:?}", other)),
            };
            let value = if self.eat(&JqTok::Colon) {
                Some(self.parse_or()?)
            } else {
                // `{name}` shorthand for `{name: .name}`.
                None
            };
            entries.push((key, value));
            if !self.eat(&JqTok::Comma) {
                break;
            }
        }
        self.expect(JqTok::RBrace)?;
        Ok(Filter::Object(entries))
    }
}

/// Integral results print without a decimal point.
pub fn number(value: f64) -> Value {
    if value == value.trunc() && value.abs() < 9e15 {
        Value::Number(serde_json::Number::from(value as i64))
    } else {
        serde_json::Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(parse_filter(".").unwrap(), Filter::Identity);
    }

    #[test]
    fn test_field_chain() {
        let f = parse_filter(".a.b").unwrap();
        assert!(matches!(f, Filter::Pipe(_, _)));
    }

    #[test]
    fn test_optional_field() {
        assert_eq!(
            parse_filter(".a?").unwrap(),
            Filter::Field { name: "a".to_string(), optional: true }
        );
    }

    #[test]
    fn test_index_and_iterate() {
        assert!(matches!(parse_filter(".[0]").unwrap(), Filter::Pipe(_, _)));
        assert!(matches!(parse_filter(".[]").unwrap(), Filter::Pipe(_, _)));
    }

    #[test]
    fn test_pipe_and_comma() {
        assert!(matches!(parse_filter(".a | .b").unwrap(), Filter::Pipe(_, _)));
        assert!(matches!(parse_filter(".a, .b").unwrap(), Filter::Comma(_)));
    }

    #[test]
    fn test_array_and_object_construction() {
        assert!(matches!(parse_filter("[.a]").unwrap(), Filter::Array(Some(_))));
        assert!(matches!(parse_filter("[]").unwrap(), Filter::Array(None)));
        let f = parse_filter("{x: .a, y}").unwrap();
        match f {
            Filter::Object(entries) => {
                assert_eq!(entries.len(), 2);
                assert!(entries[1].1.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_call_with_args() {
        let f = parse_filter("select(.x > 1)").unwrap();
        assert!(matches!(f, Filter::Call { ref name, ref args } if name == "select" && args.len() == 1));
    }

    #[test]
    fn test_if_then_else() {
        assert!(matches!(
            parse_filter("if .a then 1 else 2 end").unwrap(),
            Filter::If { otherwise: Some(_), .. }
        ));
    }

    #[test]
    fn test_number_literal_integral() {
        assert_eq!(number(3.0), serde_json::json!(3));
        assert_eq!(number(3.5), serde_json::json!(3.5));
    }

    #[test]
    fn test_trailing_garbage_is_error() {
        assert!(parse_filter(". )").is_err());
    }
}
