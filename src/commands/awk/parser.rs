//! AWK Parser
//!
//! Recursive descent over the token stream. Operator precedence follows
//! POSIX awk: assignment, ternary, `||`, `&&`, `in`, `~`, comparison
//! (non-associative), concatenation, additive, multiplicative, unary,
//! `^` (right-associative), postfix, `$`.

use super::ast::{
    AssignOp, BinOp, Expr, FunctionDef, OutputRedirect, Pattern, Program, RedirectKind, Rule,
    Stmt, Tok, Token, UnOp,
};
use super::lexer::tokenize;

pub fn parse_program(source: &str) -> Result<Program, String> {
    let tokens = tokenize(source)?;
    let mut parser = AwkParser { tokens, pos: 0, no_gt: false };
    parser.parse_program()
}

struct AwkParser {
    tokens: Vec<Token>,
    pos: usize,
    /// Inside print arguments `>` is a redirect, not a comparison.
    no_gt: bool,
}

impl AwkParser {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].tok
    }

    fn line(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].line
    }

    fn advance(&mut self) -> Tok {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].tok.clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == tok {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Tok) -> Result<(), String> {
        if self.eat(&tok) {
            Ok(())
        } else {
            Err(format!("line {}: expected {:?}, found {:?}", self.line(), tok, self.peek()))
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Tok::Newline) {
            self.advance();
        }
    }

    fn skip_terminators(&mut self) {
        while matches!(self.peek(), Tok::Newline | Tok::Semi) {
            self.advance();
        }
    }

    // -- program structure ---------------------------------------------------

    fn parse_program(&mut self) -> Result<Program, String> {
        let mut program = Program::default();
        loop {
            self.skip_terminators();
            match self.peek() {
                Tok::Eof => break,
                Tok::Function => program.functions.push(self.parse_function()?),
                _ => program.rules.push(self.parse_rule()?),
            }
        }
        Ok(program)
    }

    fn parse_function(&mut self) -> Result<FunctionDef, String> {
        self.expect(Tok::Function)?;
        let name = match self.advance() {
            Tok::Ident(name) => name,
            other => return Err(format!("line {}: expected function name, found {:?}", self.line(), other)),
        };
        self.expect(Tok::LParen)?;
        let mut params = Vec::new();
        if !self.eat(&Tok::RParen) {
            loop {
                match self.advance() {
                    Tok::Ident(param) => params.push(param),
                    other => {
                        return Err(format!(
                            "line {}: expected parameter name, found {:?}",
                            self.line(),
                            other
                        ))
                    }
                }
                if !self.eat(&Tok::Comma) {
                    break;
                }
                self.skip_newlines();
            }
            self.expect(Tok::RParen)?;
        }
        self.skip_newlines();
        let body = self.parse_block()?;
        Ok(FunctionDef { name, params, body })
    }

    fn parse_rule(&mut self) -> Result<Rule, String> {
        let pattern = match self.peek() {
            Tok::LBrace => None,
            Tok::Begin => {
                self.advance();
                Some(Pattern::Begin)
            }
            Tok::End => {
                self.advance();
                Some(Pattern::End)
            }
            _ => {
                let first = self.parse_single_pattern()?;
                if self.eat(&Tok::Comma) {
                    self.skip_newlines();
                    let second = self.parse_single_pattern()?;
                    Some(Pattern::Range(Box::new(first), Box::new(second)))
                } else {
                    Some(first)
                }
            }
        };

        let action = if matches!(self.peek(), Tok::LBrace) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if pattern.is_none() && action.is_none() {
            return Err(format!("line {}: expected pattern or action", self.line()));
        }
        Ok(Rule { pattern, action })
    }

    fn parse_single_pattern(&mut self) -> Result<Pattern, String> {
        // A bare regex pattern matches $0; anything else is an expression.
        if let Tok::Re(re) = self.peek().clone() {
            // Only when the regex stands alone (not e.g. /x/ && /y/).
            let saved = self.pos;
            self.advance();
            if matches!(self.peek(), Tok::LBrace | Tok::Comma | Tok::Newline | Tok::Semi | Tok::Eof)
            {
                return Ok(Pattern::Regex(re));
            }
            self.pos = saved;
        }
        Ok(Pattern::Expr(self.parse_expr()?))
    }

    // -- statements ----------------------------------------------------------

    fn parse_block(&mut self) -> Result<Vec<Stmt>, String> {
        self.expect(Tok::LBrace)?;
        let mut stmts = Vec::new();
        loop {
            self.skip_terminators();
            if self.eat(&Tok::RBrace) {
                break;
            }
            if matches!(self.peek(), Tok::Eof) {
                return Err(format!("line {}: expected '}}'", self.line()));
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, String> {
        match self.peek().clone() {
            Tok::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            Tok::If => self.parse_if(),
            Tok::While => self.parse_while(),
            Tok::Do => self.parse_do_while(),
            Tok::For => self.parse_for(),
            Tok::Break => {
                self.advance();
                Ok(Stmt::Break)
            }
            Tok::Continue => {
                self.advance();
                Ok(Stmt::Continue)
            }
            Tok::Next => {
                self.advance();
                Ok(Stmt::Next)
            }
            Tok::Exit => {
                self.advance();
                let code = if self.stmt_ended() { None } else { Some(self.parse_expr()?) };
                Ok(Stmt::Exit(code))
            }
            Tok::Return => {
                self.advance();
                let value = if self.stmt_ended() { None } else { Some(self.parse_expr()?) };
                Ok(Stmt::Return(value))
            }
            Tok::Delete => self.parse_delete(),
            Tok::Print => self.parse_print(false),
            Tok::Printf => self.parse_print(true),
            _ => Ok(Stmt::Expr(self.parse_expr()?)),
        }
    }

    fn stmt_ended(&self) -> bool {
        matches!(self.peek(), Tok::Semi | Tok::Newline | Tok::RBrace | Tok::Eof)
    }

    fn parse_if(&mut self) -> Result<Stmt, String> {
        self.expect(Tok::If)?;
        self.expect(Tok::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Tok::RParen)?;
        self.skip_newlines();
        let then = Box::new(self.parse_stmt()?);

        // `else` may sit on the next line, after an optional `;`.
        let saved = self.pos;
        self.skip_terminators();
        let otherwise = if self.eat(&Tok::Else) {
            self.skip_newlines();
            Some(Box::new(self.parse_stmt()?))
        } else {
            self.pos = saved;
            None
        };
        Ok(Stmt::If { cond, then, otherwise })
    }

    fn parse_while(&mut self) -> Result<Stmt, String> {
        self.expect(Tok::While)?;
        self.expect(Tok::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Tok::RParen)?;
        self.skip_newlines();
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While { cond, body })
    }

    fn parse_do_while(&mut self) -> Result<Stmt, String> {
        self.expect(Tok::Do)?;
        self.skip_newlines();
        let body = Box::new(self.parse_stmt()?);
        self.skip_terminators();
        self.expect(Tok::While)?;
        self.expect(Tok::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Tok::RParen)?;
        Ok(Stmt::DoWhile { body, cond })
    }

    fn parse_for(&mut self) -> Result<Stmt, String> {
        self.expect(Tok::For)?;
        self.expect(Tok::LParen)?;

        // for (var in array)
        if let Tok::Ident(var) = self.peek().clone() {
            if self.tokens.get(self.pos + 1).map(|t| &t.tok) == Some(&Tok::In) {
                self.advance();
                self.advance();
                let array = match self.advance() {
                    Tok::Ident(name) => name,
                    other => {
                        return Err(format!(
                            "line {}: expected array name, found {:?}",
                            self.line(),
                            other
                        ))
                    }
                };
                self.expect(Tok::RParen)?;
                self.skip_newlines();
                let body = Box::new(self.parse_stmt()?);
                return Ok(Stmt::ForIn { var, array, body });
            }
        }

        let init = if matches!(self.peek(), Tok::Semi) {
            None
        } else {
            Some(Box::new(Stmt::Expr(self.parse_expr()?)))
        };
        self.expect(Tok::Semi)?;
        let cond = if matches!(self.peek(), Tok::Semi) { None } else { Some(self.parse_expr()?) };
        self.expect(Tok::Semi)?;
        let update = if matches!(self.peek(), Tok::RParen) {
            None
        } else {
            Some(Box::new(Stmt::Expr(self.parse_expr()?)))
        };
        self.expect(Tok::RParen)?;
        self.skip_newlines();
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For { init, cond, update, body })
    }

    fn parse_delete(&mut self) -> Result<Stmt, String> {
        self.expect(Tok::Delete)?;
        let array = match self.advance() {
            Tok::Ident(name) => name,
            other => {
                return Err(format!("line {}: expected array name, found {:?}", self.line(), other))
            }
        };
        let mut subscripts = Vec::new();
        if self.eat(&Tok::LBracket) {
            loop {
                subscripts.push(self.parse_expr()?);
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
            self.expect(Tok::RBracket)?;
        }
        Ok(Stmt::Delete { array, subscripts })
    }

    fn parse_print(&mut self, formatted: bool) -> Result<Stmt, String> {
        self.advance(); // print / printf
        let mut args = Vec::new();

        let no_args = matches!(
            self.peek(),
            Tok::Semi | Tok::Newline | Tok::RBrace | Tok::Eof | Tok::Gt | Tok::Append
        );
        if !no_args {
            self.no_gt = true;
            let parsed = self.parse_print_args(&mut args);
            self.no_gt = false;
            parsed?;
        }

        let redirect = match self.peek() {
            Tok::Gt => {
                self.advance();
                Some(OutputRedirect { kind: RedirectKind::Truncate, target: self.parse_concat()? })
            }
            Tok::Append => {
                self.advance();
                Some(OutputRedirect { kind: RedirectKind::Append, target: self.parse_concat()? })
            }
            Tok::Pipe => {
                return Err(format!("line {}: print to pipe is not supported", self.line()))
            }
            _ => None,
        };

        if formatted {
            if args.is_empty() {
                return Err(format!("line {}: printf: no format string", self.line()));
            }
            Ok(Stmt::Printf { args, redirect })
        } else {
            Ok(Stmt::Print { args, redirect })
        }
    }

    fn parse_print_args(&mut self, args: &mut Vec<Expr>) -> Result<(), String> {
        loop {
            args.push(self.parse_expr()?);
            if !self.eat(&Tok::Comma) {
                return Ok(());
            }
            self.skip_newlines();
        }
    }

    // -- expressions ---------------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr, String> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<Expr, String> {
        let lhs = self.parse_ternary()?;
        let op = match self.peek() {
            Tok::Assign => AssignOp::Set,
            Tok::AddAssign => AssignOp::Add,
            Tok::SubAssign => AssignOp::Sub,
            Tok::MulAssign => AssignOp::Mul,
            Tok::DivAssign => AssignOp::Div,
            Tok::ModAssign => AssignOp::Mod,
            Tok::PowAssign => AssignOp::Pow,
            _ => return Ok(lhs),
        };
        if !is_lvalue(&lhs) {
            return Err(format!("line {}: assignment to non-lvalue", self.line()));
        }
        self.advance();
        self.skip_newlines();
        let value = self.parse_assign()?;
        Ok(Expr::Assign { op, target: Box::new(lhs), value: Box::new(value) })
    }

    fn parse_ternary(&mut self) -> Result<Expr, String> {
        let cond = self.parse_or()?;
        if self.eat(&Tok::Question) {
            self.skip_newlines();
            let yes = self.parse_ternary()?;
            self.expect(Tok::Colon)?;
            self.skip_newlines();
            let no = self.parse_ternary()?;
            return Ok(Expr::Ternary { cond: Box::new(cond), yes: Box::new(yes), no: Box::new(no) });
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Tok::Or) {
            self.skip_newlines();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary { op: BinOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_in()?;
        while self.eat(&Tok::And) {
            self.skip_newlines();
            let rhs = self.parse_in()?;
            lhs = Expr::Binary { op: BinOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_in(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_match()?;
        while self.eat(&Tok::In) {
            let array = match self.advance() {
                Tok::Ident(name) => name,
                other => {
                    return Err(format!(
                        "line {}: expected array name after 'in', found {:?}",
                        self.line(),
                        other
                    ))
                }
            };
            lhs = Expr::In { subscripts: vec![lhs], array };
        }
        Ok(lhs)
    }

    fn parse_match(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_rel()?;
        loop {
            let op = match self.peek() {
                Tok::Match => BinOp::Match,
                Tok::NotMatch => BinOp::NotMatch,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_rel()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    /// Comparison is non-associative in awk.
    fn parse_rel(&mut self) -> Result<Expr, String> {
        let lhs = self.parse_concat()?;
        let op = match self.peek() {
            Tok::Lt => BinOp::Lt,
            Tok::Le => BinOp::Le,
            Tok::Gt if !self.no_gt => BinOp::Gt,
            Tok::Ge => BinOp::Ge,
            Tok::Eq => BinOp::Eq,
            Tok::Ne => BinOp::Ne,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_concat()?;
        Ok(Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
    }

    fn parse_concat(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_additive()?;
        while self.starts_expression() {
            let rhs = self.parse_additive()?;
            lhs = Expr::Concat { lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    /// Tokens that unambiguously begin a new operand for concatenation.
    fn starts_expression(&self) -> bool {
        matches!(
            self.peek(),
            Tok::Num(_)
                | Tok::Str(_)
                | Tok::Ident(_)
                | Tok::Dollar
                | Tok::LParen
                | Tok::Not
                | Tok::Incr
                | Tok::Decr
        )
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Tok::Plus => BinOp::Add,
                Tok::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Tok::Star => BinOp::Mul,
                Tok::Slash => BinOp::Div,
                Tok::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        let op = match self.peek() {
            Tok::Not => UnOp::Not,
            Tok::Minus => UnOp::Neg,
            Tok::Plus => UnOp::Pos,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary { op, operand: Box::new(operand) })
    }

    /// `^` binds tighter than unary minus and associates right.
    fn parse_power(&mut self) -> Result<Expr, String> {
        let base = self.parse_postfix()?;
        if self.eat(&Tok::Caret) {
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, String> {
        let primary = self.parse_primary()?;
        if is_lvalue(&primary) {
            if self.eat(&Tok::Incr) {
                return Ok(Expr::PostIncr(Box::new(primary)));
            }
            if self.eat(&Tok::Decr) {
                return Ok(Expr::PostDecr(Box::new(primary)));
            }
        }
        Ok(primary)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Tok::Num(value) => Ok(Expr::Num(value)),
            Tok::Str(value) => Ok(Expr::Str(value)),
            Tok::Re(re) => Ok(Expr::Regex(re)),
            Tok::Incr => {
                let target = self.parse_primary()?;
                if !is_lvalue(&target) {
                    return Err(format!("line {}: ++ requires an lvalue", self.line()));
                }
                Ok(Expr::PreIncr(Box::new(target)))
            }
            Tok::Decr => {
                let target = self.parse_primary()?;
                if !is_lvalue(&target) {
                    return Err(format!("line {}: -- requires an lvalue", self.line()));
                }
                Ok(Expr::PreDecr(Box::new(target)))
            }
            Tok::Dollar => {
                let index = self.parse_primary()?;
                Ok(Expr::Field(Box::new(index)))
            }
            Tok::Getline => {
                let var = match self.peek().clone() {
                    Tok::Ident(name) => {
                        self.advance();
                        Some(name)
                    }
                    _ => None,
                };
                Ok(Expr::Getline { var })
            }
            Tok::Ident(name) => {
                if self.eat(&Tok::LParen) {
                    let mut call_args = Vec::new();
                    self.skip_newlines();
                    if !self.eat(&Tok::RParen) {
                        loop {
                            call_args.push(self.parse_expr()?);
                            if !self.eat(&Tok::Comma) {
                                break;
                            }
                            self.skip_newlines();
                        }
                        self.expect(Tok::RParen)?;
                    }
                    return Ok(Expr::Call { name, args: call_args });
                }
                if self.eat(&Tok::LBracket) {
                    let mut subscripts = Vec::new();
                    loop {
                        subscripts.push(self.parse_expr()?);
                        if !self.eat(&Tok::Comma) {
                            break;
                        }
                    }
                    self.expect(Tok::RBracket)?;
                    return Ok(Expr::Index { array: name, subscripts });
                }
                Ok(Expr::Var(name))
            }
            Tok::LParen => {
                // Parentheses re-enable `>` as a comparison inside print.
                let saved_no_gt = self.no_gt;
                self.no_gt = false;
                let result = self.parse_paren_tail();
                self.no_gt = saved_no_gt;
                result
            }
            other => {
                Err(format!("line {}: unexpected token {:?}", self.line(), other))
            }
        }
    }

    fn parse_paren_tail(&mut self) -> Result<Expr, String> {
        let first = self.parse_expr()?;
        if self.eat(&Tok::Comma) {
            // `(i, j) in arr`
            let mut subscripts = vec![first];
            loop {
                subscripts.push(self.parse_expr()?);
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
            self.expect(Tok::RParen)?;
            self.expect(Tok::In)?;
            let array = match self.advance() {
                Tok::Ident(name) => name,
                other => {
                    return Err(format!(
                        "line {}: expected array name, found {:?}",
                        self.line(),
                        other
                    ))
                }
            };
            return Ok(Expr::In { subscripts, array });
        }
        self.expect(Tok::RParen)?;
        Ok(first)
    }
}

fn is_lvalue(expr: &Expr) -> bool {
    matches!(expr, Expr::Var(_) | Expr::Field(_) | Expr::Index { .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        parse_program(source).unwrap()
    }

    #[test]
    fn test_bare_action() {
        let p = parse("{ print }");
        assert_eq!(p.rules.len(), 1);
        assert!(p.rules[0].pattern.is_none());
    }

    #[test]
    fn test_begin_end_rules() {
        let p = parse("BEGIN { x = 1 } END { print x }");
        assert_eq!(p.rules.len(), 2);
        assert_eq!(p.rules[0].pattern, Some(Pattern::Begin));
        assert_eq!(p.rules[1].pattern, Some(Pattern::End));
    }

    #[test]
    fn test_regex_pattern() {
        let p = parse("/error/ { print }");
        assert_eq!(p.rules[0].pattern, Some(Pattern::Regex("error".to_string())));
    }

    #[test]
    fn test_expression_pattern_without_action() {
        let p = parse("NR > 1");
        assert!(matches!(p.rules[0].pattern, Some(Pattern::Expr(_))));
        assert!(p.rules[0].action.is_none());
    }

    #[test]
    fn test_range_pattern() {
        let p = parse("/start/, /end/ { print }");
        assert!(matches!(p.rules[0].pattern, Some(Pattern::Range(_, _))));
    }

    #[test]
    fn test_field_expression() {
        let p = parse("{ print $1, $NF, $(i+1) }");
        match p.rules[0].action.as_ref().unwrap().first().unwrap() {
            Stmt::Print { args, .. } => assert_eq!(args.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_print_redirect() {
        let p = parse("{ print $1 > \"out.txt\" }");
        match p.rules[0].action.as_ref().unwrap().first().unwrap() {
            Stmt::Print { redirect: Some(redirect), args } => {
                assert_eq!(redirect.kind, RedirectKind::Truncate);
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_print_gt_in_parens_is_comparison() {
        let p = parse("{ print (a > b) }");
        match p.rules[0].action.as_ref().unwrap().first().unwrap() {
            Stmt::Print { redirect: None, args } => {
                assert!(matches!(args[0], Expr::Binary { op: BinOp::Gt, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_concatenation() {
        let p = parse("{ x = \"a\" \"b\" }");
        match p.rules[0].action.as_ref().unwrap().first().unwrap() {
            Stmt::Expr(Expr::Assign { value, .. }) => {
                assert!(matches!(**value, Expr::Concat { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_precedence_ternary_assignment() {
        let p = parse("{ x = a ? 1 : 2 }");
        match p.rules[0].action.as_ref().unwrap().first().unwrap() {
            Stmt::Expr(Expr::Assign { value, .. }) => {
                assert!(matches!(**value, Expr::Ternary { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_compound_assignment() {
        let p = parse("{ s += $1 }");
        assert!(matches!(
            p.rules[0].action.as_ref().unwrap().first().unwrap(),
            Stmt::Expr(Expr::Assign { op: AssignOp::Add, .. })
        ));
    }

    #[test]
    fn test_control_flow_statements() {
        let p = parse("{ if (x) print; else print \"no\"; while (y) y--; for (i=0;i<3;i++) print i }");
        let stmts = p.rules[0].action.as_ref().unwrap();
        assert!(matches!(stmts[0], Stmt::If { otherwise: Some(_), .. }));
        assert!(matches!(stmts[1], Stmt::While { .. }));
        assert!(matches!(stmts[2], Stmt::For { .. }));
    }

    #[test]
    fn test_for_in() {
        let p = parse("{ for (k in arr) print k }");
        assert!(matches!(
            p.rules[0].action.as_ref().unwrap().first().unwrap(),
            Stmt::ForIn { .. }
        ));
    }

    #[test]
    fn test_do_while() {
        let p = parse("{ do { x-- } while (x > 0) }");
        assert!(matches!(
            p.rules[0].action.as_ref().unwrap().first().unwrap(),
            Stmt::DoWhile { .. }
        ));
    }

    #[test]
    fn test_function_def() {
        let p = parse("function add(a, b) { return a + b }");
        assert_eq!(p.functions.len(), 1);
        assert_eq!(p.functions[0].params, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_array_index_and_in() {
        let p = parse("{ a[$1]++; if ($2 in seen) print }");
        let stmts = p.rules[0].action.as_ref().unwrap();
        assert!(matches!(stmts[0], Stmt::Expr(Expr::PostIncr(_))));
    }

    #[test]
    fn test_multi_subscript() {
        let p = parse("{ a[i, j] = 1 }");
        match p.rules[0].action.as_ref().unwrap().first().unwrap() {
            Stmt::Expr(Expr::Assign { target, .. }) => match &**target {
                Expr::Index { subscripts, .. } => assert_eq!(subscripts.len(), 2),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_delete() {
        let p = parse("{ delete a[k]; delete b }");
        let stmts = p.rules[0].action.as_ref().unwrap();
        assert!(matches!(&stmts[0], Stmt::Delete { subscripts, .. } if subscripts.len() == 1));
        assert!(matches!(&stmts[1], Stmt::Delete { subscripts, .. } if subscripts.is_empty()));
    }

    #[test]
    fn test_exit_with_code() {
        let p = parse("{ exit 5 }");
        assert!(matches!(
            p.rules[0].action.as_ref().unwrap().first().unwrap(),
            Stmt::Exit(Some(_))
        ));
    }

    #[test]
    fn test_getline_forms() {
        let p = parse("{ getline; getline nextline }");
        let stmts = p.rules[0].action.as_ref().unwrap();
        assert!(matches!(&stmts[0], Stmt::Expr(Expr::Getline { var: None })));
        assert!(matches!(&stmts[1], Stmt::Expr(Expr::Getline { var: Some(v) }) if v == "nextline"));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_program("{ if }").unwrap_err();
        assert!(err.starts_with("line 1"));
    }
}
