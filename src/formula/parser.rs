//! Recursive-descent parser for the formula grammar
//!
//! Grammar (standard precedence, `*` and `/` bind tighter than `+` and
//! `-`, parentheses override):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := NUMBER | IDENT | '(' expr ')' | ('+' | '-') factor
//! ```

use std::collections::BTreeMap;

use crate::formula::token::{tokenize, Token, TokenKind};
use crate::formula::FormulaSyntaxError;

/// Binary operators of the grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Distinct referenced acronyms, in order of first appearance
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                if !out.iter().any(|v| v == name) {
                    out.push(name.clone());
                }
            }
            Expr::Negate(operand) => operand.collect_variables(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }

    /// Evaluate with plain floating-point arithmetic.
    ///
    /// A variable absent from the map evaluates to NaN, which the caller
    /// treats as an undefined result; the resolution step normally rules
    /// this out beforehand.
    pub fn eval(&self, variables: &BTreeMap<String, f64>) -> f64 {
        match self {
            Expr::Number(value) => *value,
            Expr::Variable(name) => variables.get(name).copied().unwrap_or(f64::NAN),
            Expr::Negate(operand) => -operand.eval(variables),
            Expr::Binary { op, lhs, rhs } => {
                let left = lhs.eval(variables);
                let right = rhs.eval(variables);
                match op {
                    BinaryOp::Add => left + right,
                    BinaryOp::Sub => left - right,
                    BinaryOp::Mul => left * right,
                    BinaryOp::Div => left / right,
                }
            }
        }
    }
}

/// Parse a formula string into an expression tree
pub fn parse(source: &str) -> Result<Expr, FormulaSyntaxError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(FormulaSyntaxError::new(
            "empty formula",
            source,
            0,
            source.len().max(1),
            Some("write an expression over measurement acronyms, e.g. 'HH / PF'".to_string()),
        ));
    }

    let mut parser = Parser {
        source,
        tokens: &tokens,
        pos: 0,
    };
    let expr = parser.expr()?;

    if let Some(extra) = parser.peek() {
        return Err(FormulaSyntaxError::new(
            format!("unexpected {} after expression", extra.kind.describe()),
            source,
            extra.offset,
            extra.len,
            None,
        ));
    }

    Ok(expr)
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<Expr, FormulaSyntaxError> {
        let mut lhs = self.term()?;

        while let Some(token) = self.peek() {
            let op = match token.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaSyntaxError> {
        let mut lhs = self.factor()?;

        while let Some(token) = self.peek() {
            let op = match token.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Expr, FormulaSyntaxError> {
        let token = match self.advance() {
            Some(token) => token,
            None => {
                return Err(FormulaSyntaxError::at_end(
                    "unexpected end of formula",
                    self.source,
                    Some("the formula ends where a value was expected".to_string()),
                ));
            }
        };

        match &token.kind {
            TokenKind::Number(value) => Ok(Expr::Number(*value)),
            TokenKind::Ident(name) => Ok(Expr::Variable(name.clone())),
            TokenKind::Minus => {
                let operand = self.factor()?;
                Ok(Expr::Negate(Box::new(operand)))
            }
            TokenKind::Plus => self.factor(),
            TokenKind::LParen => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(close) if close.kind == TokenKind::RParen => Ok(inner),
                    Some(other) => Err(FormulaSyntaxError::new(
                        format!("expected ')', found {}", other.kind.describe()),
                        self.source,
                        other.offset,
                        other.len,
                        None,
                    )),
                    None => Err(FormulaSyntaxError::new(
                        "unclosed parenthesis",
                        self.source,
                        token.offset,
                        token.len,
                        Some("add the matching ')'".to_string()),
                    )),
                }
            }
            other => Err(FormulaSyntaxError::new(
                format!("unexpected {}", other.describe()),
                self.source,
                token.offset,
                token.len,
                None,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_parse_division() {
        let expr = parse("HH / PF").unwrap();
        assert_eq!(expr.variables(), vec!["HH", "PF"]);
        assert_eq!(expr.eval(&vars(&[("HH", 100.0), ("PF", 10.0)])), 10.0);
    }

    #[test]
    fn test_precedence_multiplication_before_addition() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(expr.eval(&BTreeMap::new()), 7.0);

        let expr = parse("(1 + 2) * 3").unwrap();
        assert_eq!(expr.eval(&BTreeMap::new()), 9.0);
    }

    #[test]
    fn test_left_associativity() {
        let expr = parse("10 - 2 - 3").unwrap();
        assert_eq!(expr.eval(&BTreeMap::new()), 5.0);

        let expr = parse("100 / 10 / 2").unwrap();
        assert_eq!(expr.eval(&BTreeMap::new()), 5.0);
    }

    #[test]
    fn test_unary_sign() {
        let expr = parse("-HH + 5").unwrap();
        assert_eq!(expr.eval(&vars(&[("HH", 3.0)])), 2.0);

        let expr = parse("+(2 * 2)").unwrap();
        assert_eq!(expr.eval(&BTreeMap::new()), 4.0);
    }

    #[test]
    fn test_variables_deduplicated_in_first_appearance_order() {
        let expr = parse("B + A * B - A").unwrap();
        assert_eq!(expr.variables(), vec!["B", "A"]);
    }

    #[test]
    fn test_empty_formula_is_error() {
        let err = parse("").unwrap_err();
        assert!(err.message.contains("empty"));

        let err = parse("   ").unwrap_err();
        assert!(err.message.contains("empty"));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let err = parse("HH / (").unwrap_err();
        assert!(!err.message.is_empty());

        let err = parse("(HH + PF").unwrap_err();
        assert!(err.message.contains("unclosed parenthesis"));

        let err = parse("HH + PF)").unwrap_err();
        assert!(err.message.contains("unexpected"));
    }

    #[test]
    fn test_dangling_operator() {
        let err = parse("HH +").unwrap_err();
        assert!(err.message.contains("end of formula"));

        let err = parse("* HH").unwrap_err();
        assert!(err.message.contains("unexpected"));
    }

    #[test]
    fn test_adjacent_operands_rejected() {
        let err = parse("HH PF").unwrap_err();
        assert!(err.message.contains("after expression"));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = parse("HH / PF + 1").unwrap();
        let b = parse("HH / PF + 1").unwrap();
        assert_eq!(a, b);
    }
}
