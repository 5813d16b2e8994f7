//! Recursive-descent expression parsing.
//!
//! One function per precedence level, from assignment down to primary.
//! The postfix and primary levels are also used by the reorder front end.

use crate::ast::{Expr, InfixOp, LogicalOp, UnaryOp};
use crate::lexer::TokenKind;

use super::{ParseResult, Parser};

impl<'ast> Parser<'ast> {
    /// Entry point for the recursive-descent front end.
    pub(crate) fn recursive_expression(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        let expr = self.or()?;
        if self.check(TokenKind::Equal) {
            self.check_assignment_target(expr)?;
            self.advance();
            let value = self.assignment()?;
            return self.make_assignment(expr, value);
        }
        Ok(expr)
    }

    /// Parse one left-associative level: `next (op next)*` for any token in `ops`.
    fn left_assoc(
        &mut self,
        ops: &[TokenKind],
        next: fn(&mut Self) -> ParseResult<&'ast Expr<'ast>>,
    ) -> ParseResult<&'ast Expr<'ast>> {
        let mut left = next(self)?;
        while ops.contains(&self.peek().kind) {
            let token = self.advance();
            let Some(op) = InfixOp::from_token(token.kind) else {
                break;
            };
            let right = next(self)?;
            left = self.make_infix(left, op, token.span, right);
        }
        Ok(left)
    }

    fn or(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        let mut left = self.and()?;
        while let Some(token) = self.eat(TokenKind::Or) {
            let right = self.and()?;
            left = self.make_infix(left, InfixOp::Logical(LogicalOp::Or), token.span, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        let mut left = self.equality()?;
        while let Some(token) = self.eat(TokenKind::And) {
            let right = self.equality()?;
            left = self.make_infix(left, InfixOp::Logical(LogicalOp::And), token.span, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        self.left_assoc(&[TokenKind::EqualEqual, TokenKind::BangEqual], Self::comparison)
    }

    fn comparison(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        self.left_assoc(
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        self.left_assoc(&[TokenKind::Plus, TokenKind::Minus], Self::factor)
    }

    fn factor(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        self.left_assoc(
            &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            Self::exponent,
        )
    }

    fn exponent(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        self.left_assoc(&[TokenKind::Caret], Self::unary_operand)
    }

    /// `!x`, `-x`, or a postfix expression.
    pub(crate) fn unary_operand(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        if let Some(op) = UnaryOp::from_token(self.peek().kind) {
            let token = self.advance();
            let operand = self.unary_operand()?;
            return Ok(self.make_unary(op, token.span, operand));
        }
        self.postfix()
    }

    /// A primary followed by any number of calls, field accesses and struct literals.
    fn postfix(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        let mut expr = self.primary()?;
        loop {
            expr = match self.peek().kind {
                TokenKind::LeftParen => {
                    self.advance();
                    self.finish_call(expr)?
                }
                TokenKind::Dot => {
                    self.advance();
                    self.finish_get_field(expr)?
                }
                TokenKind::LeftBrace => {
                    self.advance();
                    self.finish_init_struct(expr)?
                }
                _ => return Ok(expr),
            };
        }
    }

    fn primary(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        let token = self.advance();
        self.finish_primary(token)
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;

    use crate::ast::{BinaryOp, Expr, UnaryOp};
    use crate::{Parser, ParserKind};

    fn parse<'a>(source: &str, arena: &'a Bump) -> &'a Expr<'a> {
        match Parser::parse_expression(source, arena, ParserKind::Recursive) {
            Ok(expr) => expr,
            Err(errors) => panic!("parse failed for {source:?}: {errors}"),
        }
    }

    #[test]
    fn exponent_below_unary() {
        let arena = Bump::new();
        let Expr::Binary(pow) = parse("-2 ^ 2", &arena) else {
            panic!("expected binary");
        };
        assert_eq!(pow.op, BinaryOp::Pow);
        assert!(matches!(pow.left, Expr::Unary(neg) if neg.op == UnaryOp::Neg));
    }

    #[test]
    fn comparison_below_equality() {
        let arena = Bump::new();
        let Expr::Binary(eq) = parse("1 < 2 == true", &arena) else {
            panic!("expected binary");
        };
        assert_eq!(eq.op, BinaryOp::Equal);
        assert!(matches!(eq.left, Expr::Binary(lt) if lt.op == BinaryOp::Less));
    }

    #[test]
    fn nested_unary() {
        let arena = Bump::new();
        let Expr::Unary(outer) = parse("!!done", &arena) else {
            panic!("expected unary");
        };
        assert!(matches!(outer.operand, Expr::Unary(_)));
        assert_eq!(outer.span.range(), 0..6);
    }

    #[test]
    fn grouped_assignment_target_rejected() {
        let arena = Bump::new();
        let errors = Parser::parse_expression("(a) = 1", &arena, ParserKind::Recursive).unwrap_err();
        assert_eq!(
            errors.first().map(|e| e.message()),
            Some("Invalid assignment target.")
        );
    }
}
