//! Reorder expression parsing.
//!
//! Reads an expression as a flat sequence `operand (operator operand)*`
//! without looking at precedence, then rebuilds the tree with an operator
//! stack: before an operator is pushed, every stacked operator that binds at
//! least as tightly is reduced. Operands are unary/postfix expressions,
//! parsed by the recursive-descent front end.

use zinc_core::Span;

use crate::ast::{Expr, InfixOp};
use crate::lexer::TokenKind;

use super::{ParseResult, Parser};

impl<'ast> Parser<'ast> {
    /// Entry point for the reorder front end.
    pub(crate) fn reorder_expression(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        let expr = self.operator_sequence()?;
        if self.check(TokenKind::Equal) {
            self.check_assignment_target(expr)?;
            self.advance();
            let value = self.reorder_expression()?;
            return self.make_assignment(expr, value);
        }
        Ok(expr)
    }

    fn operator_sequence(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        let mut operands = vec![self.unary_operand()?];
        let mut operators: Vec<(InfixOp, Span)> = Vec::new();

        while let Some(op) = InfixOp::from_token(self.peek().kind) {
            let token = self.advance();
            let operand = self.unary_operand()?;

            while let Some(&(top, _)) = operators.last() {
                if top.precedence() < op.precedence() {
                    break;
                }
                self.reduce(&mut operands, &mut operators);
            }

            operators.push((op, token.span));
            operands.push(operand);
        }

        while !operators.is_empty() {
            self.reduce(&mut operands, &mut operators);
        }

        match operands.pop() {
            Some(expr) => Ok(expr),
            None => {
                let token = self.peek();
                Err(self.error_at(token, super::EXPECTED_EXPRESSION))
            }
        }
    }

    /// Combine the top operator with the top two operands.
    fn reduce(&self, operands: &mut Vec<&'ast Expr<'ast>>, operators: &mut Vec<(InfixOp, Span)>) {
        let (Some((op, op_span)), Some(right), Some(left)) =
            (operators.pop(), operands.pop(), operands.pop())
        else {
            return;
        };
        operands.push(self.make_infix(left, op, op_span, right));
    }
}
