//! Pratt (precedence climbing) expression parsing.
//!
//! Every token kind owns a [`ParseRule`]: a precedence plus optional prefix
//! and infix handlers. [`Parser::parse_precedence`] runs the prefix handler
//! of the first token, then keeps folding in infix operators while their
//! precedence is at least the requested minimum.

use crate::ast::{Expr, Ident, InfixOp, Precedence, UnaryOp};
use crate::lexer::TokenKind;

use super::{EXPECTED_EXPRESSION, ParseResult, Parser};

type PrefixFn<'ast> = fn(&mut Parser<'ast>, bool) -> ParseResult<&'ast Expr<'ast>>;
type InfixFn<'ast> =
    fn(&mut Parser<'ast>, &'ast Expr<'ast>, bool) -> ParseResult<&'ast Expr<'ast>>;

/// One row of the rule table.
struct ParseRule<'ast> {
    precedence: Precedence,
    prefix: Option<PrefixFn<'ast>>,
    infix: Option<InfixFn<'ast>>,
}

impl<'ast> ParseRule<'ast> {
    fn new(
        precedence: Precedence,
        prefix: Option<PrefixFn<'ast>>,
        infix: Option<InfixFn<'ast>>,
    ) -> Self {
        Self {
            precedence,
            prefix,
            infix,
        }
    }
}

impl<'ast> Parser<'ast> {
    /// Entry point for the Pratt front end.
    pub(crate) fn pratt_expression(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        self.parse_precedence(Precedence::Assignment)
    }

    fn rule(kind: TokenKind) -> ParseRule<'ast> {
        use Precedence as P;
        use TokenKind::*;

        match kind {
            LeftParen => ParseRule::new(P::Call, Some(Self::grouping), Some(Self::call)),
            Dot => ParseRule::new(P::Call, None, Some(Self::dot)),
            LeftBrace => ParseRule::new(P::Init, None, Some(Self::init_struct)),
            Minus => ParseRule::new(P::Term, Some(Self::unary), Some(Self::binary)),
            Plus => ParseRule::new(P::Term, None, Some(Self::binary)),
            Slash | Star | Percent => ParseRule::new(P::Factor, None, Some(Self::binary)),
            Caret => ParseRule::new(P::Exponent, None, Some(Self::binary)),
            Bang => ParseRule::new(P::None, Some(Self::unary), None),
            BangEqual | EqualEqual => ParseRule::new(P::Equality, None, Some(Self::binary)),
            Greater | GreaterEqual | Less | LessEqual => {
                ParseRule::new(P::Comparison, None, Some(Self::binary))
            }
            And => ParseRule::new(P::And, None, Some(Self::binary)),
            Or => ParseRule::new(P::Or, None, Some(Self::binary)),
            Identifier => ParseRule::new(P::None, Some(Self::variable), None),
            Number | String | Char | True | False => {
                ParseRule::new(P::None, Some(Self::literal_prefix), None)
            }
            Return => ParseRule::new(P::None, Some(Self::return_prefix), None),
            _ => ParseRule::new(P::None, None, None),
        }
    }

    pub(crate) fn parse_precedence(
        &mut self,
        min: Precedence,
    ) -> ParseResult<&'ast Expr<'ast>> {
        let token = self.advance();
        let can_assign = min <= Precedence::Assignment;

        let Some(prefix) = Self::rule(token.kind).prefix else {
            return Err(self.error_at(token, EXPECTED_EXPRESSION));
        };
        let mut left = prefix(self, can_assign)?;

        while min <= Self::rule(self.peek().kind).precedence {
            let Some(infix) = Self::rule(self.peek().kind).infix else {
                break;
            };
            self.advance();
            left = infix(self, left, can_assign)?;
        }

        if can_assign && self.check(TokenKind::Equal) {
            self.check_assignment_target(left)?;
        }

        Ok(left)
    }

    // ========================================================================
    // Prefix handlers
    // ========================================================================

    fn grouping(&mut self, _can_assign: bool) -> ParseResult<&'ast Expr<'ast>> {
        let open = self.previous();
        self.finish_grouping(open)
    }

    fn unary(&mut self, _can_assign: bool) -> ParseResult<&'ast Expr<'ast>> {
        let token = self.previous();
        let Some(op) = UnaryOp::from_token(token.kind) else {
            return Err(self.error_at(token, EXPECTED_EXPRESSION));
        };
        let operand = self.parse_precedence(Precedence::Unary)?;
        Ok(self.make_unary(op, token.span, operand))
    }

    fn variable(&mut self, can_assign: bool) -> ParseResult<&'ast Expr<'ast>> {
        let token = self.previous();
        let target = self.alloc(Expr::GetVariable(Ident::new(token.lexeme, token.span)));
        if can_assign && self.eat(TokenKind::Equal).is_some() {
            let value = self.pratt_expression()?;
            return self.make_assignment(target, value);
        }
        Ok(target)
    }

    fn literal_prefix(&mut self, _can_assign: bool) -> ParseResult<&'ast Expr<'ast>> {
        let token = self.previous();
        self.literal(token)
    }

    fn return_prefix(&mut self, _can_assign: bool) -> ParseResult<&'ast Expr<'ast>> {
        let keyword = self.previous();
        self.finish_return(keyword)
    }

    // ========================================================================
    // Infix handlers
    // ========================================================================

    fn binary(
        &mut self,
        left: &'ast Expr<'ast>,
        _can_assign: bool,
    ) -> ParseResult<&'ast Expr<'ast>> {
        let token = self.previous();
        let Some(op) = InfixOp::from_token(token.kind) else {
            return Err(self.error_at(token, EXPECTED_EXPRESSION));
        };
        let right = self.parse_precedence(op.precedence().next())?;
        Ok(self.make_infix(left, op, token.span, right))
    }

    fn call(&mut self, callee: &'ast Expr<'ast>, _can_assign: bool) -> ParseResult<&'ast Expr<'ast>> {
        self.finish_call(callee)
    }

    fn dot(&mut self, object: &'ast Expr<'ast>, can_assign: bool) -> ParseResult<&'ast Expr<'ast>> {
        let target = self.finish_get_field(object)?;
        if can_assign && self.eat(TokenKind::Equal).is_some() {
            let value = self.pratt_expression()?;
            return self.make_assignment(target, value);
        }
        Ok(target)
    }

    fn init_struct(
        &mut self,
        target: &'ast Expr<'ast>,
        _can_assign: bool,
    ) -> ParseResult<&'ast Expr<'ast>> {
        self.finish_init_struct(target)
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;

    use crate::ast::{BinaryOp, Expr, Literal, LogicalOp};
    use crate::{Parser, ParserKind};

    fn parse<'a>(source: &str, arena: &'a Bump) -> &'a Expr<'a> {
        match Parser::parse_expression(source, arena, ParserKind::Pratt) {
            Ok(expr) => expr,
            Err(errors) => panic!("parse failed for {source:?}: {errors}"),
        }
    }

    #[test]
    fn factor_binds_tighter_than_term() {
        let arena = Bump::new();
        let Expr::Binary(add) = parse("1 + 2 * 3", &arena) else {
            panic!("expected binary");
        };
        assert_eq!(add.op, BinaryOp::Add);
        assert!(matches!(add.right, Expr::Binary(mul) if mul.op == BinaryOp::Mul));
    }

    #[test]
    fn operators_are_left_associative() {
        let arena = Bump::new();
        let Expr::Binary(outer) = parse("8 - 4 - 2", &arena) else {
            panic!("expected binary");
        };
        assert!(matches!(outer.left, Expr::Binary(inner) if inner.op == BinaryOp::Sub));
        assert!(matches!(
            outer.right,
            Expr::Literal(lit) if lit.value == Literal::Number(2.0)
        ));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let arena = Bump::new();
        let Expr::Logical(or) = parse("a or b and c", &arena) else {
            panic!("expected logical");
        };
        assert_eq!(or.op, LogicalOp::Or);
        assert!(matches!(or.right, Expr::Logical(and) if and.op == LogicalOp::And));
    }

    #[test]
    fn postfix_chain() {
        let arena = Bump::new();
        let expr = parse("make(1).field", &arena);
        let Expr::GetField(get) = expr else {
            panic!("expected field access");
        };
        assert!(matches!(get.object, Expr::Call(call) if call.args.len() == 1));
        assert_eq!(expr.span().range(), 0..13);
    }

    #[test]
    fn assignment_is_right_associative() {
        let arena = Bump::new();
        let Expr::SetVariable(outer) = parse("a = b = 1", &arena) else {
            panic!("expected assignment");
        };
        assert_eq!(outer.name.name, "a");
        assert!(matches!(outer.value, Expr::SetVariable(inner) if inner.name.name == "b"));
    }

    #[test]
    fn field_assignment() {
        let arena = Bump::new();
        let Expr::SetField(set) = parse("p.x = 3", &arena) else {
            panic!("expected field assignment");
        };
        assert_eq!(set.field.name, "x");
    }

    #[test]
    fn invalid_assignment_target() {
        let arena = Bump::new();
        let errors = Parser::parse_expression("a + b = c", &arena, ParserKind::Pratt).unwrap_err();
        let error = errors.first().unwrap();
        assert_eq!(error.message(), "Invalid assignment target.");
        assert_eq!(error.primary_span().range(), 0..5);
    }

    #[test]
    fn struct_literal() {
        let arena = Bump::new();
        let Expr::InitStruct(init) = parse("Point { x: 1, y: 2 }", &arena) else {
            panic!("expected struct literal");
        };
        assert_eq!(init.name.name, "Point");
        assert_eq!(init.fields.len(), 2);
        assert_eq!(init.span.range(), 0..20);
    }

    #[test]
    fn struct_literal_needs_a_name() {
        let arena = Bump::new();
        let errors = Parser::parse_expression("f() { x: 1 }", &arena, ParserKind::Pratt).unwrap_err();
        assert_eq!(
            errors.first().map(|e| e.message()),
            Some("Invalid struct initialization target.")
        );
    }

    #[test]
    fn unit_and_grouping() {
        let arena = Bump::new();
        assert!(matches!(parse("()", &arena), Expr::Unit(_)));
        assert!(matches!(parse("(1)", &arena), Expr::Grouping(_)));
    }

    #[test]
    fn missing_prefix_reports_expected_expression() {
        let arena = Bump::new();
        let errors = Parser::parse_expression("* 2", &arena, ParserKind::Pratt).unwrap_err();
        assert_eq!(errors.first().map(|e| e.message()), Some("Expected expression."));
    }
}
