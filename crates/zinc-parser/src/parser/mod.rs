//! Parser infrastructure for Zinc.
//!
//! Provides the main [`Parser`] struct with token navigation, error
//! reporting and the node constructors shared by every expression front end.
//!
//! Declarations and statements are parsed by one shared implementation
//! (`decl.rs`). Expressions are parsed by one of three interchangeable front
//! ends selected with [`ParserKind`]:
//!
//! - `pratt.rs`: precedence climbing driven by a per-token rule table
//! - `recursive.rs`: one function per precedence level
//! - `reorder.rs`: a flat operand/operator scan rebuilt with an operator stack
//!
//! All three build nodes through the constructors in this file, so for the
//! same input they produce equal trees, spans included.

mod decl;
mod literal;
mod pratt;
mod recursive;
mod reorder;

use bumpalo::Bump;
use zinc_core::{CompilerError, CompilerErrors, Span};

use crate::ast::{
    BinaryExpr, CallExpr, Expr, FieldInit, GetFieldExpr, GroupingExpr, Ident, InfixOp,
    InitStructExpr, LogicalExpr, Program, ReturnExpr, SetFieldExpr, SetVariableExpr, UnaryExpr,
    UnaryOp,
};
use crate::lexer::{Lexer, Token, TokenKind};

pub(crate) const INVALID_ASSIGNMENT_TARGET: &str = "Invalid assignment target.";
pub(crate) const INVALID_INIT_TARGET: &str = "Invalid struct initialization target.";
pub(crate) const EXPECTED_EXPRESSION: &str = "Expected expression.";

/// Which expression front end a [`Parser`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParserKind {
    /// Table-driven precedence climbing.
    #[default]
    Pratt,
    /// Plain recursive descent.
    Recursive,
    /// Flat scan reordered by precedence.
    Reorder,
}

impl ParserKind {
    /// Every front end, for equivalence testing and benchmarks.
    pub const ALL: [ParserKind; 3] = [ParserKind::Pratt, ParserKind::Recursive, ParserKind::Reorder];
}

/// Marker for "an error was already recorded; abandon this declaration".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParseAbort;

pub(crate) type ParseResult<T> = Result<T, ParseAbort>;

/// The parser for Zinc source code.
///
/// The source is tokenized eagerly into a buffer. Lexer errors are recorded
/// up front; the parser stays silent when it later trips over the matching
/// error token so each problem is reported once.
///
/// The `'ast` lifetime refers to the arena where AST nodes and token
/// lexemes are allocated.
pub struct Parser<'ast> {
    /// Buffered tokens, always ending with EOF
    pub(crate) buffer: Vec<Token<'ast>>,
    /// Current position in the buffer
    pub(crate) position: usize,
    /// Accumulated errors
    pub(crate) errors: CompilerErrors,
    /// Arena allocator for AST nodes
    pub(crate) arena: &'ast Bump,
    /// Expression front end
    pub(crate) kind: ParserKind,
    /// Number of function bodies currently open; `return` is legal when non-zero
    pub(crate) function_depth: u32,
    /// Number of `{` consumed and not yet closed in the current declaration
    pub(crate) brace_depth: u32,
}

impl<'ast> Parser<'ast> {
    /// Create a new parser for the given source code.
    pub fn new(source: &str, arena: &'ast Bump, kind: ParserKind) -> Self {
        let (buffer, errors) = Lexer::new(source, arena).tokenize();
        Self {
            buffer,
            position: 0,
            errors,
            arena,
            kind,
            function_depth: 0,
            brace_depth: 0,
        }
    }

    /// Parse a whole program, failing if any error was reported.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(
        source: &str,
        arena: &'ast Bump,
        kind: ParserKind,
    ) -> Result<Program<'ast>, CompilerErrors> {
        let (program, errors) = Self::parse_lenient(source, arena, kind);
        if errors.is_empty() {
            Ok(program)
        } else {
            Err(errors)
        }
    }

    /// Parse a whole program, returning the best-effort tree alongside any errors.
    pub fn parse_lenient(
        source: &str,
        arena: &'ast Bump,
        kind: ParserKind,
    ) -> (Program<'ast>, CompilerErrors) {
        let mut parser = Self::new(source, arena, kind);
        let program = parser.program();
        (program, parser.take_errors())
    }

    /// Parse a single expression that must span the whole input.
    pub fn parse_expression(
        source: &str,
        arena: &'ast Bump,
        kind: ParserKind,
    ) -> Result<&'ast Expr<'ast>, CompilerErrors> {
        let mut parser = Self::new(source, arena, kind);
        let result = parser.expression().and_then(|expr| {
            if parser.is_eof() {
                Ok(expr)
            } else {
                let token = parser.peek();
                Err(parser.error_at(token, "Expected end of expression."))
            }
        });
        match result {
            Ok(expr) if parser.errors.is_empty() => Ok(expr),
            _ => Err(parser.take_errors()),
        }
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take the errors, leaving an empty error collection.
    pub fn take_errors(&mut self) -> CompilerErrors {
        std::mem::take(&mut self.errors)
    }

    /// Parse an expression with the configured front end.
    pub(crate) fn expression(&mut self) -> ParseResult<&'ast Expr<'ast>> {
        match self.kind {
            ParserKind::Pratt => self.pratt_expression(),
            ParserKind::Recursive => self.recursive_expression(),
            ParserKind::Reorder => self.reorder_expression(),
        }
    }

    // ========================================================================
    // Token Navigation
    // ========================================================================

    /// Peek at the current token without consuming it.
    pub(crate) fn peek(&self) -> Token<'ast> {
        self.buffer[self.position.min(self.buffer.len() - 1)]
    }

    /// The most recently consumed token.
    pub(crate) fn previous(&self) -> Token<'ast> {
        self.buffer[self.position.saturating_sub(1).min(self.buffer.len() - 1)]
    }

    /// Get the current token and advance to the next. Never moves past EOF.
    pub(crate) fn advance(&mut self) -> Token<'ast> {
        let token = self.peek();
        match token.kind {
            TokenKind::Eof => return token,
            TokenKind::LeftBrace => self.brace_depth += 1,
            TokenKind::RightBrace => self.brace_depth = self.brace_depth.saturating_sub(1),
            _ => {}
        }
        self.position += 1;
        token
    }

    /// Check if the current token matches the given kind.
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Check if the current token is EOF.
    pub(crate) fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// If the current token matches the given kind, consume it and return Some.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume a token of the given kind or report `message` at the current token.
    pub(crate) fn expect(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token<'ast>> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(self.error_at(token, message))
        }
    }

    /// Consume an identifier, returning it as an [`Ident`].
    pub(crate) fn expect_ident(&mut self, message: &str) -> ParseResult<Ident<'ast>> {
        let token = self.expect(TokenKind::Identifier, message)?;
        Ok(Ident::new(token.lexeme, token.span))
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Record an error at a token.
    ///
    /// Error tokens were already reported by the lexer and are not reported again.
    pub(crate) fn error_at(&mut self, token: Token<'ast>, message: impl Into<String>) -> ParseAbort {
        if token.kind != TokenKind::Error {
            self.errors
                .push(CompilerError::token(token.span, token.lexeme, message));
        }
        ParseAbort
    }

    /// Record an error covering a range of source.
    pub(crate) fn error_range(&mut self, span: Span, message: impl Into<String>) -> ParseAbort {
        self.errors.push(CompilerError::one_range(span, message));
        ParseAbort
    }

    /// Skip tokens until the next top-level declaration.
    ///
    /// A declaration keyword only counts when it sits outside every brace
    /// opened since `decl_start`, so a broken function body is skipped whole.
    pub(crate) fn synchronize(&mut self, decl_start: usize) {
        while !self.is_eof() {
            let token = self.peek();
            if self.position > decl_start
                && self.brace_depth == 0
                && token.kind.starts_declaration()
            {
                return;
            }
            self.advance();
        }
    }

    // ========================================================================
    // Node Construction
    // ========================================================================

    pub(crate) fn alloc(&self, expr: Expr<'ast>) -> &'ast Expr<'ast> {
        self.arena.alloc(expr)
    }

    /// Build a binary or logical node.
    pub(crate) fn make_infix(
        &self,
        left: &'ast Expr<'ast>,
        op: InfixOp,
        op_span: Span,
        right: &'ast Expr<'ast>,
    ) -> &'ast Expr<'ast> {
        let span = left.span().merge(right.span());
        let expr = match op {
            InfixOp::Binary(op) => Expr::Binary(self.arena.alloc(BinaryExpr {
                left,
                op,
                op_span,
                right,
                span,
            })),
            InfixOp::Logical(op) => Expr::Logical(self.arena.alloc(LogicalExpr {
                left,
                op,
                op_span,
                right,
                span,
            })),
        };
        self.alloc(expr)
    }

    pub(crate) fn make_unary(
        &self,
        op: UnaryOp,
        op_span: Span,
        operand: &'ast Expr<'ast>,
    ) -> &'ast Expr<'ast> {
        self.alloc(Expr::Unary(self.arena.alloc(UnaryExpr {
            op,
            op_span,
            operand,
            span: op_span.merge(operand.span()),
        })))
    }

    /// Report an error unless `target` can be assigned to.
    pub(crate) fn check_assignment_target(&mut self, target: &'ast Expr<'ast>) -> ParseResult<()> {
        match target {
            Expr::GetVariable(_) | Expr::GetField(_) => Ok(()),
            _ => Err(self.error_range(target.span(), INVALID_ASSIGNMENT_TARGET)),
        }
    }

    /// Turn a variable or field read into the matching write.
    pub(crate) fn make_assignment(
        &mut self,
        target: &'ast Expr<'ast>,
        value: &'ast Expr<'ast>,
    ) -> ParseResult<&'ast Expr<'ast>> {
        let span = target.span().merge(value.span());
        let expr = match target {
            Expr::GetVariable(name) => Expr::SetVariable(self.arena.alloc(SetVariableExpr {
                name: *name,
                value,
                span,
            })),
            Expr::GetField(get) => Expr::SetField(self.arena.alloc(SetFieldExpr {
                object: get.object,
                field: get.field,
                value,
                span,
            })),
            _ => return Err(self.error_range(target.span(), INVALID_ASSIGNMENT_TARGET)),
        };
        Ok(self.alloc(expr))
    }

    /// Parse the rest of `( ... )` after the opening parenthesis: a grouping or `()`.
    pub(crate) fn finish_grouping(&mut self, open: Token<'ast>) -> ParseResult<&'ast Expr<'ast>> {
        if let Some(close) = self.eat(TokenKind::RightParen) {
            return Ok(self.alloc(Expr::Unit(open.span.merge(close.span))));
        }
        let expr = self.expression()?;
        let close = self.expect(TokenKind::RightParen, "Expected ')' after expression.")?;
        Ok(self.alloc(Expr::Grouping(self.arena.alloc(GroupingExpr {
            expr,
            span: open.span.merge(close.span),
        }))))
    }

    /// Parse call arguments after the opening parenthesis.
    pub(crate) fn finish_call(&mut self, callee: &'ast Expr<'ast>) -> ParseResult<&'ast Expr<'ast>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(*self.expression()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RightParen, "Expected ')' after function arguments.")?;
        Ok(self.alloc(Expr::Call(self.arena.alloc(CallExpr {
            callee,
            args: self.arena.alloc_slice_copy(&args),
            span: callee.span().merge(close.span),
        }))))
    }

    /// Parse the field name after `.`.
    pub(crate) fn finish_get_field(
        &mut self,
        object: &'ast Expr<'ast>,
    ) -> ParseResult<&'ast Expr<'ast>> {
        let field = self.expect_ident("Expected field name after '.'.")?;
        Ok(self.alloc(Expr::GetField(self.arena.alloc(GetFieldExpr {
            object,
            field,
            span: object.span().merge(field.span),
        }))))
    }

    /// Parse a struct literal's fields after `{`. The target must be a bare name.
    pub(crate) fn finish_init_struct(
        &mut self,
        target: &'ast Expr<'ast>,
    ) -> ParseResult<&'ast Expr<'ast>> {
        let Expr::GetVariable(name) = *target else {
            return Err(self.error_range(target.span(), INVALID_INIT_TARGET));
        };

        let mut fields = Vec::new();
        if !self.check(TokenKind::RightBrace) {
            loop {
                let field = self.expect_ident("Expected field name in struct initialization.")?;
                self.expect(TokenKind::Colon, "Expected ':' after field name.")?;
                let value = self.expression()?;
                fields.push(FieldInit { name: field, value });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RightBrace, "Expected '}' after struct initialization.")?;

        Ok(self.alloc(Expr::InitStruct(self.arena.alloc(InitStructExpr {
            name,
            fields: self.arena.alloc_slice_copy(&fields),
            span: name.span.merge(close.span),
        }))))
    }

    /// Parse the rest of a `return` expression after the keyword.
    pub(crate) fn finish_return(&mut self, keyword: Token<'ast>) -> ParseResult<&'ast Expr<'ast>> {
        if self.function_depth == 0 {
            return Err(self.error_at(keyword, "Cannot return from top-level code."));
        }

        let value = match self.peek().kind {
            TokenKind::RightParen
            | TokenKind::Semicolon
            | TokenKind::Comma
            | TokenKind::RightBrace
            | TokenKind::Eof => None,
            _ => Some(self.expression()?),
        };
        let span = match value {
            Some(value) => keyword.span.merge(value.span()),
            None => keyword.span,
        };

        Ok(self.alloc(Expr::Return(self.arena.alloc(ReturnExpr {
            keyword: keyword.span,
            value,
            span,
        }))))
    }

    /// Parse a literal or identifier token that has already been consumed.
    pub(crate) fn finish_primary(&mut self, token: Token<'ast>) -> ParseResult<&'ast Expr<'ast>> {
        match token.kind {
            TokenKind::Identifier => Ok(self.alloc(Expr::GetVariable(Ident::new(
                token.lexeme,
                token.span,
            )))),
            TokenKind::Number
            | TokenKind::String
            | TokenKind::Char
            | TokenKind::True
            | TokenKind::False => self.literal(token),
            TokenKind::LeftParen => self.finish_grouping(token),
            TokenKind::Return => self.finish_return(token),
            _ => Err(self.error_at(token, EXPECTED_EXPRESSION)),
        }
    }
}
