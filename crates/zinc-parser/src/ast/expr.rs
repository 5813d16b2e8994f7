//! Expression AST nodes for Zinc.
//!
//! Every node records the span of exactly the tokens it was built from. The
//! span is computed once at construction, so two parsers that build the
//! same tree also agree on every span.

use zinc_core::Span;

use crate::ast::{BinaryOp, LogicalOp, UnaryOp};

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Number, char, string or boolean literal
    Literal(LiteralExpr<'ast>),
    /// `()`
    Unit(Span),
    /// Parenthesized expression
    Grouping(&'ast GroupingExpr<'ast>),
    /// `-x`, `!x`
    Unary(&'ast UnaryExpr<'ast>),
    /// Arithmetic, equality or comparison
    Binary(&'ast BinaryExpr<'ast>),
    /// `and` / `or`
    Logical(&'ast LogicalExpr<'ast>),
    /// Variable reference
    GetVariable(Ident<'ast>),
    /// `name = value`
    SetVariable(&'ast SetVariableExpr<'ast>),
    /// `object.field`
    GetField(&'ast GetFieldExpr<'ast>),
    /// `object.field = value`
    SetField(&'ast SetFieldExpr<'ast>),
    /// `callee(args)`
    Call(&'ast CallExpr<'ast>),
    /// `Name { field: value, ... }`
    InitStruct(&'ast InitStructExpr<'ast>),
    /// `return` with an optional value
    Return(&'ast ReturnExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Unit(span) => *span,
            Self::Grouping(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Logical(e) => e.span,
            Self::GetVariable(ident) => ident.span,
            Self::SetVariable(e) => e.span,
            Self::GetField(e) => e.span,
            Self::SetField(e) => e.span,
            Self::Call(e) => e.span,
            Self::InitStruct(e) => e.span,
            Self::Return(e) => e.span,
        }
    }

    /// Whether this node is an assignment of either kind.
    pub fn is_assignment(&self) -> bool {
        matches!(self, Self::SetVariable(_) | Self::SetField(_))
    }
}

/// A literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub value: Literal<'ast>,
    pub span: Span,
}

/// The value of a literal, with escapes already decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'ast> {
    Number(f64),
    Char(char),
    Str(&'ast str),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupingExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    /// From `(` to `)`
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub op_span: Span,
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub op_span: Span,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicalExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: LogicalOp,
    pub op_span: Span,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetVariableExpr<'ast> {
    pub name: Ident<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GetFieldExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub field: Ident<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetFieldExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub field: Ident<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: &'ast Expr<'ast>,
    pub args: &'ast [Expr<'ast>],
    /// From the start of the callee to `)`
    pub span: Span,
}

/// One `field: value` pair of a struct literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldInit<'ast> {
    pub name: Ident<'ast>,
    pub value: &'ast Expr<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitStructExpr<'ast> {
    pub name: Ident<'ast>,
    pub fields: &'ast [FieldInit<'ast>],
    /// From the struct name to `}`
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnExpr<'ast> {
    pub keyword: Span,
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}
