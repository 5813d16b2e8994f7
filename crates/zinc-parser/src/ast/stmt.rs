//! Statement and declaration AST nodes for Zinc.

use zinc_core::Span;

use crate::ast::{Expr, Ident};

/// A statement inside a function body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// `expr;`
    Expression(ExprStmt<'ast>),
    /// `var`/`val` declaration
    Variable(&'ast VarDecl<'ast>),
    /// Nested function
    Function(&'ast FunctionDecl<'ast>),
    /// `{ ... }`
    Block(&'ast Block<'ast>),
    /// Struct declared inside a body
    Struct(&'ast StructDecl<'ast>),
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expression(stmt) => stmt.span,
            Stmt::Variable(decl) => decl.span,
            Stmt::Function(decl) => decl.span,
            Stmt::Block(block) => block.span,
            Stmt::Struct(decl) => decl.span,
        }
    }
}

/// An expression followed by `;`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}

/// `var name: Type = value;` or `val ...`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDecl<'ast> {
    /// `var` (true) or `val` (false)
    pub mutable: bool,
    pub name: Ident<'ast>,
    pub ty: Option<Ident<'ast>>,
    pub initializer: Option<&'ast Expr<'ast>>,
    /// From the keyword to `;`
    pub span: Span,
}

/// A function parameter `name: Type`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<'ast> {
    pub name: Ident<'ast>,
    pub ty: Ident<'ast>,
    pub span: Span,
}

/// `func name(params): Type { body }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDecl<'ast> {
    pub name: Ident<'ast>,
    pub params: &'ast [Param<'ast>],
    pub return_type: Option<Ident<'ast>>,
    pub body: &'ast [Stmt<'ast>],
    /// The signature, from `func` to the return type or `)`
    pub span: Span,
    /// From `{` to `}`
    pub body_span: Span,
}

/// A struct field declaration `name: Type`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDecl<'ast> {
    pub name: Ident<'ast>,
    pub ty: Ident<'ast>,
    pub span: Span,
}

/// `struct Name { fields }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructDecl<'ast> {
    pub name: Ident<'ast>,
    pub fields: &'ast [FieldDecl<'ast>],
    /// From `struct` to `}`
    pub span: Span,
}

/// A brace-delimited statement list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}
