//! Return path verification for value-returning functions.
//!
//! This module provides [`ReturnChecker`] which verifies that every way
//! through a function body evaluates a `return`.
//!
//! # Example
//!
//! ```ignore
//! let checker = ReturnChecker::new();
//! if !checker.all_paths_return(function.body) {
//!     // Error: function does not return a value on all paths
//! }
//! ```

use zinc_parser::ast::{Expr, Stmt};

/// Verifies all code paths return a value.
///
/// The language has no branching statements, so the only conditional code
/// is the right operand of `&&` and `||`. A body returns on all paths when
/// some statement, run in order, unconditionally evaluates a `return`.
/// Nested function declarations never count; their returns leave the
/// nested function.
pub struct ReturnChecker;

impl ReturnChecker {
    /// Create a new return checker.
    pub fn new() -> Self {
        Self
    }

    /// Check if every path through `body` evaluates a `return`.
    pub fn all_paths_return(&self, body: &[Stmt<'_>]) -> bool {
        body.iter().any(|stmt| self.statement_returns(stmt))
    }

    fn statement_returns(&self, stmt: &Stmt<'_>) -> bool {
        match stmt {
            Stmt::Expression(stmt) => self.expression_returns(stmt.expr),
            Stmt::Variable(decl) => decl
                .initializer
                .is_some_and(|init| self.expression_returns(init)),
            Stmt::Block(block) => self.all_paths_return(block.stmts),
            Stmt::Function(_) | Stmt::Struct(_) => false,
        }
    }

    /// Whether evaluating `expr` always reaches a `return`.
    fn expression_returns(&self, expr: &Expr<'_>) -> bool {
        match expr {
            Expr::Return(_) => true,
            Expr::Literal(_) | Expr::Unit(_) | Expr::GetVariable(_) => false,
            Expr::Grouping(e) => self.expression_returns(e.expr),
            Expr::Unary(e) => self.expression_returns(e.operand),
            Expr::Binary(e) => self.expression_returns(e.left) || self.expression_returns(e.right),
            // The right operand may be skipped
            Expr::Logical(e) => self.expression_returns(e.left),
            Expr::SetVariable(e) => self.expression_returns(e.value),
            Expr::GetField(e) => self.expression_returns(e.object),
            Expr::SetField(e) => {
                self.expression_returns(e.object) || self.expression_returns(e.value)
            }
            Expr::Call(e) => {
                self.expression_returns(e.callee)
                    || e.args.iter().any(|arg| self.expression_returns(arg))
            }
            Expr::InitStruct(e) => e
                .fields
                .iter()
                .any(|field| self.expression_returns(field.value)),
        }
    }
}

impl Default for ReturnChecker {
    fn default() -> Self {
        Self::new()
    }
}
