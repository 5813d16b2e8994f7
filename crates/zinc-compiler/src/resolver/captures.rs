//! Free-variable scan for nested functions.
//!
//! Before a nested function body is compiled, its free names are collected
//! so the enclosing function can load their values and pack them into the
//! closure. A name is free when it is read or assigned in the body (or in a
//! function nested inside it) without being bound by a parameter or an
//! earlier declaration in an enclosing block of the body.

use rustc_hash::FxHashSet;
use zinc_parser::ast::{Expr, FunctionDecl, Ident, Stmt};

/// Names used by `function` but not bound inside it, in first-use order.
///
/// Each name appears once, carrying the span of its first use.
pub fn free_variables<'ast>(function: &FunctionDecl<'ast>) -> Vec<Ident<'ast>> {
    let mut scan = FreeVariables::default();
    scan.function(function);
    scan.found
}

/// Names used by a top-level expression, in first-use order.
pub fn expression_free_variables<'ast>(expr: &Expr<'ast>) -> Vec<Ident<'ast>> {
    let mut scan = FreeVariables::default();
    scan.expression(expr);
    scan.found
}

#[derive(Default)]
struct FreeVariables<'ast> {
    bound: Vec<FxHashSet<&'ast str>>,
    seen: FxHashSet<&'ast str>,
    found: Vec<Ident<'ast>>,
}

impl<'ast> FreeVariables<'ast> {
    fn function(&mut self, function: &FunctionDecl<'ast>) {
        self.bound
            .push(function.params.iter().map(|param| param.name.name).collect());
        self.statements(function.body);
        self.bound.pop();
    }

    fn statements(&mut self, stmts: &[Stmt<'ast>]) {
        for stmt in stmts {
            self.statement(stmt);
        }
    }

    fn statement(&mut self, stmt: &Stmt<'ast>) {
        match stmt {
            Stmt::Expression(stmt) => self.expression(stmt.expr),
            Stmt::Variable(decl) => {
                if let Some(initializer) = decl.initializer {
                    self.expression(initializer);
                }
                self.bind(decl.name.name);
            }
            Stmt::Function(decl) => {
                self.bind(decl.name.name);
                self.function(decl);
            }
            Stmt::Block(block) => {
                self.bound.push(FxHashSet::default());
                self.statements(block.stmts);
                self.bound.pop();
            }
            Stmt::Struct(_) => {}
        }
    }

    fn expression(&mut self, expr: &Expr<'ast>) {
        match expr {
            Expr::Literal(_) | Expr::Unit(_) => {}
            Expr::Grouping(e) => self.expression(e.expr),
            Expr::Unary(e) => self.expression(e.operand),
            Expr::Binary(e) => {
                self.expression(e.left);
                self.expression(e.right);
            }
            Expr::Logical(e) => {
                self.expression(e.left);
                self.expression(e.right);
            }
            Expr::GetVariable(name) => self.reference(*name),
            Expr::SetVariable(e) => {
                self.expression(e.value);
                self.reference(e.name);
            }
            Expr::GetField(e) => self.expression(e.object),
            Expr::SetField(e) => {
                self.expression(e.object);
                self.expression(e.value);
            }
            Expr::Call(e) => {
                self.expression(e.callee);
                for arg in e.args {
                    self.expression(arg);
                }
            }
            Expr::InitStruct(e) => {
                for field in e.fields {
                    self.expression(field.value);
                }
            }
            Expr::Return(e) => {
                if let Some(value) = e.value {
                    self.expression(value);
                }
            }
        }
    }

    fn bind(&mut self, name: &'ast str) {
        if let Some(scope) = self.bound.last_mut() {
            scope.insert(name);
        }
    }

    fn reference(&mut self, name: Ident<'ast>) {
        let is_bound = self.bound.iter().any(|scope| scope.contains(name.name));
        if !is_bound && self.seen.insert(name.name) {
            self.found.push(name);
        }
    }
}
