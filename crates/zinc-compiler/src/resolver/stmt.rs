//! Statement compilation.
//!
//! Errors never cross a statement boundary: a failing statement is recorded
//! and compilation picks up with the next one in the same body.

use zinc_parser::ast::{Block, Expr, ExprStmt, Stmt};

use super::{Resolver, Result};
use crate::bytecode::OpCode;
use crate::types::Type;

impl Resolver {
    /// Compile a statement list, recording each failing statement's error.
    pub(super) fn statements(&mut self, stmts: &[Stmt<'_>]) {
        for stmt in stmts {
            let result = self.statement(stmt);
            self.collect(result);
        }
    }

    fn statement(&mut self, stmt: &Stmt<'_>) -> Result<()> {
        match stmt {
            Stmt::Expression(stmt) => self.expression_statement(stmt),
            Stmt::Variable(decl) => self.variable(decl),
            Stmt::Function(decl) => self.nested_function(decl),
            Stmt::Struct(decl) => self.local_struct(decl),
            Stmt::Block(block) => {
                self.block(block);
                Ok(())
            }
        }
    }

    /// `expr;`
    ///
    /// The value is printed unless the expression is run for its effect:
    /// assignments, calls and unit values are discarded, and an expression
    /// that always returns leaves nothing behind.
    fn expression_statement(&mut self, stmt: &ExprStmt<'_>) -> Result<()> {
        let ty = self.expression(stmt.expr)?;
        if ty == Type::Nothing {
            return Ok(());
        }

        let inner = ungroup(stmt.expr);
        self.emitter.set_span(stmt.span);
        if ty == Type::Unit || inner.is_assignment() || matches!(inner, Expr::Call(_)) {
            self.emitter.emit_pop();
        } else {
            self.emitter.emit(OpCode::Print);
        }
        Ok(())
    }

    /// Compile a block, then drop the locals it declared.
    fn block(&mut self, block: &Block<'_>) {
        self.scopes.push_block();
        self.statements(block.stmts);
        let locals = self.scopes.pop();

        self.emitter.set_span(block.span);
        for _ in 0..locals {
            self.emitter.emit_pop();
        }
    }
}

fn ungroup<'a, 'ast>(mut expr: &'a Expr<'ast>) -> &'a Expr<'ast> {
    while let Expr::Grouping(group) = expr {
        expr = group.expr;
    }
    expr
}

#[cfg(test)]
mod tests {
    use zinc_core::Span;
    use zinc_parser::ast::{Expr, Ident, Program, ReturnExpr, VarDecl};

    use super::super::Resolver;
    use super::super::tests::{compile_ok, messages};
    use crate::bytecode::OpCode;

    #[test]
    fn bare_values_are_printed() {
        let chunk = compile_ok(r#"func main() { "hi"; (1 + 2); }"#);
        chunk.assert_function_opcodes(
            "main",
            &[
                OpCode::Const,
                OpCode::Print,
                OpCode::CreateNum,
                OpCode::CreateNum,
                OpCode::Add,
                OpCode::Print,
                OpCode::Return,
            ],
        );
    }

    #[test]
    fn assignments_are_discarded() {
        let chunk = compile_ok("func main() { var x = 1; (x = 2); }");
        chunk.assert_function_opcodes(
            "main",
            &[
                OpCode::CreateNum,
                OpCode::CreateNum,
                OpCode::SetStack,
                OpCode::Pop,
                OpCode::Return,
            ],
        );
    }

    #[test]
    fn unit_values_are_discarded() {
        let chunk = compile_ok("func main() { (); }");
        chunk.assert_function_opcodes("main", &[OpCode::None, OpCode::Pop, OpCode::Return]);
    }

    #[test]
    fn blocks_pop_their_locals() {
        let chunk = compile_ok("func main() { { val a = 1; val b = 2; b; } }");
        chunk.assert_function_opcodes(
            "main",
            &[
                OpCode::CreateNum,
                OpCode::CreateNum,
                OpCode::GetStack,
                OpCode::Print,
                OpCode::Pop,
                OpCode::Pop,
                OpCode::Return,
            ],
        );
    }

    #[test]
    fn block_locals_follow_enclosing_slots() {
        let chunk = compile_ok("func main() { val a = 1; { val b = 2; b; } }");
        let start = chunk.function("main").unwrap().start;
        // CREATE_NUM 1, CREATE_NUM 2, GET_STACK 1
        assert_eq!(chunk.read_op(start + 6), Some(OpCode::GetStack));
        assert_eq!(chunk.read_byte(start + 7), Some(1));
    }

    #[test]
    fn block_names_end_with_the_block() {
        assert_eq!(
            messages("func main() { { val a = 1; } a; }"),
            ["Variable 'a' does not exist in the current scope."]
        );
    }

    #[test]
    fn shadowing_in_inner_block() {
        compile_ok("func main() { val a = 1; { val a = \"s\"; a; } a; }");
    }

    #[test]
    fn each_failing_statement_is_reported() {
        let errors = messages(
            "func main() {
                 missing;
                 { 1 + true; }
                 val ok = 1;
                 ok();
             }",
        );
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[2], "Can only call callable types, instead got 'num'.");
    }

    /// The parser refuses `return` outside a function, so the tree is built by hand.
    #[test]
    fn top_level_return_is_rejected() {
        let keyword = Span::new(8, 14, 1);
        let ret = ReturnExpr {
            keyword,
            value: None,
            span: keyword,
        };
        let initializer = Expr::Return(&ret);
        let variables = [VarDecl {
            mutable: false,
            name: Ident::new("x", Span::new(4, 5, 1)),
            ty: None,
            initializer: Some(&initializer),
            span: Span::new(0, 15, 1),
        }];
        let program = Program {
            structs: &[],
            functions: &[],
            variables: &variables,
            span: Span::new(0, 15, 1),
            eof: Span::point(15, 1),
        };

        let errors = match Resolver::new().compile(&program) {
            Ok(_) => panic!("expected errors"),
            Err(errors) => errors,
        };
        let messages: Vec<&str> = errors.iter().map(|e| e.message()).collect();
        assert_eq!(messages, ["Cannot return from top-level code."]);
    }
}
