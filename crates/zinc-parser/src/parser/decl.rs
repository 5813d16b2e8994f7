//! Declaration and statement parsing, shared by every expression front end.

use zinc_core::Span;

use crate::ast::{
    Block, ExprStmt, FieldDecl, FunctionDecl, Ident, Param, Program, Stmt, StructDecl, VarDecl,
};
use crate::lexer::TokenKind;

use super::{ParseResult, Parser};

impl<'ast> Parser<'ast> {
    /// Parse the whole token stream.
    ///
    /// A declaration that fails is dropped and parsing resumes at the next
    /// top-level declaration, so the result is a best-effort tree.
    pub fn program(&mut self) -> Program<'ast> {
        let mut structs = Vec::new();
        let mut functions = Vec::new();
        let mut variables = Vec::new();

        while !self.is_eof() {
            let start = self.position;
            self.brace_depth = 0;

            let result = match self.peek().kind {
                TokenKind::Struct => self.struct_declaration().map(|s| structs.push(s)),
                TokenKind::Func => self.function_declaration().map(|f| functions.push(*f)),
                TokenKind::Var | TokenKind::Val => {
                    self.var_declaration().map(|v| variables.push(*v))
                }
                _ => {
                    let token = self.peek();
                    Err(self.error_at(token, "Expected declaration."))
                }
            };

            if result.is_err() {
                self.synchronize(start);
            }
        }

        let end = self.peek().span;
        log::debug!(
            "parsed {} structs, {} functions, {} globals",
            structs.len(),
            functions.len(),
            variables.len()
        );

        Program {
            structs: self.arena.alloc_slice_copy(&structs),
            functions: self.arena.alloc_slice_copy(&functions),
            variables: self.arena.alloc_slice_copy(&variables),
            span: Span::new(0, end.end, 1),
            eof: end,
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// `struct Name { field: Type, ... }`
    fn struct_declaration(&mut self) -> ParseResult<StructDecl<'ast>> {
        let keyword = self.advance();
        let name = self.expect_ident("Expected struct name after 'struct'.")?;
        self.expect(TokenKind::LeftBrace, "Expected '{' after struct name.")?;

        let mut fields = Vec::new();
        if !self.check(TokenKind::RightBrace) {
            loop {
                let (name, ty, span) = self.typed_name("field")?;
                fields.push(FieldDecl { name, ty, span });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RightBrace, "Expected '}' after struct fields.")?;

        Ok(StructDecl {
            name,
            fields: self.arena.alloc_slice_copy(&fields),
            span: keyword.span.merge(close.span),
        })
    }

    /// `func name(param: Type, ...): Type { body }`
    fn function_declaration(&mut self) -> ParseResult<&'ast FunctionDecl<'ast>> {
        let keyword = self.advance();
        let name = self.expect_ident("Expected function name after 'func'.")?;
        self.expect(TokenKind::LeftParen, "Expected '(' after function name.")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let (name, ty, span) = self.typed_name("parameter")?;
                params.push(Param { name, ty, span });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let close_paren = self.expect(TokenKind::RightParen, "Expected ')' after function parameters.")?;

        let return_type = match self.eat(TokenKind::Colon) {
            Some(_) => Some(self.expect_ident("Expected function return type after ':'.")?),
            None => None,
        };
        let signature_end = return_type.map_or(close_paren.span, |ty| ty.span);

        let open = self.expect(TokenKind::LeftBrace, "Expected function body.")?;
        self.function_depth += 1;
        let body = self.block_body();
        self.function_depth -= 1;
        let (body, close) = body?;

        Ok(self.arena.alloc(FunctionDecl {
            name,
            params: self.arena.alloc_slice_copy(&params),
            return_type,
            body,
            span: keyword.span.merge(signature_end),
            body_span: open.span.merge(close),
        }))
    }

    /// `var name[: Type][= value];` or the `val` form.
    fn var_declaration(&mut self) -> ParseResult<&'ast VarDecl<'ast>> {
        let keyword = self.advance();
        let mutable = keyword.kind == TokenKind::Var;
        let name = self.expect_ident("Expected variable name.")?;

        let ty = match self.eat(TokenKind::Colon) {
            Some(_) => Some(self.expect_ident("Expected variable type after ':'.")?),
            None => None,
        };
        let initializer = match self.eat(TokenKind::Equal) {
            Some(_) => Some(self.expression()?),
            None => None,
        };
        let semicolon = self.expect(TokenKind::Semicolon, "Expected ';' after variable declaration.")?;
        let span = keyword.span.merge(semicolon.span);

        if ty.is_none() && initializer.is_none() {
            return Err(self.error_range(
                span,
                format!(
                    "Variable '{}' must have either a type or an initializer.",
                    name.name
                ),
            ));
        }

        Ok(self.arena.alloc(VarDecl {
            mutable,
            name,
            ty,
            initializer,
            span,
        }))
    }

    /// `name: Type`, with messages naming what is being declared.
    fn typed_name(&mut self, what: &str) -> ParseResult<(Ident<'ast>, Ident<'ast>, Span)> {
        let name = self.expect_ident(&format!("Expected {what} name."))?;
        self.expect(TokenKind::Colon, &format!("Expected ':' after {what} name."))?;
        let ty = self.expect_ident(&format!("Expected {what} type after ':'."))?;
        Ok((name, ty, name.span.merge(ty.span)))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Statements up to and including the closing `}`. The `{` is already consumed.
    fn block_body(&mut self) -> ParseResult<(&'ast [Stmt<'ast>], Span)> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            stmts.push(self.statement()?);
        }
        let close = self.expect(TokenKind::RightBrace, "Expected '}' after block.")?;
        Ok((self.arena.alloc_slice_copy(&stmts), close.span))
    }

    fn statement(&mut self) -> ParseResult<Stmt<'ast>> {
        match self.peek().kind {
            TokenKind::Struct => {
                let decl = self.struct_declaration()?;
                Ok(Stmt::Struct(self.arena.alloc(decl)))
            }
            TokenKind::Func => Ok(Stmt::Function(self.function_declaration()?)),
            TokenKind::Var | TokenKind::Val => Ok(Stmt::Variable(self.var_declaration()?)),
            TokenKind::LeftBrace => {
                let open = self.advance();
                let (stmts, close) = self.block_body()?;
                Ok(Stmt::Block(self.arena.alloc(Block {
                    stmts,
                    span: open.span.merge(close),
                })))
            }
            _ => {
                let expr = self.expression()?;
                let semicolon = self.expect(TokenKind::Semicolon, "Expected ';' after expression.")?;
                Ok(Stmt::Expression(ExprStmt {
                    expr,
                    span: expr.span().merge(semicolon.span),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;

    use crate::ast::{Expr, Program, Stmt};
    use crate::{Parser, ParserKind};

    fn parse<'a>(source: &str, arena: &'a Bump) -> Program<'a> {
        match Parser::parse(source, arena, ParserKind::Pratt) {
            Ok(program) => program,
            Err(errors) => panic!("parse failed for {source:?}: {errors}"),
        }
    }

    fn messages(source: &str) -> Vec<String> {
        let arena = Bump::new();
        let (_, errors) = Parser::parse_lenient(source, &arena, ParserKind::Pratt);
        errors.iter().map(|e| e.message().to_string()).collect()
    }

    #[test]
    fn splits_top_level_items() {
        let arena = Bump::new();
        let program = parse(
            "struct P { x: num } val g = 1; func main() { } var h: num = 2;",
            &arena,
        );
        assert_eq!(program.structs.len(), 1);
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.variables.len(), 2);
        assert!(!program.variables[0].mutable);
        assert!(program.variables[1].mutable);
    }

    #[test]
    fn function_signature_span() {
        let arena = Bump::new();
        let source = "func add(a: num, b: num): num { return a + b; }";
        let program = parse(source, &arena);
        let add = &program.functions[0];

        assert_eq!(&source[add.span.range()], "func add(a: num, b: num): num");
        assert_eq!(add.params.len(), 2);
        assert_eq!(add.return_type.map(|t| t.name), Some("num"));
        assert_eq!(add.body.len(), 1);
    }

    #[test]
    fn unit_function_signature_ends_at_paren() {
        let arena = Bump::new();
        let source = "func main() { }";
        let program = parse(source, &arena);
        assert_eq!(&source[program.functions[0].span.range()], "func main()");
    }

    #[test]
    fn struct_declaration_fields_in_order() {
        let arena = Bump::new();
        let program = parse("struct P { a: num, b: str }", &arena);
        let names: Vec<_> = program.structs[0].fields.iter().map(|f| f.name.name).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn body_statements() {
        let arena = Bump::new();
        let program = parse(
            "func main() { var x: num; { x = 1; } func inner() { } x; struct S { } }",
            &arena,
        );
        let body = program.functions[0].body;
        assert!(matches!(body[0], Stmt::Variable(_)));
        assert!(matches!(body[1], Stmt::Block(block) if block.stmts.len() == 1));
        assert!(matches!(body[2], Stmt::Function(_)));
        assert!(matches!(body[3], Stmt::Expression(stmt) if matches!(stmt.expr, Expr::GetVariable(_))));
        assert!(matches!(body[4], Stmt::Struct(decl) if decl.name.name == "S"));
    }

    #[test]
    fn return_value_is_optional() {
        let arena = Bump::new();
        let program = parse("func f() { return; } func g(): num { return 1; }", &arena);
        let Stmt::Expression(bare) = program.functions[0].body[0] else {
            panic!("expected expression statement");
        };
        assert!(matches!(bare.expr, Expr::Return(ret) if ret.value.is_none()));
        let Stmt::Expression(valued) = program.functions[1].body[0] else {
            panic!("expected expression statement");
        };
        assert!(matches!(valued.expr, Expr::Return(ret) if ret.value.is_some()));
    }

    #[test]
    fn return_outside_function() {
        assert_eq!(
            messages("val x = return 1;"),
            vec!["Cannot return from top-level code."]
        );
    }

    #[test]
    fn variable_needs_type_or_initializer() {
        assert_eq!(
            messages("var x;"),
            vec!["Variable 'x' must have either a type or an initializer."]
        );
    }

    #[test]
    fn recovers_at_next_declaration() {
        let arena = Bump::new();
        let source = "func broken() { 1 + ; } func ok() { } val 3; struct S { }";
        let (program, errors) = Parser::parse_lenient(source, &arena, ParserKind::Pratt);

        let messages: Vec<_> = errors.iter().map(|e| e.message()).collect();
        assert_eq!(messages, ["Expected expression.", "Expected variable name."]);
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name.name, "ok");
        assert_eq!(program.structs.len(), 1);
    }

    #[test]
    fn statements_are_not_declarations() {
        assert_eq!(messages("1 + 2;"), vec!["Expected declaration."]);
    }

    #[test]
    fn missing_semicolon() {
        assert_eq!(
            messages("func main() { 1 }"),
            vec!["Expected ';' after expression."]
        );
    }

    #[test]
    fn char_literal_length_checked() {
        assert_eq!(
            messages("val c = 'ab';"),
            vec!["Too many characters in a character literal 'ab'."]
        );
        assert_eq!(
            messages("val c = '';"),
            vec!["Cannot have an empty character literal."]
        );
    }

    #[test]
    fn lexer_errors_are_reported_once() {
        assert_eq!(messages("val s = \"open;"), vec!["Unterminated string."]);
    }
}
