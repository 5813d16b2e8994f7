//! Abstract Syntax Tree (AST) for Zinc.
//!
//! All nodes are allocated in a [`bumpalo::Bump`] arena and borrow from it.
//! Nodes are immutable once built and compare structurally, spans included.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use zinc_parser::{Parser, ParserKind};
//!
//! let arena = Bump::new();
//! let source = "func main() { 1 + 2; }";
//!
//! let program = Parser::parse(source, &arena, ParserKind::Pratt).unwrap();
//! assert_eq!(program.functions.len(), 1);
//! ```

pub mod expr;
pub mod ops;
pub mod stmt;

pub use expr::*;
pub use ops::*;
pub use stmt::*;

use zinc_core::Span;

/// A parsed source file: its three kinds of top-level items, each in source order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Program<'ast> {
    pub structs: &'ast [StructDecl<'ast>],
    pub functions: &'ast [FunctionDecl<'ast>],
    pub variables: &'ast [VarDecl<'ast>],
    /// The whole source
    pub span: Span,
    /// The end-of-input position
    pub eof: Span,
}

impl<'ast> Program<'ast> {
    /// Whether the program declares nothing at all.
    pub fn is_empty(&self) -> bool {
        self.structs.is_empty() && self.functions.is_empty() && self.variables.is_empty()
    }

    /// Look up a top-level function by name.
    pub fn function(&self, name: &str) -> Option<&FunctionDecl<'ast>> {
        self.functions.iter().find(|f| f.name.name == name)
    }
}
