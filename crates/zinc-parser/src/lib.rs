//! Zinc Parser crate.
//!
//! This crate turns Zinc source code into an arena-allocated syntax tree.
//! It includes:
//! - Lexical analysis (tokenization)
//! - Abstract Syntax Tree (AST) definitions
//! - Three interchangeable expression parsers sharing one declaration parser
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use zinc_parser::{Parser, ParserKind};
//!
//! let arena = Bump::new();
//! let source = r#"
//!     struct Point { x: num, y: num }
//!
//!     func main() {
//!         val p = Point { x: 1, y: 2 };
//!         p.x + p.y;
//!     }
//! "#;
//!
//! match Parser::parse(source, &arena, ParserKind::Pratt) {
//!     Ok(program) => println!("Parsed {} functions", program.functions.len()),
//!     Err(errors) => eprintln!("Parse errors: {}", errors),
//! }
//! ```

pub mod ast;
pub mod lexer;
mod parser;

// Re-export commonly used types at crate root
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Parser, ParserKind};
