//! Zinc: a small statically typed language compiled to stack bytecode.
//!
//! The pipeline is split across the workspace:
//!
//! - `zinc-core`: spans and error types
//! - `zinc-parser`: lexer, syntax tree and three expression parsers
//! - `zinc-compiler`: scope model, type checker and bytecode emitter
//! - this crate: the virtual machine, diagnostics rendering and [`Runtime`]
//!
//! # Example
//!
//! ```
//! use zinc::{OutputBuffer, Runtime, RuntimeConfig};
//!
//! let source = r#"
//!     struct Point { x: num, y: num }
//!
//!     func main() {
//!         val p = Point { x: 3, y: 4 };
//!         p.x * p.x + p.y * p.y;
//!     }
//! "#;
//!
//! let output = OutputBuffer::new();
//! let mut runtime = Runtime::new(RuntimeConfig::default()).with_output(output.sink());
//! runtime.run(source).unwrap();
//! assert_eq!(output.contents(), "25\n");
//! ```

pub mod diagnostic;
pub mod runtime;
pub mod vm;

pub use runtime::{OutputBuffer, Runtime, RuntimeConfig};
pub use vm::{Value, VirtualMachine};

pub use zinc_compiler::{Chunk, OpCode, compile};
pub use zinc_core::{CompilerError, CompilerErrors, OverflowedStack, RuntimeError, Span, ZincError};
pub use zinc_parser::{Parser, ParserKind};
