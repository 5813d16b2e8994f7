//! Zinc Compiler
//!
//! Turns a parsed [`Program`] into a single bytecode [`Chunk`] for the Zinc VM.
//!
//! ## Architecture
//!
//! Resolution and code generation happen in one walk of the tree. Names and
//! types are checked as each node is visited and the node's instructions are
//! emitted straight away. A short signature phase registers structs and
//! top-level functions first so bodies may refer to anything declared at
//! the top level.
//!
//! ## Modules
//!
//! - [`bytecode`]: Instruction set, chunk and constant pool
//! - [`emit`]: Low-level bytecode emitter
//! - [`resolver`]: Type checking and code generation
//! - [`return_checker`]: All-paths-return analysis
//! - [`scope`]: Scope tree and declarations
//! - [`types`]: Static types of the language
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use zinc_parser::{Parser, ParserKind};
//!
//! let arena = Bump::new();
//! let program = Parser::parse("func main() { 1 + 2; }", &arena, ParserKind::Pratt).unwrap();
//! let chunk = zinc_compiler::compile(&program).unwrap();
//! assert!(chunk.function("main").is_some());
//! ```

pub mod bytecode;
pub mod emit;
pub mod resolver;
pub mod return_checker;
pub mod scope;
pub mod types;

pub use bytecode::{Chunk, Constant, ConstantPool, FunctionProto, FunctionSymbol, OpCode};
pub use emit::{BytecodeEmitter, EmitError, JumpLabel};
pub use resolver::Resolver;
pub use return_checker::ReturnChecker;
pub use scope::{DeclFlags, DeclId, Declaration, ScopeId, Scopes};
pub use types::{FunctionType, StructType, Type};

// Re-export the diagnostic types from core for convenience
pub use zinc_core::{CompilerError, CompilerErrors};

use zinc_parser::ast::Program;

/// Resolve and compile a whole program.
pub fn compile(program: &Program<'_>) -> Result<Chunk, CompilerErrors> {
    Resolver::new().compile(program)
}
