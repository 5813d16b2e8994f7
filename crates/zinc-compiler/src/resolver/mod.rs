//! Single-pass resolver and code generator.
//!
//! The [`Resolver`] walks a parsed [`Program`] once, type checking and
//! emitting bytecode as it goes. Work is split into phases; if a phase
//! reports any error the remaining phases are skipped so later code is
//! never checked against half-registered declarations.
//!
//! 1. **Signatures**: struct names, then struct fields, then function
//!    signatures. Each top-level function gets a global slot and a
//!    `CREATE_FUNCTION` in the prologue.
//! 2. **Globals**: top-level variables in source order. An initializer may
//!    not name a function that reaches its own global or a later one.
//! 3. **Bodies**: the call to `main`, then every function body.
//!
//! Within a phase, errors from independent items are all collected. Inside
//! a body, an error abandons the current statement only.
//!
//! ## Chunk layout
//!
//! ```text
//! CREATE_FUNCTION f0         ; one per top-level function, slots 0..n
//! ...                        ; global initializers, slots n..
//! GET_GLOBAL main
//! CALL 0
//! END
//! <body of f0>               ; prototypes are patched to point here
//! ...
//! ```

mod captures;
mod decl;
mod expr;
mod init_order;
mod stmt;

pub use captures::free_variables;

use zinc_core::{CompilerError, CompilerErrors, Span};
use zinc_parser::ast::{Ident, Program};

use crate::bytecode::Chunk;
use crate::emit::{BytecodeEmitter, EmitError};
use crate::scope::{DeclId, Scopes};
use crate::types::Type;

use init_order::GlobalReach;

pub(crate) type Result<T> = std::result::Result<T, CompilerError>;

/// Resolves and compiles one program.
pub struct Resolver {
    /// Scope tree and declarations
    scopes: Scopes,
    /// Bytecode output
    emitter: BytecodeEmitter,
    /// Errors collected so far in the current phase
    errors: CompilerErrors,
    /// Depth of `&&`/`||` right operands being resolved; assignments there
    /// may not run, so they do not count as initialization
    conditional_depth: u32,
    /// Names of the function bodies being compiled, outermost first
    function_path: Vec<String>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: Scopes::new(),
            emitter: BytecodeEmitter::new(),
            errors: CompilerErrors::new(),
            conditional_depth: 0,
            function_path: Vec::new(),
        }
    }

    /// Resolve `program` and produce its chunk.
    ///
    /// Returns every error found up to the last phase that ran.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(mut self, program: &Program<'_>) -> std::result::Result<Chunk, CompilerErrors> {
        log::debug!(
            "resolving {} structs, {} functions, {} globals",
            program.structs.len(),
            program.functions.len(),
            program.variables.len()
        );

        let structs = self.declare_structs(program.structs);
        self.resolve_struct_fields(program.structs, &structs);
        let functions = self.declare_functions(program.functions);
        self.checkpoint("signatures")?;

        let reach = GlobalReach::new(program);
        for (index, variable) in program.variables.iter().enumerate() {
            let result = reach
                .check(program, index)
                .and_then(|()| self.global_variable(variable));
            self.collect(result);
        }
        self.checkpoint("globals")?;

        let result = self.entry_point(program);
        self.collect(result);
        self.checkpoint("entry point")?;

        for (function, signature) in program.functions.iter().zip(functions) {
            if let Some(signature) = signature {
                self.function_body(function, signature, &[]);
            }
        }
        self.checkpoint("bodies")?;

        let chunk = self.emitter.finish();
        log::debug!(
            "compiled {} bytes of code and {} constants",
            chunk.len(),
            chunk.constants().len()
        );
        Ok(chunk)
    }

    /// End a phase, handing back its errors if there were any.
    fn checkpoint(&mut self, phase: &str) -> std::result::Result<(), CompilerErrors> {
        if self.errors.is_empty() {
            log::debug!("{phase} resolved");
            Ok(())
        } else {
            log::debug!("{phase} failed with {} errors", self.errors.len());
            Err(std::mem::take(&mut self.errors))
        }
    }

    /// Record errors from a list of independent items, keeping the rest going.
    fn collect(&mut self, result: Result<()>) {
        if let Err(error) = result {
            self.errors.push(error);
        }
    }

    // ==========================================================================
    // Shared lookups
    // ==========================================================================

    /// Resolve a type name from the current scope.
    fn resolve_type(&self, name: &Ident<'_>) -> Result<Type> {
        self.scopes.lookup_type(name.name).ok_or_else(|| {
            CompilerError::token(
                name.span,
                name.name,
                format!("Type '{}' does not exist in the current scope.", name.name),
            )
        })
    }

    /// Find the binding a variable name refers to.
    fn find_variable(&self, name: &Ident<'_>) -> Result<DeclId> {
        self.scopes.lookup(name.name).ok_or_else(|| {
            CompilerError::token(
                name.span,
                name.name,
                format!(
                    "Variable '{}' does not exist in the current scope.",
                    name.name
                ),
            )
        })
    }

    /// The one-byte slot operand for a declaration.
    fn slot(&self, id: DeclId) -> Result<u8> {
        let decl = self.scopes.decl(id);
        u8::try_from(decl.slot).map_err(|_| {
            let message = if self.scopes.is_global_decl(id) {
                "Too many global variables."
            } else {
                "Too many local variables in function."
            };
            CompilerError::one_range(decl.span, message)
        })
    }

    /// Load a binding's value.
    fn emit_load(&mut self, id: DeclId) -> Result<()> {
        let slot = self.slot(id)?;
        if self.scopes.is_global_decl(id) {
            self.emitter.emit_get_global(slot);
        } else {
            self.emitter.emit_get_local(slot);
        }
        Ok(())
    }

    /// Store the top of the stack into a binding, leaving the value in place.
    fn emit_store(&mut self, id: DeclId) -> Result<()> {
        let slot = self.slot(id)?;
        if self.scopes.is_global_decl(id) {
            self.emitter.emit_set_global(slot);
        } else {
            self.emitter.emit_set_local(slot);
        }
        Ok(())
    }

    /// Report an encoding limit at the instruction being emitted.
    fn limit(&self, error: EmitError) -> CompilerError {
        CompilerError::one_range(self.emitter.current_span(), error.to_string())
    }

    // ==========================================================================
    // Shared diagnostics
    // ==========================================================================

    /// A name declared twice in one scope.
    fn duplicate(&self, existing: DeclId, name: &str, span: Span) -> CompilerError {
        let first = self.scopes.decl(existing).span;
        if self.scopes.is_global() {
            CompilerError::two_range(
                first,
                span,
                format!("'{name}' first declared here in top level scope."),
                format!("'{name}' declared again in top level scope."),
                format!("'{name}' can only be declared once in top level scope."),
            )
        } else {
            CompilerError::two_range(
                first,
                span,
                format!("'{name}' first declared here."),
                format!("'{name}' declared again in the same scope."),
                format!("'{name}' can only be declared once in the same scope."),
            )
        }
    }

    /// A read of a binding that has no value yet.
    fn uninitialized(&self, id: DeclId, use_span: Span) -> CompilerError {
        let decl = self.scopes.decl(id);
        CompilerError::two_range(
            decl.span,
            use_span,
            "Variable declared here without an initializer.",
            "Variable used before being initialized.",
            format!("Variable '{}' used before being initialized.", decl.name),
        )
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use zinc_core::CompilerErrors;
    use zinc_parser::{Parser, ParserKind};

    use crate::bytecode::{Chunk, OpCode};

    pub(super) fn compile(source: &str) -> Result<Chunk, CompilerErrors> {
        let arena = Bump::new();
        let program = Parser::parse(source, &arena, ParserKind::Pratt).unwrap();
        super::Resolver::new().compile(&program)
    }

    #[track_caller]
    pub(super) fn compile_ok(source: &str) -> Chunk {
        match compile(source) {
            Ok(chunk) => chunk,
            Err(errors) => panic!("unexpected errors:\n{errors}"),
        }
    }

    #[track_caller]
    pub(super) fn messages(source: &str) -> Vec<String> {
        match compile(source) {
            Ok(_) => panic!("expected errors"),
            Err(errors) => errors.iter().map(|e| e.message().to_string()).collect(),
        }
    }

    #[test]
    fn prologue_creates_functions_then_calls_main() {
        let chunk = compile_ok(
            "func helper(): num { return 1; }
             func main() { helper(); }",
        );
        let prologue_end = chunk.function("helper").unwrap().start;
        let mut prologue = chunk.opcodes();
        prologue.truncate(5);
        assert_eq!(
            prologue,
            [
                OpCode::CreateFunction,
                OpCode::CreateFunction,
                OpCode::GetGlobal,
                OpCode::Call,
                OpCode::End,
            ]
        );
        assert_eq!(prologue_end, 11);
    }

    #[test]
    fn add_body_is_four_instructions() {
        let chunk = compile_ok(
            "func add(a: num, b: num): num { return a + b; }
             func main() { val x = add(2, 3); }",
        );
        chunk.assert_function_opcodes(
            "add",
            &[
                OpCode::GetStack,
                OpCode::GetStack,
                OpCode::Add,
                OpCode::ReturnValue,
            ],
        );
    }

    #[test]
    fn globals_follow_functions() {
        let chunk = compile_ok(
            "val answer = 42;
             func main() { answer; }",
        );
        chunk.assert_opcodes(&[
            OpCode::CreateFunction,
            OpCode::CreateNum,
            OpCode::GetGlobal,
            OpCode::Call,
            OpCode::End,
            OpCode::GetGlobal,
            OpCode::Print,
            OpCode::Return,
        ]);
        // main is slot 0, answer is slot 1
        let main = chunk.function("main").unwrap();
        assert_eq!(chunk.read_byte(main.start + 1), Some(1));
    }

    #[test]
    fn missing_main() {
        assert_eq!(
            messages("func helper() {}"),
            ["Could not find main function."]
        );
        assert_eq!(messages("val main = 1;"), ["Could not find main function."]);
    }

    #[test]
    fn main_takes_no_parameters() {
        assert_eq!(
            messages("func main(a: num) {}"),
            ["Function 'main' cannot take parameters."]
        );
    }

    #[test]
    fn phases_gate_later_errors() {
        // The body error is never reached
        let errors = messages(
            "val g: num = true;
             func main() { 1 + true; }",
        );
        assert_eq!(
            errors,
            ["Declared type of 'num' does not match initializer type of 'bool'."]
        );
    }

    #[test]
    fn errors_within_a_phase_are_all_collected() {
        let errors = messages(
            "func main() {
                 1 + true;
                 !3;
             }",
        );
        assert_eq!(
            errors,
            [
                "Cannot perform binary '+' on 'num' and 'bool'.",
                "Cannot perform unary '!' on 'num'.",
            ]
        );
    }
}
