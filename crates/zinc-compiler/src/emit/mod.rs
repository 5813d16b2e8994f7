//! Bytecode emitter for the Zinc compiler.
//!
//! The [`BytecodeEmitter`] provides a high-level API for generating bytecode,
//! handling constants, immediate numbers and forward jumps.
//!
//! # Example
//!
//! ```
//! use zinc_compiler::bytecode::OpCode;
//! use zinc_compiler::emit::BytecodeEmitter;
//!
//! let mut emitter = BytecodeEmitter::new();
//! emitter.emit_number(42.0).unwrap();
//! emitter.emit_number(0.5).unwrap();
//! emitter.emit(OpCode::Add);
//!
//! let chunk = emitter.finish();
//! chunk.assert_opcodes(&[OpCode::CreateNum, OpCode::Const, OpCode::Add]);
//! ```

use std::rc::Rc;

use thiserror::Error;
use zinc_core::Span;

use crate::bytecode::{Chunk, Constant, FunctionProto, OpCode};

/// Largest integral number `CREATE_NUM` can carry.
pub const MAX_IMMEDIATE: f64 = i16::MAX as f64;

/// Emits bytecode instructions into a single program chunk.
pub struct BytecodeEmitter {
    /// The chunk being built
    chunk: Chunk,

    /// Source span attached to subsequent bytes
    current_span: Span,
}

impl Default for BytecodeEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl BytecodeEmitter {
    /// Create a new bytecode emitter.
    pub fn new() -> Self {
        Self {
            chunk: Chunk::new(),
            current_span: Span::default(),
        }
    }

    /// Set current source span for debug info.
    ///
    /// All subsequent instructions will be associated with this span.
    pub fn set_span(&mut self, span: Span) {
        self.current_span = span;
    }

    /// Get current source span.
    pub fn current_span(&self) -> Span {
        self.current_span
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Emit a single opcode with no operands.
    pub fn emit(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.current_span);
    }

    /// Emit opcode with 8-bit operand.
    pub fn emit_byte(&mut self, op: OpCode, byte: u8) {
        self.chunk.write_op(op, self.current_span);
        self.chunk.write_byte(byte, self.current_span);
    }

    /// Emit opcode with 16-bit operand.
    pub fn emit_u16(&mut self, op: OpCode, value: u16) {
        self.chunk.write_op(op, self.current_span);
        self.chunk.write_u16(value, self.current_span);
    }

    /// Emit a constant load instruction.
    ///
    /// Every call adds a fresh pool entry.
    pub fn emit_constant(&mut self, constant: Constant) -> Result<(), EmitError> {
        let index = self.add_constant(constant)?;
        self.emit_u16(OpCode::Const, index);
        Ok(())
    }

    fn add_constant(&mut self, constant: Constant) -> Result<u16, EmitError> {
        self.chunk
            .constants_mut()
            .add(constant)
            .ok_or(EmitError::TooManyConstants)
    }

    // ==========================================================================
    // Literals
    // ==========================================================================

    /// Emit a number.
    ///
    /// Integral values in `0..=32767` use `CREATE_NUM` and leave the pool alone.
    pub fn emit_number(&mut self, value: f64) -> Result<(), EmitError> {
        if value.fract() == 0.0 && (0.0..=MAX_IMMEDIATE).contains(&value) {
            self.emit_u16(OpCode::CreateNum, value as u16);
            Ok(())
        } else {
            self.emit_constant(Constant::Number(value))
        }
    }

    /// Emit a char constant.
    pub fn emit_char(&mut self, value: char) -> Result<(), EmitError> {
        self.emit_constant(Constant::Char(value))
    }

    /// Emit a string constant.
    pub fn emit_string(&mut self, value: &str) -> Result<(), EmitError> {
        self.emit_constant(Constant::Str(Rc::from(value)))
    }

    /// Emit boolean.
    pub fn emit_bool(&mut self, value: bool) {
        self.emit(if value { OpCode::True } else { OpCode::False });
    }

    /// Emit unit.
    pub fn emit_none(&mut self) {
        self.emit(OpCode::None);
    }

    /// Emit pop (discard top of stack).
    pub fn emit_pop(&mut self) {
        self.emit(OpCode::Pop);
    }

    // ==========================================================================
    // Variables and Fields
    // ==========================================================================

    /// Emit get local variable.
    pub fn emit_get_local(&mut self, slot: u8) {
        self.emit_byte(OpCode::GetStack, slot);
    }

    /// Emit set local variable.
    pub fn emit_set_local(&mut self, slot: u8) {
        self.emit_byte(OpCode::SetStack, slot);
    }

    /// Emit get global variable.
    pub fn emit_get_global(&mut self, slot: u8) {
        self.emit_byte(OpCode::GetGlobal, slot);
    }

    /// Emit set global variable.
    pub fn emit_set_global(&mut self, slot: u8) {
        self.emit_byte(OpCode::SetGlobal, slot);
    }

    /// Emit field access.
    pub fn emit_get_field(&mut self, index: u8) {
        self.emit_byte(OpCode::GetInd, index);
    }

    /// Emit field assignment.
    pub fn emit_set_field(&mut self, index: u8) {
        self.emit_byte(OpCode::SetInd, index);
    }

    /// Emit struct construction from the top `count` values.
    pub fn emit_alloc(&mut self, count: u8) {
        self.emit_byte(OpCode::Alloc, count);
    }

    // ==========================================================================
    // Functions
    // ==========================================================================

    /// Add a function prototype whose address is patched once the body is emitted.
    pub fn add_function(&mut self, arity: u8, captures: u8) -> Result<u16, EmitError> {
        self.add_constant(Constant::Function(FunctionProto {
            address: 0,
            arity,
            captures,
        }))
    }

    /// Point a prototype at its body, which starts at `address`.
    pub fn patch_function(&mut self, index: u16, address: usize) -> Result<(), EmitError> {
        let address = u32::try_from(address).map_err(|_| EmitError::JumpTooLarge)?;
        if self.chunk.constants_mut().patch_function_address(index, address) {
            Ok(())
        } else {
            Err(EmitError::NotAFunction(index))
        }
    }

    /// Emit function value creation from a prototype.
    pub fn emit_create_function(&mut self, index: u16) {
        self.emit_u16(OpCode::CreateFunction, index);
    }

    /// Emit function call.
    pub fn emit_call(&mut self, arg_count: u8) {
        self.emit_byte(OpCode::Call, arg_count);
    }

    /// Emit return with value.
    pub fn emit_return_value(&mut self) {
        self.emit(OpCode::ReturnValue);
    }

    /// Emit return from unit function.
    pub fn emit_return(&mut self) {
        self.emit(OpCode::Return);
    }

    /// Record where a function body lives.
    pub fn add_symbol(&mut self, name: impl Into<String>, start: usize) {
        let end = self.chunk.current_offset();
        self.chunk.add_symbol(name, start, end);
    }

    // ==========================================================================
    // Jumps and Control Flow
    // ==========================================================================

    /// Emit a forward jump (target unknown).
    ///
    /// Returns a label that must be patched later with [`patch_jump`](Self::patch_jump).
    pub fn emit_jump(&mut self, op: OpCode) -> JumpLabel {
        self.emit(op);
        let offset = self.chunk.current_offset();
        self.chunk.write_u16(0xFFFF, self.current_span); // Placeholder
        JumpLabel(offset)
    }

    /// Patch a forward jump to the current position.
    pub fn patch_jump(&mut self, label: JumpLabel) -> Result<(), EmitError> {
        let distance = self.chunk.current_offset() - label.0 - 2;
        let distance = i16::try_from(distance).map_err(|_| EmitError::JumpTooLarge)?;
        if self.chunk.patch_u16(label.0, distance as u16) {
            Ok(())
        } else {
            Err(EmitError::JumpTooLarge)
        }
    }

    /// Get current bytecode offset.
    pub fn current_offset(&self) -> usize {
        self.chunk.current_offset()
    }

    // ==========================================================================
    // Finalization
    // ==========================================================================

    /// Finish and return the bytecode chunk.
    pub fn finish(self) -> Chunk {
        self.chunk
    }

    /// Get current chunk size (for debugging).
    pub fn code_size(&self) -> usize {
        self.chunk.len()
    }
}

/// A label for a forward jump that needs patching.
#[derive(Debug, Clone, Copy)]
pub struct JumpLabel(pub(crate) usize);

impl JumpLabel {
    /// Get the bytecode offset of the displacement operand.
    pub fn offset(&self) -> usize {
        self.0
    }
}

/// A hard encoding limit was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("Too many constants in one chunk.")]
    TooManyConstants,

    #[error("Too much code to jump over.")]
    JumpTooLarge,

    #[error("Constant {0} is not a function prototype.")]
    NotAFunction(u16),
}
