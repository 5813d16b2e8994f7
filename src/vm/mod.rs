//! Stack-based virtual machine for executing Zinc bytecode.
//!
//! The VM runs one [`Chunk`] from offset 0. Frame 0 is the top level; its
//! locals are the globals. A `CALL` removes the callee from beneath its
//! arguments, so a frame's slot 0 is the first argument, followed by the
//! closure's captured values and then the function's own locals.
//!
//! Execution stops at `END`, or at a `RETURN`/`RETURN_VALUE` in frame 0.

mod frame;
mod handlers;
mod stack;
mod value;

use std::io::Write;

use zinc_compiler::{Chunk, OpCode};
use zinc_core::RuntimeError;

pub use frame::{CallFrame, FrameStack};
pub use handlers::control::ControlFlow;
pub use stack::ValueStack;
pub use value::{Closure, Value};

/// Result type for VM operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Default maximum operand stack depth.
pub const DEFAULT_STACK_SIZE: usize = 4096;
/// Default maximum call depth.
pub const DEFAULT_CALL_STACK_SIZE: usize = 256;

/// The Zinc virtual machine.
pub struct VirtualMachine {
    /// Operand stack.
    stack: ValueStack,
    /// Call frame stack.
    frames: FrameStack,
    /// Offset of the next byte to read.
    ip: usize,
    /// Offset of the instruction being executed, for error reports.
    op_offset: usize,
}

impl VirtualMachine {
    /// Create a VM with the given stack capacities.
    pub fn new(stack_size: usize, call_stack_size: usize) -> Self {
        Self {
            stack: ValueStack::new(stack_size),
            frames: FrameStack::new(call_stack_size),
            ip: 0,
            op_offset: 0,
        }
    }

    /// Clear both stacks and install the top-level frame.
    pub fn reset(&mut self) -> Result<()> {
        self.stack.clear();
        self.frames.clear();
        self.ip = 0;
        self.op_offset = 0;
        self.frames.push(CallFrame {
            base: 0,
            return_ip: 0,
        })
    }

    /// Run `chunk` from the start, writing `PRINT` output to `out`.
    ///
    /// The chunk is never modified, so the same chunk can be interpreted
    /// any number of times.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn interpret(&mut self, chunk: &Chunk, out: &mut dyn Write) -> Result<()> {
        self.reset()?;
        log::debug!("interpreting {} bytes", chunk.len());
        let result = self.run(chunk, out);
        if let Err(error) = &result {
            log::debug!("interpretation aborted at offset {}: {error}", self.op_offset);
        }
        result
    }

    /// The operand stack as execution left it.
    pub fn stack(&self) -> &ValueStack {
        &self.stack
    }

    /// Number of active call frames.
    pub fn frame_depth(&self) -> usize {
        self.frames.depth()
    }

    fn run(&mut self, chunk: &Chunk, out: &mut dyn Write) -> Result<()> {
        loop {
            self.op_offset = self.ip;
            let op = self.read_op(chunk)?;
            log::trace!(
                "{:04} {:<16} stack={}",
                self.op_offset,
                op.name(),
                self.stack.len()
            );

            match op {
                OpCode::Const => {
                    let index = self.read_u16(chunk)?;
                    let value = chunk
                        .constant(index)
                        .and_then(Value::from_constant)
                        .ok_or_else(|| self.out_of_range(index as usize))?;
                    self.push(value)?;
                }
                OpCode::CreateNum => {
                    let value = self.read_u16(chunk)?;
                    self.push(Value::Number(f64::from(value)))?;
                }
                OpCode::None => self.push(Value::Unit)?,
                OpCode::True => self.push(Value::Bool(true))?,
                OpCode::False => self.push(Value::Bool(false))?,
                OpCode::Pop => {
                    self.pop()?;
                }
                OpCode::Print => {
                    let value = self.pop()?;
                    writeln!(out, "{value}").map_err(|e| RuntimeError::Output {
                        message: e.to_string(),
                    })?;
                }

                // Variables and structs
                OpCode::GetStack
                | OpCode::SetStack
                | OpCode::GetGlobal
                | OpCode::SetGlobal
                | OpCode::Alloc
                | OpCode::GetInd
                | OpCode::SetInd => self.execute_variables(op, chunk)?,

                // Arithmetic and comparison
                OpCode::Add
                | OpCode::Sub
                | OpCode::Div
                | OpCode::Mul
                | OpCode::Mod
                | OpCode::Pow
                | OpCode::Not
                | OpCode::Neg
                | OpCode::Equal
                | OpCode::NotEqual
                | OpCode::Greater
                | OpCode::GreaterEqual
                | OpCode::Less
                | OpCode::LessEqual => self.execute_arithmetic(op)?,

                // Control flow
                OpCode::Jmp
                | OpCode::Jif
                | OpCode::Jit
                | OpCode::CreateFunction
                | OpCode::Call
                | OpCode::Return
                | OpCode::ReturnValue
                | OpCode::End => match self.execute_control(op, chunk)? {
                    ControlFlow::Continue => {}
                    ControlFlow::Halt => return Ok(()),
                },
            }
        }
    }

    // ==========================================================================
    // Decoding
    // ==========================================================================

    fn read_op(&mut self, chunk: &Chunk) -> Result<OpCode> {
        let byte = self.read_byte(chunk)?;
        OpCode::from_u8(byte).ok_or(RuntimeError::InvalidOpcode {
            byte,
            offset: self.op_offset,
        })
    }

    pub(crate) fn read_byte(&mut self, chunk: &Chunk) -> Result<u8> {
        let byte = chunk.read_byte(self.ip).ok_or_else(|| self.truncated())?;
        self.ip += 1;
        Ok(byte)
    }

    pub(crate) fn read_u16(&mut self, chunk: &Chunk) -> Result<u16> {
        let value = chunk.read_u16(self.ip).ok_or_else(|| self.truncated())?;
        self.ip += 2;
        Ok(value)
    }

    pub(crate) fn read_i16(&mut self, chunk: &Chunk) -> Result<i16> {
        let value = chunk.read_i16(self.ip).ok_or_else(|| self.truncated())?;
        self.ip += 2;
        Ok(value)
    }

    // ==========================================================================
    // Stack access
    // ==========================================================================

    #[inline]
    pub(crate) fn push(&mut self, value: Value) -> Result<()> {
        self.stack.push(value)
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow {
            offset: self.op_offset,
        })
    }

    pub(crate) fn pop_number(&mut self) -> Result<f64> {
        match self.pop()? {
            Value::Number(n) => Ok(n),
            other => Err(self.mismatch("num", &other)),
        }
    }

    pub(crate) fn pop_bool(&mut self) -> Result<bool> {
        match self.pop()? {
            Value::Bool(b) => Ok(b),
            other => Err(self.mismatch("bool", &other)),
        }
    }

    /// Base of the active frame.
    pub(crate) fn frame_base(&self) -> Result<usize> {
        self.frames
            .current()
            .map(|frame| frame.base)
            .ok_or(RuntimeError::StackUnderflow {
                offset: self.op_offset,
            })
    }

    // ==========================================================================
    // Defects
    // ==========================================================================

    pub(crate) fn truncated(&self) -> RuntimeError {
        RuntimeError::TruncatedInstruction {
            offset: self.op_offset,
        }
    }

    pub(crate) fn out_of_range(&self, operand: usize) -> RuntimeError {
        RuntimeError::OperandOutOfRange {
            operand,
            offset: self.op_offset,
        }
    }

    pub(crate) fn mismatch(&self, expected: &'static str, found: &Value) -> RuntimeError {
        RuntimeError::TypeMismatch {
            expected,
            found: found.type_name(),
            offset: self.op_offset,
        }
    }
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_SIZE, DEFAULT_CALL_STACK_SIZE)
    }
}
