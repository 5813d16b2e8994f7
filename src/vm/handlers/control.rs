//! Control flow opcode handlers: jumps, closures, calls and returns.

use std::rc::Rc;

use zinc_compiler::{Chunk, Constant, OpCode};
use zinc_core::RuntimeError;

use crate::vm::{CallFrame, Closure, Result, Value, VirtualMachine};

/// What the dispatch loop does after a control flow instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    /// Stop interpreting.
    Halt,
}

impl VirtualMachine {
    /// Execute a control flow opcode.
    pub(crate) fn execute_control(&mut self, op: OpCode, chunk: &Chunk) -> Result<ControlFlow> {
        match op {
            OpCode::Jmp => {
                let offset = self.read_i16(chunk)?;
                self.jump(offset, chunk)?;
            }
            OpCode::Jif | OpCode::Jit => {
                let offset = self.read_i16(chunk)?;
                let condition = self.pop_bool()?;
                if condition == (op == OpCode::Jit) {
                    self.jump(offset, chunk)?;
                }
            }
            OpCode::CreateFunction => {
                let index = self.read_u16(chunk)?;
                self.create_function(index, chunk)?;
            }
            OpCode::Call => {
                let argc = self.read_byte(chunk)?;
                self.call(argc as usize)?;
            }
            OpCode::Return | OpCode::ReturnValue => {
                return self.return_from_frame(op == OpCode::ReturnValue);
            }
            OpCode::End => return Ok(ControlFlow::Halt),
            _ => {
                return Err(RuntimeError::InvalidOpcode {
                    byte: op as u8,
                    offset: self.op_offset,
                });
            }
        }
        Ok(ControlFlow::Continue)
    }

    /// Move relative to the byte after the displacement.
    fn jump(&mut self, offset: i16, chunk: &Chunk) -> Result<()> {
        let target = self
            .ip
            .checked_add_signed(isize::from(offset))
            .filter(|&target| target <= chunk.len())
            .ok_or(self.out_of_range(offset as usize))?;
        self.ip = target;
        Ok(())
    }

    /// Pop the prototype's captures and push the new function value.
    fn create_function(&mut self, index: u16, chunk: &Chunk) -> Result<()> {
        let Some(Constant::Function(proto)) = chunk.constant(index) else {
            return Err(self.out_of_range(index as usize));
        };
        let captures = self
            .stack
            .pop_n(proto.captures as usize)
            .ok_or(RuntimeError::StackUnderflow {
                offset: self.op_offset,
            })?;
        self.push(Value::Function(Rc::new(Closure {
            address: proto.address as usize,
            captures,
        })))
    }

    /// Enter the function sitting beneath the top `argc` values.
    fn call(&mut self, argc: usize) -> Result<()> {
        let underflow = RuntimeError::StackUnderflow {
            offset: self.op_offset,
        };
        let callee_index = self
            .stack
            .len()
            .checked_sub(argc + 1)
            .ok_or(underflow.clone())?;
        let callee = self.stack.remove(callee_index).ok_or(underflow)?;
        let closure = match callee {
            Value::Function(closure) => closure,
            other => return Err(self.mismatch("function", &other)),
        };

        self.frames.push(CallFrame {
            base: callee_index,
            return_ip: self.ip,
        })?;
        for capture in &closure.captures {
            self.push(capture.clone())?;
        }
        self.ip = closure.address;
        Ok(())
    }

    /// Leave the current frame, carrying the return value if there is one.
    fn return_from_frame(&mut self, has_value: bool) -> Result<ControlFlow> {
        if self.frames.depth() <= 1 {
            return Ok(ControlFlow::Halt);
        }
        let value = if has_value { Some(self.pop()?) } else { None };
        let frame = self.frames.pop().ok_or(RuntimeError::StackUnderflow {
            offset: self.op_offset,
        })?;

        self.stack.truncate(frame.base);
        if let Some(value) = value {
            self.push(value)?;
        }
        self.ip = frame.return_ip;
        Ok(ControlFlow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use zinc_core::Span;

    use super::*;

    #[test]
    fn conditional_jumps_pop_their_test() {
        let mut chunk = Chunk::new();
        let span = Span::default();
        // TRUE; JIT +1; NONE; END
        chunk.write_op(OpCode::True, span);
        chunk.write_op(OpCode::Jit, span);
        chunk.write_u16(1, span);
        chunk.write_op(OpCode::None, span);
        chunk.write_op(OpCode::End, span);

        let mut vm = VirtualMachine::default();
        vm.interpret(&chunk, &mut Vec::new()).unwrap();
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn jumps_outside_the_chunk_are_rejected() {
        let mut chunk = Chunk::new();
        let span = Span::default();
        chunk.write_op(OpCode::Jmp, span);
        chunk.write_u16((-10i16) as u16, span);

        let mut vm = VirtualMachine::default();
        let error = vm.interpret(&chunk, &mut Vec::new()).unwrap_err();
        assert!(matches!(error, RuntimeError::OperandOutOfRange { offset: 0, .. }));
    }

    #[test]
    fn calling_a_non_function_is_a_defect() {
        let mut chunk = Chunk::new();
        let span = Span::default();
        chunk.write_op(OpCode::True, span);
        chunk.write_op(OpCode::Call, span);
        chunk.write_byte(0, span);

        let mut vm = VirtualMachine::default();
        assert_eq!(
            vm.interpret(&chunk, &mut Vec::new()),
            Err(RuntimeError::TypeMismatch {
                expected: "function",
                found: "bool",
                offset: 1
            })
        );
    }
}
