//! Local, global and struct field opcode handlers.

use zinc_compiler::{Chunk, OpCode};
use zinc_core::RuntimeError;

use crate::vm::{Result, Value, VirtualMachine};

impl VirtualMachine {
    /// Execute a variable or struct opcode.
    pub(crate) fn execute_variables(&mut self, op: OpCode, chunk: &Chunk) -> Result<()> {
        let operand = self.read_byte(chunk)? as usize;
        match op {
            OpCode::GetStack => {
                let index = self.frame_base()? + operand;
                self.load(index, operand)
            }
            OpCode::SetStack => {
                let index = self.frame_base()? + operand;
                self.store(index, operand)
            }
            OpCode::GetGlobal => self.load(operand, operand),
            OpCode::SetGlobal => self.store(operand, operand),
            OpCode::Alloc => {
                let fields = self.stack.pop_n(operand).ok_or(RuntimeError::StackUnderflow {
                    offset: self.op_offset,
                })?;
                self.push(Value::group(fields))
            }
            OpCode::GetInd => {
                let group = self.pop()?;
                let Value::Group(fields) = &group else {
                    return Err(self.mismatch("group", &group));
                };
                let field = fields.borrow().get(operand).cloned();
                let field = field.ok_or(self.out_of_range(operand))?;
                self.push(field)
            }
            OpCode::SetInd => {
                let value = self.pop()?;
                let group = self.pop()?;
                let Value::Group(fields) = &group else {
                    return Err(self.mismatch("group", &group));
                };
                {
                    let mut fields = fields.borrow_mut();
                    let slot = fields.get_mut(operand).ok_or(self.out_of_range(operand))?;
                    *slot = value.deep_copy();
                }
                self.push(value)
            }
            _ => Err(RuntimeError::InvalidOpcode {
                byte: op as u8,
                offset: self.op_offset,
            }),
        }
    }

    /// Push the value at an absolute stack index. Groups are pushed as shared handles.
    fn load(&mut self, index: usize, operand: usize) -> Result<()> {
        let value = self
            .stack
            .get(index)
            .cloned()
            .ok_or(self.out_of_range(operand))?;
        self.push(value)
    }

    /// Overwrite an absolute stack index with the top value, leaving it in place.
    fn store(&mut self, index: usize, operand: usize) -> Result<()> {
        let top = self.stack.len().checked_sub(1).and_then(|i| self.stack.get(i));
        let value = top.cloned().ok_or(RuntimeError::StackUnderflow {
            offset: self.op_offset,
        })?;
        self.stack
            .set(index, value)
            .ok_or(self.out_of_range(operand))
    }
}

#[cfg(test)]
mod tests {
    use zinc_core::Span;

    use super::*;

    fn chunk(ops: &[(OpCode, Option<u8>)]) -> Chunk {
        let mut chunk = Chunk::new();
        for &(op, operand) in ops {
            chunk.write_op(op, Span::default());
            if let Some(byte) = operand {
                chunk.write_byte(byte, Span::default());
            }
        }
        chunk.write_op(OpCode::End, Span::default());
        chunk
    }

    #[test]
    fn set_stack_leaves_value_on_top() {
        let chunk = chunk(&[
            (OpCode::False, None),
            (OpCode::True, None),
            (OpCode::SetStack, Some(0)),
        ]);
        let mut vm = VirtualMachine::default();
        vm.interpret(&chunk, &mut Vec::new()).unwrap();
        assert_eq!(vm.stack().len(), 2);
        assert_eq!(vm.stack().get(0), Some(&Value::Bool(true)));
        assert_eq!(vm.stack().get(1), Some(&Value::Bool(true)));
    }

    #[test]
    fn alloc_and_field_access() {
        let chunk = chunk(&[
            (OpCode::True, None),
            (OpCode::False, None),
            (OpCode::Alloc, Some(2)),
            (OpCode::GetInd, Some(1)),
        ]);
        let mut vm = VirtualMachine::default();
        vm.interpret(&chunk, &mut Vec::new()).unwrap();
        assert_eq!(vm.stack().get(0), Some(&Value::Bool(false)));
    }

    #[test]
    fn bad_slot_is_out_of_range() {
        let chunk = chunk(&[(OpCode::GetStack, Some(3))]);
        let mut vm = VirtualMachine::default();
        assert_eq!(
            vm.interpret(&chunk, &mut Vec::new()),
            Err(RuntimeError::OperandOutOfRange {
                operand: 3,
                offset: 0
            })
        );
    }
}
