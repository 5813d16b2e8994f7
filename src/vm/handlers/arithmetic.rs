//! Arithmetic and comparison opcode handlers.
//!
//! Operand types are already proven by the resolver, so a mismatch here is a
//! bytecode defect rather than a user error.

use zinc_compiler::OpCode;
use zinc_core::RuntimeError;

use crate::vm::{Result, Value, VirtualMachine};

impl VirtualMachine {
    /// Execute an arithmetic, logic or comparison opcode.
    pub(crate) fn execute_arithmetic(&mut self, op: OpCode) -> Result<()> {
        match op {
            OpCode::Add => self.binary_num_op(|a, b| Value::Number(a + b)),
            OpCode::Sub => self.binary_num_op(|a, b| Value::Number(a - b)),
            OpCode::Mul => self.binary_num_op(|a, b| Value::Number(a * b)),
            OpCode::Div => self.binary_num_op(|a, b| Value::Number(a / b)),
            OpCode::Mod => self.binary_num_op(|a, b| Value::Number(a % b)),
            OpCode::Pow => self.binary_num_op(|a, b| Value::Number(a.powf(b))),
            OpCode::Greater => self.binary_num_op(|a, b| Value::Bool(a > b)),
            OpCode::GreaterEqual => self.binary_num_op(|a, b| Value::Bool(a >= b)),
            OpCode::Less => self.binary_num_op(|a, b| Value::Bool(a < b)),
            OpCode::LessEqual => self.binary_num_op(|a, b| Value::Bool(a <= b)),
            OpCode::Equal | OpCode::NotEqual => {
                let b = self.pop()?;
                let a = self.pop()?;
                let equal = a == b;
                self.push(Value::Bool(if op == OpCode::Equal { equal } else { !equal }))
            }
            OpCode::Not => {
                let value = self.pop_bool()?;
                self.push(Value::Bool(!value))
            }
            OpCode::Neg => {
                let value = self.pop_number()?;
                self.push(Value::Number(-value))
            }
            _ => Err(RuntimeError::InvalidOpcode {
                byte: op as u8,
                offset: self.op_offset,
            }),
        }
    }

    fn binary_num_op(&mut self, apply: impl FnOnce(f64, f64) -> Value) -> Result<()> {
        let b = self.pop_number()?;
        let a = self.pop_number()?;
        self.push(apply(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(op: OpCode, operands: &[Value]) -> Result<Value> {
        let mut vm = VirtualMachine::default();
        vm.reset()?;
        for value in operands {
            vm.push(value.clone())?;
        }
        vm.execute_arithmetic(op)?;
        vm.pop()
    }

    #[test]
    fn operand_order_is_left_then_right() {
        let operands = [Value::Number(7.0), Value::Number(2.0)];
        assert_eq!(apply(OpCode::Sub, &operands), Ok(Value::Number(5.0)));
        assert_eq!(apply(OpCode::Div, &operands), Ok(Value::Number(3.5)));
        assert_eq!(apply(OpCode::Mod, &operands), Ok(Value::Number(1.0)));
        assert_eq!(apply(OpCode::Pow, &operands), Ok(Value::Number(49.0)));
        assert_eq!(apply(OpCode::Greater, &operands), Ok(Value::Bool(true)));
    }

    #[test]
    fn equality_compares_contents() {
        let operands = [Value::Str("a".into()), Value::Str("a".into())];
        assert_eq!(apply(OpCode::Equal, &operands), Ok(Value::Bool(true)));
        assert_eq!(apply(OpCode::NotEqual, &operands), Ok(Value::Bool(false)));
    }

    #[test]
    fn wrong_operand_kind_is_a_defect() {
        let result = apply(OpCode::Add, &[Value::Number(1.0), Value::Bool(true)]);
        assert_eq!(
            result,
            Err(RuntimeError::TypeMismatch {
                expected: "num",
                found: "bool",
                offset: 0
            })
        );
    }
}
