//! Bytecode operation codes.
//!
//! This module defines the instruction set for the Zinc VM.
//! Each opcode is a single byte, with operands following inline.

use num_enum::TryFromPrimitive;

/// Bytecode operation codes.
///
/// The VM is a stack-based machine. Most operations pop operands
/// from the stack and push results back. Multi-byte operands are big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    /// Push constant from pool.
    /// Operand: u16 constant index
    Const = 0,
    /// Push an integral number without touching the pool.
    /// Operand: u16 value in `0..=32767`
    CreateNum,
    /// Pop N values into a new group, first field deepest.
    /// Operand: u8 field count
    Alloc,
    /// Push unit.
    None,
    /// Push boolean true.
    True,
    /// Push boolean false.
    False,

    // =========================================================================
    // Stack Operations
    // =========================================================================
    /// Pop top of stack.
    Pop,

    // =========================================================================
    // Arithmetic (num)
    // =========================================================================
    Add,
    Sub,
    Div,
    Mul,
    Mod,
    Pow,
    /// Logical negation of a bool.
    Not,
    /// Arithmetic negation of a number.
    Neg,

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Unconditional jump.
    /// Operand: i16 offset from the byte after the operand
    Jmp,
    /// Pop a bool, jump if false.
    /// Operand: i16 offset
    Jif,
    /// Pop a bool, jump if true.
    /// Operand: i16 offset
    Jit,

    // =========================================================================
    // Locals and Fields
    // =========================================================================
    /// Push a local of the current frame.
    /// Operand: u8 frame-relative slot
    GetStack,
    /// Store top of stack into a local, leaving the value in place.
    /// Operand: u8 frame-relative slot
    SetStack,
    /// Replace a group with one of its fields.
    /// Operand: u8 field index
    GetInd,
    /// Pop a value and a group, store the value into the field, push the value.
    /// Operand: u8 field index
    SetInd,

    // =========================================================================
    // Functions
    // =========================================================================
    /// Pop captured values and push a function value.
    /// Operand: u16 constant index of the function prototype
    CreateFunction,
    /// Call the function beneath the arguments.
    /// Operand: u8 argument count
    Call,
    /// Return without a value.
    Return,
    /// Return the top of stack.
    ReturnValue,
    /// Halt.
    End,

    // =========================================================================
    // Comparison
    // =========================================================================
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // =========================================================================
    // Globals and Output
    // =========================================================================
    /// Push a global.
    /// Operand: u8 absolute slot
    GetGlobal,
    /// Store top of stack into a global, leaving the value in place.
    /// Operand: u8 absolute slot
    SetGlobal,
    /// Pop a value and write it to the output sink.
    Print,
}

impl OpCode {
    /// Convert a raw byte to an opcode.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Get the size of operands for this opcode in bytes.
    ///
    /// This does NOT include the opcode byte itself.
    pub fn operand_size(&self) -> usize {
        match self {
            // 1-byte operand
            OpCode::Alloc         // u8 field count
            | OpCode::GetStack    // u8 slot
            | OpCode::SetStack    // u8 slot
            | OpCode::GetInd      // u8 field index
            | OpCode::SetInd      // u8 field index
            | OpCode::Call        // u8 arg count
            | OpCode::GetGlobal   // u8 slot
            | OpCode::SetGlobal => 1, // u8 slot

            // 2-byte operand
            OpCode::Const           // u16 constant index
            | OpCode::CreateNum     // u16 value
            | OpCode::Jmp           // i16 offset
            | OpCode::Jif           // i16 offset
            | OpCode::Jit           // i16 offset
            | OpCode::CreateFunction => 2, // u16 constant index

            _ => 0,
        }
    }

    /// Whether the operand is a signed jump displacement.
    pub fn is_jump(&self) -> bool {
        matches!(self, OpCode::Jmp | OpCode::Jif | OpCode::Jit)
    }

    /// Get the name of this opcode for debugging.
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Const => "CONST",
            OpCode::CreateNum => "CREATE_NUM",
            OpCode::Alloc => "ALLOC",
            OpCode::None => "NONE",
            OpCode::True => "TRUE",
            OpCode::False => "FALSE",
            OpCode::Pop => "POP",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Div => "DIV",
            OpCode::Mul => "MUL",
            OpCode::Mod => "MOD",
            OpCode::Pow => "POW",
            OpCode::Not => "NOT",
            OpCode::Neg => "NEG",
            OpCode::Jmp => "JMP",
            OpCode::Jif => "JIF",
            OpCode::Jit => "JIT",
            OpCode::GetStack => "GET_STACK",
            OpCode::SetStack => "SET_STACK",
            OpCode::GetInd => "GET_IND",
            OpCode::SetInd => "SET_IND",
            OpCode::CreateFunction => "CREATE_FUNCTION",
            OpCode::Call => "CALL",
            OpCode::Return => "RETURN",
            OpCode::ReturnValue => "RETURN_VALUE",
            OpCode::End => "END",
            OpCode::Equal => "EQUAL",
            OpCode::NotEqual => "NOT_EQUAL",
            OpCode::Greater => "GREATER",
            OpCode::GreaterEqual => "GREATER_EQUAL",
            OpCode::Less => "LESS",
            OpCode::LessEqual => "LESS_EQUAL",
            OpCode::GetGlobal => "GET_GLOBAL",
            OpCode::SetGlobal => "SET_GLOBAL",
            OpCode::Print => "PRINT",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_repr() {
        assert_eq!(OpCode::Const as u8, 0);
        assert_eq!(OpCode::CreateNum as u8, 1);
        assert_eq!(OpCode::Print as u8, 35);
    }

    #[test]
    fn opcode_from_u8() {
        assert_eq!(OpCode::from_u8(0), Some(OpCode::Const));
        assert_eq!(OpCode::from_u8(OpCode::Call as u8), Some(OpCode::Call));
        // Print is the last opcode
        assert_eq!(OpCode::from_u8(OpCode::Print as u8 + 1), None);
        assert_eq!(OpCode::from_u8(255), None);
    }

    #[test]
    fn opcode_name() {
        assert_eq!(OpCode::Const.name(), "CONST");
        assert_eq!(OpCode::ReturnValue.name(), "RETURN_VALUE");
        assert_eq!(OpCode::GreaterEqual.to_string(), "GREATER_EQUAL");
    }

    #[test]
    fn operand_sizes() {
        // No operands
        assert_eq!(OpCode::Pop.operand_size(), 0);
        assert_eq!(OpCode::Add.operand_size(), 0);
        assert_eq!(OpCode::ReturnValue.operand_size(), 0);

        // 1-byte operand
        assert_eq!(OpCode::GetStack.operand_size(), 1);
        assert_eq!(OpCode::Alloc.operand_size(), 1);
        assert_eq!(OpCode::Call.operand_size(), 1);

        // 2-byte operand
        assert_eq!(OpCode::Const.operand_size(), 2);
        assert_eq!(OpCode::Jif.operand_size(), 2);
        assert_eq!(OpCode::CreateFunction.operand_size(), 2);
    }

    #[test]
    fn jumps() {
        assert!(OpCode::Jmp.is_jump());
        assert!(OpCode::Jit.is_jump());
        assert!(!OpCode::Call.is_jump());
    }
}
