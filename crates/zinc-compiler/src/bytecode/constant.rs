//! Constant pool for compiled programs.
//!
//! The constant pool stores values that are referenced by bytecode
//! instructions: literals that do not fit an immediate operand, and the
//! prototypes that `CREATE_FUNCTION` instantiates.

use std::fmt;
use std::rc::Rc;

/// Values stored in the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Number literal (every number is an `f64`).
    Number(f64),
    /// Char literal.
    Char(char),
    /// String literal, already unescaped.
    Str(Rc<str>),
    /// Function prototype.
    Function(FunctionProto),
}

/// Where a function's code starts and how it is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionProto {
    /// Offset of the first instruction of the body.
    pub address: u32,
    /// Number of parameters.
    pub arity: u8,
    /// Number of captured values `CREATE_FUNCTION` pops.
    pub captures: u8,
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Number(n) => write!(f, "{n}"),
            Constant::Char(c) => write!(f, "{c:?}"),
            Constant::Str(s) => write!(f, "{s:?}"),
            Constant::Function(proto) => write!(
                f,
                "<fn @{} arity {} captures {}>",
                proto.address, proto.arity, proto.captures
            ),
        }
    }
}

/// Program-wide constant pool.
///
/// Append-only: every literal site gets its own entry, and the index is
/// what the instruction operand refers to. The only entries rewritten after
/// the fact are function prototypes, whose address is known once the body
/// has been emitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantPool {
    constants: Vec<Constant>,
}

impl ConstantPool {
    /// Largest number of entries a u16 operand can address.
    pub const MAX_LEN: usize = u16::MAX as usize + 1;

    /// Create a new empty constant pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a constant, returning its index, or `None` when the pool is full.
    pub fn add(&mut self, constant: Constant) -> Option<u16> {
        let index = u16::try_from(self.constants.len()).ok()?;
        self.constants.push(constant);
        Some(index)
    }

    /// Get constant by index.
    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    /// Set the code address of a previously added prototype.
    ///
    /// Returns `false` if the index does not hold a function.
    pub fn patch_function_address(&mut self, index: u16, address: u32) -> bool {
        match self.constants.get_mut(index as usize) {
            Some(Constant::Function(proto)) => {
                proto.address = address;
                true
            }
            _ => false,
        }
    }

    /// Get all constants.
    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Number of constants.
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_every_entry() {
        let mut pool = ConstantPool::new();
        let a = pool.add(Constant::Number(1.5));
        let b = pool.add(Constant::Number(1.5));

        assert_eq!(a, Some(0));
        assert_eq!(b, Some(1));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn get_constant() {
        let mut pool = ConstantPool::new();
        let idx = pool.add(Constant::Str("hello".into())).unwrap();

        assert_eq!(pool.get(idx), Some(&Constant::Str("hello".into())));
        assert_eq!(pool.get(99), None);
    }

    #[test]
    fn pool_is_bounded_by_u16() {
        let mut pool = ConstantPool::new();
        for _ in 0..ConstantPool::MAX_LEN {
            assert!(pool.add(Constant::Char('x')).is_some());
        }
        assert_eq!(pool.add(Constant::Char('x')), None);
    }

    #[test]
    fn patch_function() {
        let mut pool = ConstantPool::new();
        let num = pool.add(Constant::Number(2.0)).unwrap();
        let func = pool
            .add(Constant::Function(FunctionProto {
                address: 0,
                arity: 2,
                captures: 0,
            }))
            .unwrap();

        assert!(pool.patch_function_address(func, 40));
        assert!(!pool.patch_function_address(num, 40));
        assert!(matches!(
            pool.get(func),
            Some(Constant::Function(FunctionProto { address: 40, .. }))
        ));
    }

    #[test]
    fn display() {
        assert_eq!(Constant::Number(2.5).to_string(), "2.5");
        assert_eq!(Constant::Str("hi".into()).to_string(), "\"hi\"");
        assert_eq!(Constant::Char('a').to_string(), "'a'");
    }
}
