//! Bytecode types for the Zinc compiler.
//!
//! This module contains the core bytecode types:
//!
//! - [`OpCode`] - The instruction set for the VM
//! - [`Chunk`] - Compiled bytecode for a whole program
//! - [`Constant`] and [`ConstantPool`] - Program-wide constant storage

mod chunk;
mod constant;
mod disassemble;
mod opcode;

pub use chunk::{Chunk, FunctionSymbol};
pub use constant::{Constant, ConstantPool, FunctionProto};
pub use opcode::OpCode;
