//! Opcode handlers, organised by category.

pub mod arithmetic;
pub mod control;
pub mod variables;
