//! Core types shared across the Zinc crates.
//!
//! This crate holds the pieces every stage needs:
//!
//! - [`Span`] for source locations
//! - [`CompilerError`] / [`CompilerErrors`] for diagnostics
//! - [`RuntimeError`] for virtual machine failures
//! - [`ZincError`] wrapping both for host code

pub mod error;
pub mod span;

pub use error::{CompilerError, CompilerErrors, OverflowedStack, RuntimeError, ZincError};
pub use span::Span;
