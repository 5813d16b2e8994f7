//! Error types shared by every stage of the Zinc pipeline.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ZincError (top-level wrapper)
//! ├── CompilerErrors  - every diagnostic from lexing, parsing and resolution
//! │   └── CompilerError (Token | OneRange | TwoRange)
//! └── RuntimeError    - failures while the virtual machine runs a chunk
//! ```
//!
//! Compiler diagnostics are never thrown one at a time. Each stage pushes them
//! into a [`CompilerErrors`] sink and keeps going where it safely can, so the
//! host sees everything found up to the point compilation stopped.

use std::fmt;

use thiserror::Error;

use crate::Span;

// ============================================================================
// Compiler Errors
// ============================================================================

/// A single compile-time diagnostic.
///
/// Every variant carries at least one source span. The renderer maps spans
/// back to lines; nothing in here formats source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilerError {
    /// An error attached to one token, such as an unresolved name.
    #[error("{message}")]
    Token {
        /// Span of the offending token.
        span: Span,
        /// Source text of the offending token.
        lexeme: String,
        /// Human readable description.
        message: String,
    },

    /// An error covering one source range.
    #[error("{message}")]
    OneRange {
        /// The range the error points at.
        span: Span,
        /// Human readable description.
        message: String,
    },

    /// An error relating two source ranges, e.g. a declaration and a use.
    #[error("{message}")]
    TwoRange {
        /// The earlier or "original" site.
        first: Span,
        /// The later or "offending" site.
        second: Span,
        /// Label for the first range.
        first_message: String,
        /// Label for the second range.
        second_message: String,
        /// Overall description.
        message: String,
    },
}

impl CompilerError {
    /// Create a token error.
    pub fn token(span: Span, lexeme: impl Into<String>, message: impl Into<String>) -> Self {
        CompilerError::Token {
            span,
            lexeme: lexeme.into(),
            message: message.into(),
        }
    }

    /// Create a single-range error.
    pub fn one_range(span: Span, message: impl Into<String>) -> Self {
        CompilerError::OneRange {
            span,
            message: message.into(),
        }
    }

    /// Create a two-range error.
    pub fn two_range(
        first: Span,
        second: Span,
        first_message: impl Into<String>,
        second_message: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CompilerError::TwoRange {
            first,
            second,
            first_message: first_message.into(),
            second_message: second_message.into(),
            message: message.into(),
        }
    }

    /// The overall message of this error.
    pub fn message(&self) -> &str {
        match self {
            CompilerError::Token { message, .. }
            | CompilerError::OneRange { message, .. }
            | CompilerError::TwoRange { message, .. } => message,
        }
    }

    /// The span the error is primarily about.
    ///
    /// For two-range errors this is the second (offending) site.
    pub fn primary_span(&self) -> Span {
        match self {
            CompilerError::Token { span, .. } | CompilerError::OneRange { span, .. } => *span,
            CompilerError::TwoRange { second, .. } => *second,
        }
    }

    /// All spans with their labels, in source-report order.
    pub fn spans(&self) -> Vec<(Span, &str)> {
        match self {
            CompilerError::Token { span, message, .. }
            | CompilerError::OneRange { span, message } => vec![(*span, message.as_str())],
            CompilerError::TwoRange {
                first,
                second,
                first_message,
                second_message,
                ..
            } => vec![
                (*first, first_message.as_str()),
                (*second, second_message.as_str()),
            ],
        }
    }
}

/// The shared sink every compiler stage pushes diagnostics into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerErrors {
    errors: Vec<CompilerError>,
}

impl CompilerErrors {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a diagnostic.
    pub fn push(&mut self, error: CompilerError) {
        self.errors.push(error);
    }

    /// Record every diagnostic from another sink.
    pub fn extend(&mut self, other: CompilerErrors) {
        self.errors.extend(other.errors);
    }

    /// Whether nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the recorded diagnostics in report order.
    pub fn iter(&self) -> impl Iterator<Item = &CompilerError> {
        self.errors.iter()
    }

    /// The first recorded diagnostic, if any.
    pub fn first(&self) -> Option<&CompilerError> {
        self.errors.first()
    }

    /// Consume the sink, returning the diagnostics.
    pub fn into_vec(self) -> Vec<CompilerError> {
        self.errors
    }
}

impl From<CompilerError> for CompilerErrors {
    fn from(error: CompilerError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for CompilerErrors {
    type Item = CompilerError;
    type IntoIter = std::vec::IntoIter<CompilerError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a CompilerErrors {
    type Item = &'a CompilerError;
    type IntoIter = std::slice::Iter<'a, CompilerError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for CompilerErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", error.primary_span(), error)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilerErrors {}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Which of the virtual machine's fixed-capacity stacks ran out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowedStack {
    /// The operand stack.
    Values,
    /// The call-frame stack.
    Frames,
}

impl fmt::Display for OverflowedStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowedStack::Values => write!(f, "value stack"),
            OverflowedStack::Frames => write!(f, "call stack"),
        }
    }
}

/// Errors that abort interpretation.
///
/// Stack exhaustion is the only failure a well-typed program can hit. Every
/// other variant means the bytecode itself is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A push went past the configured capacity of one of the stacks.
    #[error("stack overflow: {stack} exceeded its limit of {limit}")]
    StackOverflow {
        /// The stack that overflowed.
        stack: OverflowedStack,
        /// Its configured capacity.
        limit: usize,
    },

    /// A pop was attempted on an empty operand stack.
    #[error("stack underflow at offset {offset}")]
    StackUnderflow { offset: usize },

    /// The byte at `offset` is not an opcode.
    #[error("invalid opcode {byte:#04x} at offset {offset}")]
    InvalidOpcode { byte: u8, offset: usize },

    /// An instruction's operand runs past the end of the code.
    #[error("truncated instruction at offset {offset}")]
    TruncatedInstruction { offset: usize },

    /// A stack slot, field index or constant index is out of range.
    #[error("operand {operand} out of range at offset {offset}")]
    OperandOutOfRange { operand: usize, offset: usize },

    /// An instruction found a value of the wrong kind.
    #[error("type mismatch at offset {offset}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        offset: usize,
    },

    /// Writing to the output sink failed.
    #[error("output error: {message}")]
    Output { message: String },
}

impl RuntimeError {
    /// Whether this is a stack exhaustion rather than a bytecode defect.
    pub fn is_stack_overflow(&self) -> bool {
        matches!(self, RuntimeError::StackOverflow { .. })
    }
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Any error produced while compiling or running a Zinc program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZincError {
    /// Compilation reported one or more diagnostics.
    #[error(transparent)]
    Compile(#[from] CompilerErrors),

    /// The virtual machine aborted.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
