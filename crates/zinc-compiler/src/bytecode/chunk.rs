//! Compiled program chunk.
//!
//! A [`Chunk`] holds the bytecode for a whole program: the top-level
//! prologue followed by every function body, a source span for each byte,
//! the constant pool, and a symbol table naming the function bodies.

use zinc_core::Span;

use super::{Constant, ConstantPool, OpCode};

/// Where one function body lives in the code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbol {
    /// Function name; nested functions are qualified as `outer.inner`.
    pub name: String,
    /// Offset of the first body instruction.
    pub start: usize,
    /// Offset one past the last body instruction.
    pub end: usize,
}

/// The compiled output of one compilation.
///
/// Immutable once the compiler hands it out; the VM may run it any number
/// of times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    /// The bytecode instructions.
    code: Vec<u8>,
    /// Source span for each byte (parallel to code).
    spans: Vec<Span>,
    /// Constants referenced by `CONST` and `CREATE_FUNCTION`.
    constants: ConstantPool,
    /// Function bodies in emission order.
    symbols: Vec<FunctionSymbol>,
    /// Offset execution starts at.
    entry: usize,
}

impl Chunk {
    /// Create a new empty chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an opcode.
    pub fn write_op(&mut self, op: OpCode, span: Span) {
        self.write_byte(op as u8, span);
    }

    /// Write a byte operand.
    pub fn write_byte(&mut self, byte: u8, span: Span) {
        self.code.push(byte);
        self.spans.push(span);
    }

    /// Write a 16-bit operand (big-endian).
    pub fn write_u16(&mut self, value: u16, span: Span) {
        for byte in value.to_be_bytes() {
            self.write_byte(byte, span);
        }
    }

    /// Overwrite a previously written 16-bit operand in place.
    ///
    /// Returns `false` if `offset` does not address two written bytes.
    pub fn patch_u16(&mut self, offset: usize, value: u16) -> bool {
        match self.code.get_mut(offset..offset + 2) {
            Some(slot) => {
                slot.copy_from_slice(&value.to_be_bytes());
                true
            }
            None => false,
        }
    }

    /// Get current code offset (for jump patching).
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    pub fn constants(&self) -> &ConstantPool {
        &self.constants
    }

    pub fn constants_mut(&mut self) -> &mut ConstantPool {
        &mut self.constants
    }

    /// Get a constant by index.
    pub fn constant(&self, index: u16) -> Option<&Constant> {
        self.constants.get(index)
    }

    /// Record a function body.
    pub fn add_symbol(&mut self, name: impl Into<String>, start: usize, end: usize) {
        self.symbols.push(FunctionSymbol {
            name: name.into(),
            start,
            end,
        });
    }

    pub fn symbols(&self) -> &[FunctionSymbol] {
        &self.symbols
    }

    /// Find a function body by name.
    pub fn function(&self, name: &str) -> Option<&FunctionSymbol> {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }

    /// The name of the function whose body contains `offset`, if any.
    pub fn function_at(&self, offset: usize) -> Option<&FunctionSymbol> {
        self.symbols
            .iter()
            .filter(|symbol| symbol.start <= offset && offset < symbol.end)
            .min_by_key(|symbol| symbol.end - symbol.start)
    }

    /// Offset execution starts at.
    pub fn entry(&self) -> usize {
        self.entry
    }

    /// Get the bytecode.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Get the source spans.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Get the source span for a given offset.
    pub fn span_at(&self, offset: usize) -> Option<Span> {
        self.spans.get(offset).copied()
    }

    /// Get the length of the bytecode.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Check if the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Read a byte at the given offset.
    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Read a u16 at the given offset (big-endian).
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.code.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read an i16 jump displacement at the given offset (big-endian).
    pub fn read_i16(&self, offset: usize) -> Option<i16> {
        self.read_u16(offset).map(|value| value as i16)
    }

    /// Read an opcode at the given offset.
    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.code.get(offset).and_then(|&b| OpCode::from_u8(b))
    }

    /// Extract all opcodes from the chunk, skipping operands.
    ///
    /// This is useful for testing bytecode sequences without worrying about
    /// specific operand values or instruction offsets.
    pub fn opcodes(&self) -> Vec<OpCode> {
        self.opcodes_in(0, self.code.len())
    }

    /// Opcodes of one function body, found by name.
    pub fn function_opcodes(&self, name: &str) -> Option<Vec<OpCode>> {
        self.function(name)
            .map(|symbol| self.opcodes_in(symbol.start, symbol.end))
    }

    fn opcodes_in(&self, start: usize, end: usize) -> Vec<OpCode> {
        let mut ops = Vec::new();
        let mut offset = start;

        while offset < end.min(self.code.len()) {
            if let Some(op) = self.read_op(offset) {
                ops.push(op);
                offset += 1 + op.operand_size();
            } else {
                // Invalid opcode, skip one byte
                offset += 1;
            }
        }

        ops
    }

    /// Check if this chunk contains exactly the given opcode sequence.
    ///
    /// This ignores operand values, only checking the opcodes themselves.
    /// Panics with a descriptive message if the sequences don't match.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        assert_sequence(&self.opcodes(), expected);
    }

    /// Check one function body's exact opcode sequence.
    #[track_caller]
    pub fn assert_function_opcodes(&self, name: &str, expected: &[OpCode]) {
        match self.function_opcodes(name) {
            Some(actual) => assert_sequence(&actual, expected),
            None => panic!("No function named '{name}' in chunk."),
        }
    }

    /// Check if this chunk contains the given opcodes (in order, but not necessarily contiguous).
    ///
    /// Useful for verifying key opcodes are present without checking every instruction.
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        let mut expected_iter = expected.iter().peekable();

        for op in &actual {
            if expected_iter.peek() == Some(&op) {
                expected_iter.next();
            }
        }

        if expected_iter.peek().is_some() {
            let remaining: Vec<_> = expected_iter.map(|op| op.name()).collect();
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nActual bytecode:  {:?}",
                remaining,
                actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
            );
        }
    }
}

#[track_caller]
fn assert_sequence(actual: &[OpCode], expected: &[OpCode]) {
    assert_eq!(
        actual,
        expected,
        "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
        expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
        actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
    );
}
