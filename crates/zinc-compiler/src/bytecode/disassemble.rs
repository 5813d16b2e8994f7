//! Human-readable listing of a [`Chunk`].

use std::fmt::Write;

use super::{Chunk, OpCode};

impl Chunk {
    /// Render every instruction, one per line, with function headers.
    ///
    /// ```text
    /// 0000    1  CREATE_FUNCTION    0 <fn @12 arity 0 captures 0>
    /// ...
    /// == main ==
    /// 0012    2  CREATE_NUM         3
    /// ```
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        let mut offset = 0;
        let mut previous_line = None;

        while offset < self.len() {
            for symbol in self.symbols().iter().filter(|s| s.start == offset) {
                let _ = writeln!(out, "== {} ==", symbol.name);
                previous_line = None;
            }
            let (text, next) = self.disassemble_instruction(offset);

            let line = self.span_at(offset).map(|span| span.line);
            let gutter = match line {
                Some(line) if previous_line != Some(line) => format!("{line:4}"),
                _ => "   |".to_string(),
            };
            previous_line = line;

            let _ = writeln!(out, "{offset:04} {gutter}  {text}");
            offset = next;
        }
        out
    }

    /// Render the instruction at `offset`, returning it with the offset of the next one.
    pub fn disassemble_instruction(&self, offset: usize) -> (String, usize) {
        let Some(op) = self.read_op(offset) else {
            let byte = self.read_byte(offset).unwrap_or_default();
            return (format!("<invalid {byte:#04x}>"), offset + 1);
        };
        let next = offset + 1 + op.operand_size();

        let text = match op.operand_size() {
            0 => op.name().to_string(),
            1 => match self.read_byte(offset + 1) {
                Some(byte) => format!("{:<18} {byte}", op.name()),
                None => format!("{} <truncated>", op.name()),
            },
            _ => match self.read_u16(offset + 1) {
                Some(raw) if op.is_jump() => {
                    let target = next as i64 + i64::from(raw as i16);
                    format!("{:<18} {} -> {target:04}", op.name(), raw as i16)
                }
                Some(index) if matches!(op, OpCode::Const | OpCode::CreateFunction) => {
                    match self.constant(index) {
                        Some(constant) => format!("{:<18} {index} {constant}", op.name()),
                        None => format!("{:<18} {index} <missing>", op.name()),
                    }
                }
                Some(value) => format!("{:<18} {value}", op.name()),
                None => format!("{} <truncated>", op.name()),
            },
        };
        (text, next)
    }
}

#[cfg(test)]
mod tests {
    use zinc_core::Span;

    use crate::bytecode::{Chunk, Constant, OpCode};

    #[test]
    fn lists_instructions_with_operands() {
        let mut chunk = Chunk::new();
        let span = Span::new(0, 1, 1);
        let index = chunk.constants_mut().add(Constant::Number(2.5)).unwrap();
        chunk.write_op(OpCode::Const, span);
        chunk.write_u16(index, span);
        chunk.write_op(OpCode::Jmp, Span::new(2, 3, 2));
        chunk.write_u16(1, Span::new(2, 3, 2));
        chunk.write_op(OpCode::Pop, Span::new(2, 3, 2));
        chunk.write_op(OpCode::End, Span::new(2, 3, 2));

        let listing = chunk.disassemble();
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("0000    1  CONST"));
        assert!(lines[0].ends_with("0 2.5"));
        assert!(lines[1].ends_with("1 -> 0007"));
        assert!(lines[2].starts_with("0006    |  POP"));
    }

    #[test]
    fn headers_mark_functions() {
        let mut chunk = Chunk::new();
        let span = Span::new(0, 1, 1);
        chunk.write_op(OpCode::End, span);
        chunk.write_op(OpCode::Return, span);
        chunk.add_symbol("main", 1, 2);

        let listing = chunk.disassemble();
        assert!(listing.contains("== main ==\n0001    1  RETURN"));
    }

    #[test]
    fn invalid_bytes_are_reported() {
        let mut chunk = Chunk::new();
        chunk.write_byte(0xEE, Span::new(0, 1, 1));
        let (text, next) = chunk.disassemble_instruction(0);
        assert_eq!(text, "<invalid 0xee>");
        assert_eq!(next, 1);
    }
}
