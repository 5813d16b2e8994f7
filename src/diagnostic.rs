//! Rendering compiler errors against their source.
//!
//! ```text
//! error: Immutable variable 'x' reassigned after initialization.
//!   |
//! 2 |     val x = 1;
//!   |     ^^^^^^^^^ Variable first initialized here.
//!   |
//! 3 |     x = 2;
//!   |     ^^^^^ Variable reassigned here.
//! ```
//!
//! Single-range errors get one block with a bare underline. Tabs are shown
//! as four spaces so underlines line up.

use std::fmt::Write;

use zinc_core::{CompilerError, CompilerErrors, Span};

const TAB: &str = "    ";

/// Render one error with the source lines it points at.
pub fn render(error: &CompilerError, source: &str) -> String {
    let mut out = format!("error: {}\n", error.message());
    let spans = error.spans();
    let labelled = spans.len() > 1;

    let width = spans
        .iter()
        .map(|(span, _)| last_line(*span, source))
        .max()
        .unwrap_or(1)
        .to_string()
        .len();

    for (span, label) in spans {
        let label = if labelled { label } else { "" };
        render_span(&mut out, source, span, label, width);
    }
    out
}

/// Render every error in order, separated by blank lines.
pub fn render_all(errors: &CompilerErrors, source: &str) -> String {
    errors
        .iter()
        .map(|error| render(error, source))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_span(out: &mut String, source: &str, span: Span, label: &str, width: usize) {
    let start = clamp(source, span.start as usize);
    let end = clamp(source, span.end as usize).max(start);
    let mut line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    let mut line_number = span.line as usize;

    let _ = writeln!(out, "{:width$} |", "");
    loop {
        let line_end = source[line_start..]
            .find('\n')
            .map_or(source.len(), |i| line_start + i);
        let text = &source[line_start..line_end];

        let from = start.max(line_start) - line_start;
        let to = end.min(line_end).max(start.max(line_start)) - line_start;
        let is_last = end <= line_end + 1 || line_end == source.len();

        let _ = writeln!(out, "{line_number:>width$} | {}", expand(text).trim_end());
        let indent = visual_width(&text[..from]);
        let carets = visual_width(&text[from..to]).max(1);
        let _ = write!(
            out,
            "{:width$} | {}{}",
            "",
            " ".repeat(indent),
            "^".repeat(carets)
        );
        if is_last && !label.is_empty() {
            let _ = write!(out, " {label}");
        }
        out.push('\n');

        if is_last {
            break;
        }
        line_start = line_end + 1;
        line_number += 1;
    }
}

/// Line number of the last line a span touches.
fn last_line(span: Span, source: &str) -> usize {
    let start = clamp(source, span.start as usize);
    let end = clamp(source, span.end as usize).max(start);
    let inner = source[start..end].trim_end_matches('\n');
    span.line as usize + inner.matches('\n').count()
}

/// Clamp an offset into `source`, backing up to a char boundary.
fn clamp(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn expand(text: &str) -> String {
    text.replace('\t', TAB)
}

fn visual_width(text: &str) -> usize {
    text.chars()
        .map(|c| if c == '\t' { TAB.len() } else { 1 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_of(source: &str, needle: &str) -> Span {
        let start = source.find(needle).unwrap();
        let line = source[..start].matches('\n').count() + 1;
        Span::new(start as u32, (start + needle.len()) as u32, line as u32)
    }

    #[test]
    fn single_range() {
        let source = "func main() {\n    1 + true;\n}";
        let error = CompilerError::one_range(
            span_of(source, "1 + true"),
            "Cannot perform binary '+' on 'num' and 'bool'.",
        );
        assert_eq!(
            render(&error, source),
            "error: Cannot perform binary '+' on 'num' and 'bool'.\n  |\n2 |     1 + true;\n  |     ^^^^^^^^\n"
        );
    }

    #[test]
    fn two_ranges_are_labelled() {
        let source = "val x = 1;\nx = 2;";
        let error = CompilerError::two_range(
            span_of(source, "val x = 1;"),
            span_of(source, "x = 2"),
            "Variable first initialized here.",
            "Variable reassigned here.",
            "Immutable variable 'x' reassigned after initialization.",
        );
        let rendered = render(&error, source);
        assert!(rendered.contains("1 | val x = 1;\n  | ^^^^^^^^^^ Variable first initialized here.\n"));
        assert!(rendered.contains("2 | x = 2;\n  | ^^^^^ Variable reassigned here.\n"));
    }

    #[test]
    fn tabs_are_expanded() {
        let source = "\tmissing;";
        let error = CompilerError::token(span_of(source, "missing"), "missing", "nope");
        assert!(render(&error, source).contains("1 |     missing;\n  |     ^^^^^^^\n"));
    }

    #[test]
    fn empty_span_gets_one_caret() {
        let source = "func helper() {}";
        let error = CompilerError::one_range(Span::point(16, 1), "Could not find main function.");
        assert!(render(&error, source).ends_with("  |                 ^\n"));
    }

    #[test]
    fn multi_line_span() {
        let source = "func f(): num {\n  1;\n}";
        let error = CompilerError::two_range(
            span_of(source, "func f(): num"),
            span_of(source, "{\n  1;\n}"),
            "here",
            "body",
            "msg",
        );
        let rendered = render(&error, source);
        assert!(rendered.contains("3 | }\n  | ^ body\n"));
        assert!(rendered.contains("2 |   1;\n  | ^^^^\n"));
    }
}
