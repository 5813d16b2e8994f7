//! Literal decoding shared by every front end.

use std::borrow::Cow;

use crate::ast::{Expr, Literal, LiteralExpr};
use crate::lexer::{Token, TokenKind};

use super::{ParseResult, Parser};

impl<'ast> Parser<'ast> {
    /// Turn a literal token into a literal node.
    pub(crate) fn literal(&mut self, token: Token<'ast>) -> ParseResult<&'ast Expr<'ast>> {
        let value = match token.kind {
            TokenKind::True => Literal::Bool(true),
            TokenKind::False => Literal::Bool(false),
            TokenKind::Number => match token.lexeme.parse::<f64>() {
                Ok(n) => Literal::Number(n),
                Err(_) => return Err(self.error_at(token, "Invalid number literal.")),
            },
            TokenKind::String => {
                let decoded = unescape(string_body(token.lexeme));
                Literal::Str(self.arena.alloc_str(&decoded))
            }
            TokenKind::Char => {
                let body = strip_delimiters(token.lexeme, 1);
                let decoded = unescape(body);
                let mut chars = decoded.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Literal::Char(c),
                    (None, _) => {
                        return Err(
                            self.error_at(token, "Cannot have an empty character literal.")
                        );
                    }
                    (Some(_), Some(_)) => {
                        return Err(self.error_at(
                            token,
                            format!("Too many characters in a character literal '{body}'."),
                        ));
                    }
                }
            }
            _ => return Err(self.error_at(token, super::EXPECTED_EXPRESSION)),
        };

        Ok(self.alloc(Expr::Literal(LiteralExpr {
            value,
            span: token.span,
        })))
    }
}

/// The text between the quotes of a `"..."` or `"""..."""` lexeme.
fn string_body(lexeme: &str) -> &str {
    if lexeme.len() >= 6 && lexeme.starts_with("\"\"\"") && lexeme.ends_with("\"\"\"") {
        strip_delimiters(lexeme, 3)
    } else {
        strip_delimiters(lexeme, 1)
    }
}

fn strip_delimiters(lexeme: &str, width: usize) -> &str {
    lexeme
        .get(width..lexeme.len().saturating_sub(width))
        .unwrap_or("")
}

/// Decode backslash escapes. Unknown escapes are kept verbatim.
fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_bodies() {
        assert_eq!(string_body("\"abc\""), "abc");
        assert_eq!(string_body("\"\""), "");
        assert_eq!(string_body("\"\"\"a\nb\"\"\""), "a\nb");
    }

    #[test]
    fn escapes_decode() {
        assert_eq!(unescape(r"a\nb"), "a\nb");
        assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape(r"\q"), r"\q");
        assert!(matches!(unescape("plain"), Cow::Borrowed("plain")));
    }
}
