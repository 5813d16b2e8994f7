//! Token types and definitions for the Zinc lexer.

use std::fmt;

use zinc_core::Span;

/// A token from the source code.
///
/// The `'ast` lifetime refers to the arena where the lexeme string is allocated.
/// For [`TokenKind::Error`] tokens the lexeme holds the lexer's message.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    /// The type of token.
    pub kind: TokenKind,
    /// The source text of this token (allocated in arena).
    pub lexeme: &'ast str,
    /// Location in source.
    pub span: Span,
}

impl<'ast> Token<'ast> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All possible token types in Zinc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Delimiters
    // =========================================
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `;`
    Semicolon,
    /// `:`
    Colon,

    // =========================================
    // Operators
    // =========================================
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `/`
    Slash,
    /// `*`
    Star,
    /// `%`
    Percent,
    /// `^`
    Caret,
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `and` or `&&`
    And,
    /// `or` or `||`
    Or,

    // =========================================
    // Literals
    // =========================================
    /// User-defined identifier
    Identifier,
    /// `"text"` or `"""multi\nline"""`, quotes included in the lexeme
    String,
    /// `'c'`, quotes included in the lexeme
    Char,
    /// `42`, `3.5`
    Number,

    // =========================================
    // Keywords
    // =========================================
    /// `struct`
    Struct,
    /// `func`
    Func,
    /// `var`
    Var,
    /// `val`
    Val,
    /// `return`
    Return,
    /// `true`
    True,
    /// `false`
    False,

    // =========================================
    // Special
    // =========================================
    /// A lexical error; the lexeme is the message.
    Error,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Whether this kind starts a top-level declaration.
    pub fn starts_declaration(self) -> bool {
        matches!(
            self,
            TokenKind::Struct | TokenKind::Func | TokenKind::Var | TokenKind::Val
        )
    }

    /// Human readable description, used in debug output.
    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            LeftParen => "'('",
            RightParen => "')'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Comma => "','",
            Dot => "'.'",
            Semicolon => "';'",
            Colon => "':'",
            Minus => "'-'",
            Plus => "'+'",
            Slash => "'/'",
            Star => "'*'",
            Percent => "'%'",
            Caret => "'^'",
            Bang => "'!'",
            BangEqual => "'!='",
            Equal => "'='",
            EqualEqual => "'=='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            Less => "'<'",
            LessEqual => "'<='",
            And => "'and'",
            Or => "'or'",
            Identifier => "identifier",
            String => "string literal",
            Char => "char literal",
            Number => "number literal",
            Struct => "'struct'",
            Func => "'func'",
            Var => "'var'",
            Val => "'val'",
            Return => "'return'",
            True => "'true'",
            False => "'false'",
            Error => "error",
            Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Map a keyword string to its [`TokenKind`], or `None` if not a keyword.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "struct" => Struct,
        "func" => Func,
        "var" => Var,
        "val" => Val,
        "return" => Return,
        "and" => And,
        "or" => Or,
        "true" => True,
        "false" => False,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_resolve() {
        assert_eq!(lookup_keyword("func"), Some(TokenKind::Func));
        assert_eq!(lookup_keyword("and"), Some(TokenKind::And));
        assert_eq!(lookup_keyword("val"), Some(TokenKind::Val));
    }

    #[test]
    fn control_words_are_identifiers() {
        // The language has no statement keywords beyond declarations
        assert_eq!(lookup_keyword("loop"), None);
        assert_eq!(lookup_keyword("if"), None);
        assert_eq!(lookup_keyword("num"), None);
    }

    #[test]
    fn declaration_starters() {
        assert!(TokenKind::Struct.starts_declaration());
        assert!(TokenKind::Val.starts_declaration());
        assert!(!TokenKind::Return.starts_declaration());
    }

    #[test]
    fn display_uses_description() {
        assert_eq!(TokenKind::BangEqual.to_string(), "'!='");
        assert_eq!(TokenKind::Eof.to_string(), "end of file");
    }
}
