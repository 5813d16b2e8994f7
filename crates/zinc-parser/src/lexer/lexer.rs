//! Main lexer implementation for Zinc.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s.
//! It uses direct dispatch based on the first character.
//!
//! A lexical problem never stops the scan. The offending text becomes a
//! [`TokenKind::Error`] token whose lexeme is the message, the error is
//! recorded, and scanning resumes after it.

use bumpalo::Bump;
use zinc_core::{CompilerError, CompilerErrors, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

pub(crate) const UNEXPECTED_CHARACTER: &str = "Unexpected character.";
pub(crate) const UNTERMINATED_STRING: &str = "Unterminated string.";
pub(crate) const UNTERMINATED_STRING_ON_LINE: &str =
    "Unterminated string on line. For multi-line strings use '\"\"\"'.";
pub(crate) const UNTERMINATED_MULTILINE_STRING: &str = "Unterminated multi-line string.";
pub(crate) const CHAR_ON_SINGLE_LINE: &str = "Character literals may only be on a single line.";
pub(crate) const UNTERMINATED_CHAR: &str = "Unterminated char.";
pub(crate) const UNTERMINATED_BLOCK_COMMENT: &str = "Unterminated block comment.";

/// Lexer for Zinc source code.
///
/// The `'src` lifetime is the source string being lexed (temporary).
/// The `'ast` lifetime is the arena where token lexemes are allocated (persists).
pub struct Lexer<'src, 'ast> {
    /// Low-level character cursor.
    cursor: Cursor<'src>,
    /// Arena for allocating token lexemes.
    arena: &'ast Bump,
    /// Accumulated errors.
    errors: CompilerErrors,
    /// Set once the EOF token has been produced.
    finished: bool,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            errors: CompilerErrors::new(),
            finished: false,
        }
    }

    /// Take accumulated errors, leaving an empty sink.
    pub fn take_errors(&mut self) -> CompilerErrors {
        std::mem::take(&mut self.errors)
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Scan the whole source, returning every token up to and including EOF.
    pub fn tokenize(mut self) -> (Vec<Token<'ast>>, CompilerErrors) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            tokens.push(token);
            if token.kind == TokenKind::Eof {
                break;
            }
        }
        (tokens, self.errors)
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'ast> {
        self.scan_token()
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    fn scan_token(&mut self) -> Token<'ast> {
        loop {
            self.skip_whitespace();

            if self.cursor.is_eof() {
                return self.make_eof();
            }

            let start = self.cursor.offset();
            let line = self.cursor.line();

            let Some(c) = self.cursor.peek() else {
                return self.make_eof();
            };

            return match c {
                '/' if self.cursor.check_str("//") => {
                    self.cursor.eat_while(|c| c != '\n');
                    continue;
                }
                '/' if self.cursor.check_str("/*") => match self.skip_block_comment(start, line) {
                    Some(error) => error,
                    None => continue,
                },

                '"' => self.scan_string(start, line),
                '\'' => self.scan_char(start, line),

                c if c.is_ascii_digit() => self.scan_number(start, line),
                c if is_ident_start(c) => self.scan_identifier(start, line),

                _ => self.scan_operator(start, line),
            };
        }
    }

    fn skip_whitespace(&mut self) {
        // UTF-8 BOM
        self.cursor.eat('\u{FEFF}');
        self.cursor.eat_while(|c| c.is_whitespace());
    }

    fn make_eof(&mut self) -> Token<'ast> {
        self.finished = true;
        let offset = self.cursor.offset();
        Token::new(TokenKind::Eof, "", Span::point(offset, self.cursor.line()))
    }

    /// Create a token from `start` to the current position.
    /// Copies the lexeme into the arena.
    fn make_token(&self, kind: TokenKind, start: u32, line: u32) -> Token<'ast> {
        let lexeme = self.arena.alloc_str(self.cursor.slice_from(start));
        Token::new(kind, lexeme, Span::new(start, self.cursor.offset(), line))
    }

    /// Create an error token covering `start` to the current position and record it.
    fn make_error(&mut self, message: &'static str, start: u32, line: u32) -> Token<'ast> {
        let span = Span::new(start, self.cursor.offset(), line);
        self.errors.push(CompilerError::token(
            span,
            self.cursor.slice_from(start),
            message,
        ));
        Token::new(TokenKind::Error, message, span)
    }

    // =========================================
    // Scanning: Comments
    // =========================================

    /// Skip a `/* ... */` comment. Returns an error token if it never closes.
    fn skip_block_comment(&mut self, start: u32, line: u32) -> Option<Token<'ast>> {
        self.cursor.advance_n(2);
        loop {
            if self.cursor.is_eof() {
                return Some(self.make_error(UNTERMINATED_BLOCK_COMMENT, start, line));
            }
            if self.cursor.check_str("*/") {
                self.cursor.advance_n(2);
                return None;
            }
            self.cursor.advance();
        }
    }

    // =========================================
    // Scanning: Strings and chars
    // =========================================

    fn scan_string(&mut self, start: u32, line: u32) -> Token<'ast> {
        if self.cursor.check_str("\"\"\"") {
            self.cursor.advance_n(3);
            return self.scan_multiline_string(start, line);
        }

        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.peek() {
                None => return self.make_error(UNTERMINATED_STRING, start, line),
                Some('\n') => return self.make_error(UNTERMINATED_STRING_ON_LINE, start, line),
                Some('\\') => {
                    self.cursor.advance();
                    if self.cursor.check(|c| c != '\n') {
                        self.cursor.advance();
                    }
                }
                Some('"') => {
                    self.cursor.advance();
                    return self.make_token(TokenKind::String, start, line);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn scan_multiline_string(&mut self, start: u32, line: u32) -> Token<'ast> {
        loop {
            if self.cursor.is_eof() {
                return self.make_error(UNTERMINATED_MULTILINE_STRING, start, line);
            }
            if self.cursor.check_str("\"\"\"") {
                self.cursor.advance_n(3);
                return self.make_token(TokenKind::String, start, line);
            }
            if self.cursor.eat('\\') {
                self.cursor.advance();
                continue;
            }
            self.cursor.advance();
        }
    }

    fn scan_char(&mut self, start: u32, line: u32) -> Token<'ast> {
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.peek() {
                None => return self.make_error(UNTERMINATED_CHAR, start, line),
                Some('\n') => return self.make_error(CHAR_ON_SINGLE_LINE, start, line),
                Some('\\') => {
                    self.cursor.advance();
                    if self.cursor.check(|c| c != '\n') {
                        self.cursor.advance();
                    }
                }
                Some('\'') => {
                    self.cursor.advance();
                    return self.make_token(TokenKind::Char, start, line);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // =========================================
    // Scanning: Numbers and identifiers
    // =========================================

    /// Scan `digits ('.' digits)?`.
    fn scan_number(&mut self, start: u32, line: u32) -> Token<'ast> {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        if self.cursor.peek() == Some('.')
            && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        self.make_token(TokenKind::Number, start, line)
    }

    fn scan_identifier(&mut self, start: u32, line: u32) -> Token<'ast> {
        let text = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start, line)
    }

    // =========================================
    // Scanning: Operators and punctuation
    // =========================================

    fn scan_operator(&mut self, start: u32, line: u32) -> Token<'ast> {
        use TokenKind::*;

        let Some(c) = self.cursor.advance() else {
            return self.make_eof();
        };

        let kind = match c {
            '(' => LeftParen,
            ')' => RightParen,
            '{' => LeftBrace,
            '}' => RightBrace,
            ',' => Comma,
            '.' => Dot,
            ';' => Semicolon,
            ':' => Colon,
            '-' => Minus,
            '+' => Plus,
            '/' => Slash,
            '*' => Star,
            '%' => Percent,
            '^' => Caret,
            '!' if self.cursor.eat('=') => BangEqual,
            '!' => Bang,
            '=' if self.cursor.eat('=') => EqualEqual,
            '=' => Equal,
            '>' if self.cursor.eat('=') => GreaterEqual,
            '>' => Greater,
            '<' if self.cursor.eat('=') => LessEqual,
            '<' => Less,
            '&' if self.cursor.eat('&') => And,
            '|' if self.cursor.eat('|') => Or,
            _ => return self.make_error(UNEXPECTED_CHARACTER, start, line),
        };

        self.make_token(kind, start, line)
    }
}

/// Implement Iterator for convenient token streaming. EOF ends the iteration.
impl<'src, 'ast> Iterator for Lexer<'src, 'ast> {
    type Item = Token<'ast>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
