//! Main lexer implementation.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s, dispatching
//! on the first character of each token. Whitespace, comments and
//! preprocessing directives are skipped as trivia.
//!
//! All lexemes are copied into the arena, so the source string can be freed
//! once lexing completes.

use bumpalo::Bump;
use cxxfront_core::{LexError, Span};

use super::cursor::{Cursor, Mark, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};
use crate::Dialect;

/// Encoding prefixes that may precede a string or character literal.
const ENCODING_PREFIXES: [&str; 4] = ["L", "u", "U", "u8"];

/// Prefixes that introduce a raw string literal.
const RAW_PREFIXES: [&str; 5] = ["R", "LR", "uR", "UR", "u8R"];

/// Lexer for C and C++ source code.
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
    dialect: Dialect,
    errors: Vec<LexError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump, dialect: Dialect) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            dialect,
            errors: Vec::new(),
        }
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'ast> {
        if let Some(error) = self.skip_trivia() {
            return self.make_error(error);
        }

        let mark = self.cursor.mark();
        let Some(c) = self.cursor.peek() else {
            return self.make_eof();
        };

        match c {
            '"' => self.scan_quoted('"', mark),
            '\'' => self.scan_quoted('\'', mark),
            c if c.is_ascii_digit() => self.scan_number(mark),
            '.' if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number(mark)
            }
            c if is_ident_start(c) => self.scan_identifier(mark),
            _ => self.scan_punctuator(mark),
        }
    }

    // =========================================
    // Trivia
    // =========================================

    /// Skip whitespace, comments and preprocessing directives.
    ///
    /// Returns an error for an unterminated block comment.
    fn skip_trivia(&mut self) -> Option<LexError> {
        loop {
            if self.cursor.check_str("\u{FEFF}") {
                self.cursor.advance_bytes(3);
            }
            self.cursor.eat_while(|c| c.is_ascii_whitespace());

            if self.cursor.check_str("//") {
                self.skip_line(false);
            } else if self.cursor.check_str("/*") {
                let mark = self.cursor.mark();
                self.cursor.advance_bytes(2);
                match self.cursor.rest().find("*/") {
                    Some(end) => self.cursor.advance_bytes(end + 2),
                    None => {
                        self.cursor.advance_bytes(self.cursor.rest().len());
                        return Some(LexError::UnterminatedComment {
                            span: self.cursor.span_from(mark),
                        });
                    }
                }
            } else if self.cursor.peek() == Some('#') && self.cursor.at_line_start() {
                self.skip_line(true);
            } else {
                return None;
            }
        }
    }

    /// Skip to the end of the line. Directives continue across
    /// backslash-newline pairs.
    fn skip_line(&mut self, directive: bool) {
        while let Some(c) = self.cursor.peek() {
            match c {
                '\n' => break,
                '\\' if directive => {
                    self.cursor.advance();
                    self.cursor.eat('\r');
                    self.cursor.eat('\n');
                }
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }

    // =========================================
    // Token construction
    // =========================================

    fn make_eof(&self) -> Token<'ast> {
        let span = Span::point(self.cursor.offset(), self.cursor.line(), self.cursor.column());
        Token::new(TokenKind::Eof, "", span)
    }

    fn make_token(&self, kind: TokenKind, mark: Mark) -> Token<'ast> {
        let lexeme = self.arena.alloc_str(self.cursor.slice_from(mark));
        Token::new(kind, lexeme, self.cursor.span_from(mark))
    }

    fn make_error(&mut self, error: LexError) -> Token<'ast> {
        let span = error.span();
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }

    // =========================================
    // Literals
    // =========================================

    /// Scan a string or character literal whose opening quote is next.
    fn scan_quoted(&mut self, quote: char, mark: Mark) -> Token<'ast> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    let span = self.cursor.span_from(mark);
                    let error = if quote == '"' {
                        LexError::UnterminatedString { span }
                    } else {
                        LexError::UnterminatedChar { span }
                    };
                    return self.make_error(error);
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    let kind = if quote == '"' {
                        TokenKind::StringLiteral
                    } else {
                        TokenKind::CharLiteral
                    };
                    return self.make_token(kind, mark);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Scan `"delim( ... )delim"` after a raw prefix.
    fn scan_raw_string(&mut self, mark: Mark) -> Token<'ast> {
        self.cursor.advance();
        let delimiter = self
            .cursor
            .eat_while(|c| c != '(' && c != '"' && c != ')' && !c.is_whitespace());
        if !self.cursor.eat('(') {
            let span = self.cursor.span_from(mark);
            return self.make_error(LexError::UnterminatedString { span });
        }

        let closing = format!("){delimiter}\"");
        match self.cursor.rest().find(&closing) {
            Some(end) => {
                self.cursor.advance_bytes(end + closing.len());
                self.make_token(TokenKind::StringLiteral, mark)
            }
            None => {
                self.cursor.advance_bytes(self.cursor.rest().len());
                let span = self.cursor.span_from(mark);
                self.make_error(LexError::UnterminatedString { span })
            }
        }
    }

    /// Scan a preprocessing number: digits, letters, `.`, digit separators
    /// and signed exponents.
    fn scan_number(&mut self, mark: Mark) -> Token<'ast> {
        let hex = self.cursor.check_str("0x") || self.cursor.check_str("0X");
        let mut is_float = false;

        while let Some(c) = self.cursor.peek() {
            match c {
                '.' => {
                    is_float = true;
                    self.cursor.advance();
                }
                'e' | 'E' if !hex => {
                    is_float = true;
                    self.cursor.advance();
                    if matches!(self.cursor.peek(), Some('+' | '-')) {
                        self.cursor.advance();
                    }
                }
                'p' | 'P' if hex => {
                    is_float = true;
                    self.cursor.advance();
                    if matches!(self.cursor.peek(), Some('+' | '-')) {
                        self.cursor.advance();
                    }
                }
                '\'' if self
                    .cursor
                    .peek_nth(1)
                    .is_some_and(|next| next.is_ascii_alphanumeric()) =>
                {
                    self.cursor.advance();
                }
                c if c.is_ascii_alphanumeric() || c == '_' => {
                    self.cursor.advance();
                }
                _ => break,
            }
        }

        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        };
        self.make_token(kind, mark)
    }

    // =========================================
    // Identifiers and keywords
    // =========================================

    fn scan_identifier(&mut self, mark: Mark) -> Token<'ast> {
        let ident = self.cursor.eat_while(is_ident_continue);

        match self.cursor.peek() {
            Some('"') if RAW_PREFIXES.contains(&ident) => return self.scan_raw_string(mark),
            Some(quote @ ('"' | '\'')) if ENCODING_PREFIXES.contains(&ident) => {
                return self.scan_quoted(quote, mark);
            }
            _ => {}
        }

        let kind = lookup_keyword(ident, self.dialect).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, mark)
    }

    // =========================================
    // Punctuators
    // =========================================

    fn scan_punctuator(&mut self, mark: Mark) -> Token<'ast> {
        let Some(c) = self.cursor.advance() else {
            return self.make_eof();
        };
        let next = self.cursor.peek();

        let kind = match (c, next) {
            ('(', _) => TokenKind::LeftParen,
            (')', _) => TokenKind::RightParen,
            ('[', _) => TokenKind::LeftBracket,
            (']', _) => TokenKind::RightBracket,
            ('{', _) => TokenKind::LeftBrace,
            ('}', _) => TokenKind::RightBrace,
            (';', _) => TokenKind::Semicolon,
            (',', _) => TokenKind::Comma,
            ('?', _) => TokenKind::Question,
            ('~', _) => TokenKind::Tilde,

            (':', Some(':')) => self.take(TokenKind::ColonColon),
            (':', _) => TokenKind::Colon,

            ('.', Some('*')) => self.take(TokenKind::DotStar),
            ('.', Some('.')) if self.cursor.peek_nth(1) == Some('.') => {
                self.cursor.advance_bytes(2);
                TokenKind::Ellipsis
            }
            ('.', _) => TokenKind::Dot,

            ('+', Some('+')) => self.take(TokenKind::PlusPlus),
            ('+', Some('=')) => self.take(TokenKind::PlusEqual),
            ('+', _) => TokenKind::Plus,

            ('-', Some('>')) => {
                self.cursor.advance();
                if self.cursor.eat('*') {
                    TokenKind::ArrowStar
                } else {
                    TokenKind::Arrow
                }
            }
            ('-', Some('-')) => self.take(TokenKind::MinusMinus),
            ('-', Some('=')) => self.take(TokenKind::MinusEqual),
            ('-', _) => TokenKind::Minus,

            ('*', Some('=')) => self.take(TokenKind::StarEqual),
            ('*', _) => TokenKind::Star,
            ('/', Some('=')) => self.take(TokenKind::SlashEqual),
            ('/', _) => TokenKind::Slash,
            ('%', Some('=')) => self.take(TokenKind::PercentEqual),
            ('%', _) => TokenKind::Percent,
            ('^', Some('=')) => self.take(TokenKind::CaretEqual),
            ('^', _) => TokenKind::Caret,

            ('&', Some('&')) => self.take(TokenKind::AmpAmp),
            ('&', Some('=')) => self.take(TokenKind::AmpEqual),
            ('&', _) => TokenKind::Amp,
            ('|', Some('|')) => self.take(TokenKind::PipePipe),
            ('|', Some('=')) => self.take(TokenKind::PipeEqual),
            ('|', _) => TokenKind::Pipe,

            ('=', Some('=')) => self.take(TokenKind::EqualEqual),
            ('=', _) => TokenKind::Equal,
            ('!', Some('=')) => self.take(TokenKind::BangEqual),
            ('!', _) => TokenKind::Bang,

            ('<', Some('<')) => {
                self.cursor.advance();
                if self.cursor.eat('=') {
                    TokenKind::LessLessEqual
                } else {
                    TokenKind::LessLess
                }
            }
            ('<', Some('=')) => {
                self.cursor.advance();
                if self.cursor.eat('>') {
                    TokenKind::Spaceship
                } else {
                    TokenKind::LessEqual
                }
            }
            ('<', _) => TokenKind::Less,

            // `>>` is split back into two `>` by the parser where a template
            // argument list closes.
            ('>', Some('>')) => {
                self.cursor.advance();
                if self.cursor.eat('=') {
                    TokenKind::GreaterGreaterEqual
                } else {
                    TokenKind::GreaterGreater
                }
            }
            ('>', Some('=')) => self.take(TokenKind::GreaterEqual),
            ('>', _) => TokenKind::Greater,

            ('#', Some('#')) => self.take(TokenKind::HashHash),
            ('#', _) => TokenKind::Hash,

            _ => {
                let span = self.cursor.span_from(mark);
                return self.make_error(LexError::UnexpectedChar { ch: c, span });
            }
        };

        self.make_token(kind, mark)
    }

    /// Consume the lookahead character as the second half of `kind`.
    #[inline]
    fn take(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.advance();
        kind
    }
}

impl<'ast> Iterator for Lexer<'_, 'ast> {
    type Item = Token<'ast>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}
