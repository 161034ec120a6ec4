//! Unified error types for the front-end.
//!
//! ## Error Hierarchy
//!
//! ```text
//! FrontendError (top-level wrapper)
//! ├── LexError     - tokenization errors
//! ├── ParseError   - syntax errors (with ParseErrorKind)
//! ├── SymbolError  - declaration, lookup and template factory errors
//! └── AstError     - queries and transitions an AST node does not support
//! ```
//!
//! Lookup failures ([`SymbolError::NotFound`]) and missing owned declarations
//! are ordinary outcomes during partial parses. They are values that callers
//! branch on, not faults to propagate.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur during tokenization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// An unexpected character was encountered.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    /// A string literal was not properly terminated.
    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    /// A character literal was not properly terminated.
    #[error("unterminated character literal at {span}")]
    UnterminatedChar { span: Span },

    /// A block comment was not properly terminated.
    #[error("unterminated comment at {span}")]
    UnterminatedComment { span: Span },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedChar { span } => *span,
            LexError::UnterminatedComment { span } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of file.
    UnexpectedEof,
    /// A type was expected.
    ExpectedType,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// A declaration was expected.
    ExpectedDeclaration,
    /// A template parameter was expected.
    ExpectedTemplateParameter,
    /// A declaration conflicts with an earlier one in the same scope.
    DuplicateDeclaration,
    /// A template prefix was not followed by a declaration.
    IncompleteTemplate,
    /// A qualified name did not resolve to a declared scope.
    UnresolvedName,
    /// Mismatched delimiter (parentheses, brackets, braces).
    MismatchedDelimiter,
    /// Scopes nested deeper than the configured limit.
    NestingTooDeep,
    /// Tokenization failed.
    InvalidToken,
    /// Internal parser error.
    InternalError,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::ExpectedDeclaration => "expected declaration",
            ParseErrorKind::ExpectedTemplateParameter => "expected template parameter",
            ParseErrorKind::DuplicateDeclaration => "duplicate declaration",
            ParseErrorKind::IncompleteTemplate => "incomplete template declaration",
            ParseErrorKind::UnresolvedName => "unresolved name",
            ParseErrorKind::MismatchedDelimiter => "mismatched delimiter",
            ParseErrorKind::NestingTooDeep => "nesting too deep",
            ParseErrorKind::InvalidToken => "invalid token",
            ParseErrorKind::InternalError => "internal error",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "unexpected EOF" error.
    pub fn unexpected_eof(span: Span) -> Self {
        Self::new(ParseErrorKind::UnexpectedEof, span, "unexpected end of file")
    }

    /// Create an "expected identifier" error.
    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found {found}"),
        )
    }

    /// Create a parse error from a symbol table failure at `span`.
    pub fn from_symbol_error(span: Span, error: &SymbolError) -> Self {
        let kind = match error {
            SymbolError::DuplicateDeclaration { .. } => ParseErrorKind::DuplicateDeclaration,
            SymbolError::UnbalancedFactory { .. } => ParseErrorKind::IncompleteTemplate,
            SymbolError::NotFound(_)
            | SymbolError::Ambiguous { .. }
            | SymbolError::NotAContainer(_) => ParseErrorKind::UnresolvedName,
            _ => ParseErrorKind::InternalError,
        };
        Self::new(kind, span, error.to_string())
    }

    /// Format the error with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = String::new();

        let line = self.span.line;
        let column = self.span.col;

        output.push_str(&format!("Error at {}:{}: {}\n", line, column, self.kind));

        if !self.message.is_empty() {
            output.push_str(&format!("  {}\n", self.message));
        }

        if let Some(line_text) = source.lines().nth(line.saturating_sub(1) as usize) {
            output.push_str("  |\n");
            output.push_str(&format!("{:>3} | {}\n", line, line_text));

            let indent = " ".repeat(column.saturating_sub(1) as usize);
            let pointer = if self.span.len <= 1 {
                "^".to_string()
            } else {
                "^".to_string() + &"~".repeat((self.span.len - 1) as usize)
            };
            output.push_str(&format!("  | {}{}\n", indent, pointer));
        }

        output
    }
}

/// A collection of parse errors.
///
/// Lenient parsing continues after an error, so several errors can be
/// reported for one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// Whether any error has the given kind.
    pub fn contains_kind(&self, kind: ParseErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    pub fn extend(&mut self, other: ParseErrors) {
        self.errors.extend(other.errors);
    }

    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Symbol Errors
// ============================================================================

/// Errors raised by the symbol table and template factories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    /// Two incompatible symbols share a name in one scope.
    #[error("duplicate declaration: '{name}' already declared in '{scope}'")]
    DuplicateDeclaration {
        /// The duplicated name.
        name: String,
        /// Qualified name of the scope (empty for the global scope).
        scope: String,
    },

    /// A lookup found nothing.
    #[error("'{0}' not found")]
    NotFound(String),

    /// `using` directives brought several distinct symbols into view.
    #[error("'{name}' is ambiguous ({candidates} candidates)")]
    Ambiguous { name: String, candidates: usize },

    /// A pop was issued with no pushed template frame.
    #[error("template factory stack is empty")]
    EmptyFactoryStack,

    /// A factory was released while frames were still pushed.
    #[error("template factory released with {pending} unclosed template frame(s)")]
    UnbalancedFactory { pending: usize },

    /// The symbol cannot hold members.
    #[error("'{0}' is not a scope")]
    NotAContainer(String),

    /// Reparenting would make a scope its own ancestor.
    #[error("'{0}' cannot be nested inside itself")]
    CyclicScope(String),
}

// ============================================================================
// AST Errors
// ============================================================================

/// Errors raised when querying or mutating AST nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstError {
    /// The node kind does not support the requested operation.
    #[error("{operation} is not supported by {node_kind} nodes")]
    UnsupportedOperation {
        operation: &'static str,
        node_kind: &'static str,
    },

    /// A lifecycle transition that the node's state machine forbids.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// A handle did not resolve to a node.
    #[error("node not found")]
    NotFound,
}

// ============================================================================
// Top-level wrapper
// ============================================================================

/// Any error produced by the front-end.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseErrors),

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error(transparent)]
    Ast(#[from] AstError),
}

impl From<ParseError> for FrontendError {
    fn from(error: ParseError) -> Self {
        FrontendError::Parse(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_span() {
        let span = Span::new(3, 1, 4, 1);
        let error = LexError::UnexpectedChar { ch: '$', span };
        assert_eq!(error.span(), span);
        assert_eq!(error.to_string(), "unexpected character '$' at 1:4");
    }

    #[test]
    fn parse_error_display() {
        let error = ParseError::expected_token(Span::new(0, 2, 5, 1), "';'", "'}'");
        assert_eq!(
            error.to_string(),
            "expected token at 2:5: expected ';', found '}'"
        );
    }

    #[test]
    fn parse_error_with_source() {
        let source = "int x\nint y;";
        let error = ParseError::expected_token(Span::new(6, 2, 1, 3), "';'", "'int'");
        let rendered = error.display_with_source(source);
        assert!(rendered.contains("  2 | int y;"));
        assert!(rendered.contains("^~~"));
    }

    #[test]
    fn symbol_error_maps_to_parse_kind() {
        let error = SymbolError::DuplicateDeclaration {
            name: "x".into(),
            scope: String::new(),
        };
        let parse = ParseError::from_symbol_error(Span::default(), &error);
        assert_eq!(parse.kind, ParseErrorKind::DuplicateDeclaration);
        assert!(parse.message.contains("'x'"));
    }

    #[test]
    fn parse_errors_collection() {
        let mut errors = ParseErrors::new();
        assert!(errors.is_empty());
        errors.push(ParseError::unexpected_eof(Span::default()));
        errors.push(ParseError::expected_identifier(Span::default(), "'('"));

        assert_eq!(errors.len(), 2);
        assert!(errors.contains_kind(ParseErrorKind::UnexpectedEof));
        assert!(!errors.contains_kind(ParseErrorKind::DuplicateDeclaration));
        assert_eq!(errors.to_string().lines().count(), 2);
    }

    #[test]
    fn frontend_error_wraps_phases() {
        let error: FrontendError = SymbolError::EmptyFactoryStack.into();
        assert_eq!(error.to_string(), "template factory stack is empty");

        let error: FrontendError = AstError::UnsupportedOperation {
            operation: "declarations",
            node_kind: "template declaration",
        }
        .into();
        assert!(matches!(error, FrontendError::Ast(_)));
    }
}
