//! Token types for the C/C++ lexer.

use std::fmt;

use cxxfront_core::Span;

use crate::Dialect;

/// A token from the source code.
///
/// The lexeme is copied into the parse arena, so tokens outlive the source
/// string they were scanned from.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    pub kind: TokenKind,
    pub lexeme: &'ast str,
    pub span: Span,
}

impl<'ast> Token<'ast> {
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

/// All token types of C and C++.
///
/// Keywords that only exist in C++ are lexed as identifiers in the C dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// `42`, `0x2A`, `42ul`
    IntLiteral,
    /// `3.14`, `1e10f`
    FloatLiteral,
    /// `'a'`, `L'a'`
    CharLiteral,
    /// `"text"`, `u8"text"`, `R"(raw)"`
    StringLiteral,

    Identifier,

    // =========================================
    // Keywords - Types
    // =========================================
    Auto,
    Bool,
    Char,
    Char8,
    Char16,
    Char32,
    Double,
    Float,
    Int,
    Long,
    Short,
    Signed,
    Unsigned,
    Void,
    WChar,

    // =========================================
    // Keywords - Qualifiers and specifiers
    // =========================================
    Const,
    Constexpr,
    Consteval,
    Constinit,
    Explicit,
    Extern,
    Friend,
    Inline,
    Mutable,
    Register,
    Restrict,
    Static,
    ThreadLocal,
    Virtual,
    Volatile,
    Alignas,

    // =========================================
    // Keywords - Declarations
    // =========================================
    Class,
    Decltype,
    Enum,
    Export,
    Namespace,
    Operator,
    Private,
    Protected,
    Public,
    StaticAssert,
    Struct,
    Template,
    Typedef,
    Typename,
    Union,
    Using,

    // =========================================
    // Keywords - Statements and expressions
    // =========================================
    Break,
    Case,
    Catch,
    Continue,
    Default,
    Delete,
    Do,
    Else,
    False,
    For,
    Goto,
    If,
    New,
    Noexcept,
    Nullptr,
    Return,
    Sizeof,
    Switch,
    This,
    Throw,
    True,
    Try,
    While,

    // =========================================
    // Punctuators
    // =========================================
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Semicolon,
    Comma,
    Colon,
    ColonColon,
    Dot,
    DotStar,
    Ellipsis,
    Arrow,
    ArrowStar,
    Question,
    Tilde,
    Bang,
    Plus,
    PlusPlus,
    PlusEqual,
    Minus,
    MinusMinus,
    MinusEqual,
    Star,
    StarEqual,
    Slash,
    SlashEqual,
    Percent,
    PercentEqual,
    Caret,
    CaretEqual,
    Amp,
    AmpAmp,
    AmpEqual,
    Pipe,
    PipePipe,
    PipeEqual,
    Equal,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    LessLess,
    LessLessEqual,
    Spaceship,
    Greater,
    GreaterEqual,
    GreaterGreater,
    GreaterGreaterEqual,
    Hash,
    HashHash,

    // =========================================
    // Special
    // =========================================
    Eof,
    /// A lexical error; the message is recorded by the lexer.
    Error,
}

impl TokenKind {
    /// Fundamental type keywords (`int`, `unsigned`, `wchar_t`, ...).
    pub fn is_builtin_type(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Auto | Bool
                | Char
                | Char8
                | Char16
                | Char32
                | Double
                | Float
                | Int
                | Long
                | Short
                | Signed
                | Unsigned
                | Void
                | WChar
        )
    }

    /// `const`, `volatile` and `restrict`.
    pub fn is_cv_qualifier(self) -> bool {
        matches!(self, TokenKind::Const | TokenKind::Volatile | TokenKind::Restrict)
    }

    pub fn is_literal(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            IntLiteral | FloatLiteral | CharLiteral | StringLiteral | True | False | Nullptr
        )
    }

    /// Fixed spelling of keywords and punctuators; a description otherwise.
    pub fn as_str(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            FloatLiteral => "floating literal",
            CharLiteral => "character literal",
            StringLiteral => "string literal",
            Identifier => "identifier",
            Auto => "auto",
            Bool => "bool",
            Char => "char",
            Char8 => "char8_t",
            Char16 => "char16_t",
            Char32 => "char32_t",
            Double => "double",
            Float => "float",
            Int => "int",
            Long => "long",
            Short => "short",
            Signed => "signed",
            Unsigned => "unsigned",
            Void => "void",
            WChar => "wchar_t",
            Const => "const",
            Constexpr => "constexpr",
            Consteval => "consteval",
            Constinit => "constinit",
            Explicit => "explicit",
            Extern => "extern",
            Friend => "friend",
            Inline => "inline",
            Mutable => "mutable",
            Register => "register",
            Restrict => "restrict",
            Static => "static",
            ThreadLocal => "thread_local",
            Virtual => "virtual",
            Volatile => "volatile",
            Alignas => "alignas",
            Class => "class",
            Decltype => "decltype",
            Enum => "enum",
            Export => "export",
            Namespace => "namespace",
            Operator => "operator",
            Private => "private",
            Protected => "protected",
            Public => "public",
            StaticAssert => "static_assert",
            Struct => "struct",
            Template => "template",
            Typedef => "typedef",
            Typename => "typename",
            Union => "union",
            Using => "using",
            Break => "break",
            Case => "case",
            Catch => "catch",
            Continue => "continue",
            Default => "default",
            Delete => "delete",
            Do => "do",
            Else => "else",
            False => "false",
            For => "for",
            Goto => "goto",
            If => "if",
            New => "new",
            Noexcept => "noexcept",
            Nullptr => "nullptr",
            Return => "return",
            Sizeof => "sizeof",
            Switch => "switch",
            This => "this",
            Throw => "throw",
            True => "true",
            Try => "try",
            While => "while",
            LeftParen => "(",
            RightParen => ")",
            LeftBracket => "[",
            RightBracket => "]",
            LeftBrace => "{",
            RightBrace => "}",
            Semicolon => ";",
            Comma => ",",
            Colon => ":",
            ColonColon => "::",
            Dot => ".",
            DotStar => ".*",
            Ellipsis => "...",
            Arrow => "->",
            ArrowStar => "->*",
            Question => "?",
            Tilde => "~",
            Bang => "!",
            Plus => "+",
            PlusPlus => "++",
            PlusEqual => "+=",
            Minus => "-",
            MinusMinus => "--",
            MinusEqual => "-=",
            Star => "*",
            StarEqual => "*=",
            Slash => "/",
            SlashEqual => "/=",
            Percent => "%",
            PercentEqual => "%=",
            Caret => "^",
            CaretEqual => "^=",
            Amp => "&",
            AmpAmp => "&&",
            AmpEqual => "&=",
            Pipe => "|",
            PipePipe => "||",
            PipeEqual => "|=",
            Equal => "=",
            EqualEqual => "==",
            BangEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            LessLess => "<<",
            LessLessEqual => "<<=",
            Spaceship => "<=>",
            Greater => ">",
            GreaterEqual => ">=",
            GreaterGreater => ">>",
            GreaterGreaterEqual => ">>=",
            Hash => "#",
            HashHash => "##",
            Eof => "end of file",
            Error => "invalid token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::CharLiteral
            | TokenKind::StringLiteral
            | TokenKind::Identifier
            | TokenKind::Eof
            | TokenKind::Error => f.write_str(self.as_str()),
            _ => write!(f, "'{}'", self.as_str()),
        }
    }
}

/// Keywords shared by C and C++, including the C spellings of `bool`,
/// `static_assert`, `thread_local` and `alignas`.
fn common_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "auto" => Auto,
        "break" => Break,
        "case" => Case,
        "char" => Char,
        "const" => Const,
        "continue" => Continue,
        "default" => Default,
        "do" => Do,
        "double" => Double,
        "else" => Else,
        "enum" => Enum,
        "extern" => Extern,
        "float" => Float,
        "for" => For,
        "goto" => Goto,
        "if" => If,
        "inline" => Inline,
        "int" => Int,
        "long" => Long,
        "register" => Register,
        "return" => Return,
        "short" => Short,
        "signed" => Signed,
        "sizeof" => Sizeof,
        "static" => Static,
        "struct" => Struct,
        "switch" => Switch,
        "typedef" => Typedef,
        "union" => Union,
        "unsigned" => Unsigned,
        "void" => Void,
        "volatile" => Volatile,
        "while" => While,
        "_Bool" => Bool,
        "_Static_assert" => StaticAssert,
        "_Thread_local" => ThreadLocal,
        "_Alignas" => Alignas,
        _ => return None,
    })
}

fn cpp_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "alignas" => Alignas,
        "bool" => Bool,
        "catch" => Catch,
        "char8_t" => Char8,
        "char16_t" => Char16,
        "char32_t" => Char32,
        "class" => Class,
        "consteval" => Consteval,
        "constexpr" => Constexpr,
        "constinit" => Constinit,
        "decltype" => Decltype,
        "delete" => Delete,
        "explicit" => Explicit,
        "export" => Export,
        "false" => False,
        "friend" => Friend,
        "mutable" => Mutable,
        "namespace" => Namespace,
        "new" => New,
        "noexcept" => Noexcept,
        "nullptr" => Nullptr,
        "operator" => Operator,
        "private" => Private,
        "protected" => Protected,
        "public" => Public,
        "static_assert" => StaticAssert,
        "template" => Template,
        "this" => This,
        "thread_local" => ThreadLocal,
        "throw" => Throw,
        "true" => True,
        "try" => Try,
        "typename" => Typename,
        "using" => Using,
        "virtual" => Virtual,
        "wchar_t" => WChar,
        _ => return None,
    })
}

/// Resolve an identifier to a keyword of `dialect`.
pub fn lookup_keyword(ident: &str, dialect: Dialect) -> Option<TokenKind> {
    match dialect {
        Dialect::C => match ident {
            "restrict" => Some(TokenKind::Restrict),
            _ => common_keyword(ident),
        },
        Dialect::Cpp => common_keyword(ident).or_else(|| cpp_keyword(ident)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpp_only_keywords_are_identifiers_in_c() {
        assert_eq!(lookup_keyword("class", Dialect::Cpp), Some(TokenKind::Class));
        assert_eq!(lookup_keyword("class", Dialect::C), None);
        assert_eq!(lookup_keyword("template", Dialect::C), None);
        assert_eq!(lookup_keyword("restrict", Dialect::C), Some(TokenKind::Restrict));
        assert_eq!(lookup_keyword("restrict", Dialect::Cpp), None);
    }

    #[test]
    fn shared_keywords() {
        for dialect in [Dialect::C, Dialect::Cpp] {
            assert_eq!(lookup_keyword("struct", dialect), Some(TokenKind::Struct));
            assert_eq!(lookup_keyword("_Bool", dialect), Some(TokenKind::Bool));
            assert_eq!(lookup_keyword("structure", dialect), None);
        }
    }

    #[test]
    fn display_quotes_punctuators() {
        assert_eq!(TokenKind::ColonColon.to_string(), "'::'");
        assert_eq!(TokenKind::Template.to_string(), "'template'");
        assert_eq!(TokenKind::Identifier.to_string(), "identifier");
    }

    #[test]
    fn classification() {
        assert!(TokenKind::Unsigned.is_builtin_type());
        assert!(!TokenKind::Const.is_builtin_type());
        assert!(TokenKind::Volatile.is_cv_qualifier());
        assert!(TokenKind::Nullptr.is_literal());
    }
}
