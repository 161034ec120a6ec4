//! Parser configuration.

/// Source language accepted by the lexer and parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// C: C++-only keywords are ordinary identifiers.
    C,
    #[default]
    Cpp,
}

/// Options controlling a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub dialect: Dialect,
    /// Maximum depth of nested scopes (namespaces, classes, templates)
    /// before the parser gives up with `NestingTooDeep`.
    pub max_nesting_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Cpp,
            max_nesting_depth: 256,
        }
    }
}

impl ParseOptions {
    pub fn c() -> Self {
        Self {
            dialect: Dialect::C,
            ..Self::default()
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}
