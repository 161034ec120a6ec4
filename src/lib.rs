//! cxxfront: a C/C++ declaration front-end.
//!
//! The parser reads translation units, binds every declaration into a shared
//! [`SymbolTable`] while it parses, and tracks `template<...>` declarations
//! through per-container template factories. Consumers observe the result
//! through the push-style [`visitor`] protocol; [`outline`] is one such
//! consumer.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use cxxfront::prelude::*;
//!
//! let arena = Bump::new();
//! let mut session = ParseSession::new(&arena);
//! let unit = session
//!     .parse_unit("template<class T> struct Box { T value; };")
//!     .unwrap();
//! assert!(session.finish().is_empty());
//!
//! let roots = cxxfront::outline::outline(session.unit(unit).unwrap()).unwrap();
//! assert_eq!(roots[0].label, "Box<T>");
//! ```

pub mod outline;

pub use cxxfront_core as core;
pub use cxxfront_parser::visitor;
pub use cxxfront_symbols as symbols;

use bumpalo::Bump;
use cxxfront_core::{ParseErrors, UnitId};
use cxxfront_parser::{Ast, ParseOptions, Parser};
use cxxfront_symbols::SymbolTable;

pub mod prelude {
    pub use crate::outline::{OutlineBuilder, OutlineNode, outline};
    pub use cxxfront_core::{
        AstError, Diagnostic, Diagnostics, FrontendError, NodeId, NodeRef, Offsets, ParseError,
        ParseErrorKind, ParseErrors, Severity, Span, SymbolError, UnitId,
    };
    pub use cxxfront_parser::visitor::{
        FaultPolicy, SourceElementVisitor, TraversalOptions, TraversalReport, walk,
    };
    pub use cxxfront_parser::*;
    pub use cxxfront_symbols::{
        ClassKey, FactoryEvent, FactoryId, Symbol, SymbolId, SymbolKind, SymbolTable,
        TemplateParamKind,
    };
}

/// Parse a single C++ unit into a fresh symbol table, recovering from errors.
///
/// For several units that see each other's declarations use
/// [`ParseSession`](cxxfront_parser::ParseSession).
pub fn parse_lenient<'ast>(source: &str, arena: &'ast Bump) -> (Ast<'ast>, SymbolTable, ParseErrors) {
    let mut symbols = SymbolTable::new();
    let (ast, errors) =
        Parser::parse_lenient(source, arena, &mut symbols, UnitId::new(0), ParseOptions::default());
    (ast, symbols, errors)
}
