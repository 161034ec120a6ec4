//! Symbol table and template factories for the cxxfront front-end.
//!
//! Symbols live in a petgraph-backed [`SymbolTable`]. Container symbols own
//! their children and can be upgraded with a [`TemplateFactory`] that tracks
//! template declarations while they are being parsed.

mod symbol;
mod symbol_table;
mod template_factory;

pub use symbol::{
    AstExtension, ClassKey, Members, NewSymbol, Symbol, SymbolId, SymbolKind, TemplateInfo,
    TemplateParamKind,
};
pub use symbol_table::{ScopeEdge, SymbolTable};
pub use template_factory::{FactoryEvent, FactoryId, TemplateFactory};
