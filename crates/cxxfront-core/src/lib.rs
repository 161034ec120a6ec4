//! Shared foundation types for the cxxfront C/C++ front-end.
//!
//! This crate provides:
//! - [`Span`] and [`Offsets`] for source positions
//! - [`UnitId`], [`NodeId`] and [`NodeRef`] handles
//! - The error hierarchy used by every phase
//! - [`Diagnostic`]s for problems that do not abort an operation

mod diagnostics;
mod error;
mod ids;
mod offsets;
mod span;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{
    AstError, FrontendError, LexError, ParseError, ParseErrorKind, ParseErrors, SymbolError,
};
pub use ids::{NodeId, NodeRef, UnitId};
pub use offsets::Offsets;
pub use span::Span;
