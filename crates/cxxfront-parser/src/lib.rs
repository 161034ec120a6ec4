//! cxxfront parser crate.
//!
//! This crate turns C and C++ source into a declaration AST bound to a
//! shared [`SymbolTable`](cxxfront_symbols::SymbolTable). It includes:
//! - Lexical analysis (tokenization)
//! - The per-unit AST, including template declaration nodes
//! - A recursive-descent declaration parser that binds symbols as it goes
//! - The source element visitor protocol
//! - [`ParseSession`] for several units sharing one symbol table
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use cxxfront_parser::ParseSession;
//!
//! let arena = Bump::new();
//! let mut session = ParseSession::new(&arena);
//! let source = r#"
//!     namespace shapes {
//!         template<typename T>
//!         struct Circle {
//!             T radius;
//!             T area() const;
//!         };
//!     }
//! "#;
//!
//! match session.parse_unit(source) {
//!     Ok(unit) => println!("parsed {} nodes", session.unit(unit).unwrap().len()),
//!     Err(errors) => eprintln!("parse errors: {}", errors),
//! }
//! let diagnostics = session.finish();
//! assert!(diagnostics.is_empty());
//! ```

pub mod lexer;

mod ast;
mod options;
mod parser;
mod session;

pub use ast::visitor;
pub use ast::*;
pub use lexer::{Lexer, Token, TokenKind};
pub use options::{Dialect, ParseOptions};
pub use parser::Parser;
pub use session::ParseSession;
