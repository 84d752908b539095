//! just-awk - An AWK source parser
//!
//! This library provides a complete parser for AWK programs, producing a
//! spanned, typed syntax tree plus collected diagnostics that can be used
//! for analysis, tooling, or interpretation.

pub mod ast;
pub mod parser;

pub use ast::tree::{NodeKind, NodeRef, Walk};
pub use ast::types::*;
pub use parser::types::{Diagnostic, Span, Token, TokenType};
pub use parser::{parse, reparse, tokenize, Edit, ParseResult};
