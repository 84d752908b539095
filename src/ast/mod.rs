//! AWK Syntax Tree
//!
//! Node types, traversal, and source reconstruction for parsed programs.

pub mod types;
pub mod tree;
pub mod printer;
