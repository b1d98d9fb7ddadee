//! A minimal lexer/parser producing the [`ast`] this crate's tree-walking
//! evaluator consumes.
//!
//! Per §1's scoping note, a from-scratch full-conformance ECMAScript grammar
//! is not the deliverable here — the object/function/environment/context/GC
//! core is. This module is intentionally thin: enough expression and
//! statement grammar to drive the core's operations end-to-end through the
//! CLI and the tests in §8, not a conformant parser.

pub mod ast;
pub mod lexer;
pub mod parser;

use ast::Program;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SyntaxError {
    #[error("{0}")]
    Lex(String),
    #[error("{0}")]
    Parse(String),
}

/// Lexes then parses `src` into a [`Program`].
pub fn parse(src: &str) -> Result<Program, SyntaxError> {
    let tokens = lexer::lex(src).map_err(SyntaxError::Lex)?;
    parser::Parser::new(tokens).parse_program().map_err(SyntaxError::Parse)
}
