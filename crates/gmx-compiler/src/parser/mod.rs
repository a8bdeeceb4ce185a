//! Recursive-descent parser for GMX files.
//!
//! The parser accumulates diagnostics instead of failing: [`parse`] always
//! returns a [`SourceFile`], partial when the input was malformed, together
//! with every error recorded along the way.

mod core;
mod grammar;
mod script;

#[cfg(test)]
mod grammar_tests;
#[cfg(test)]
mod script_tests;

pub use self::core::Parser;

use crate::ast::SourceFile;
use crate::diagnostics::Diagnostic;

/// Result of parsing one file: the tree plus the accumulated errors.
#[derive(Debug)]
pub struct Parse {
    pub file: SourceFile,
    pub errors: Vec<Diagnostic>,
}

pub fn parse(source: &str) -> Parse {
    let mut parser = Parser::new(source);
    let file = parser.parse_file();
    Parse {
        file,
        errors: parser.take_errors(),
    }
}
