//! GMX compiler: lexer, parser, import resolver, and Go emitter.
//!
//! The pipeline is strictly leaves-first and synchronous:
//! - `lexer` - mode-switching scanner over one source string
//! - `token` - the fixed token tag set with source positions
//! - `parser` - recursive descent to the typed AST, errors accumulated
//! - `resolve` - depth-first import loading, merging, cycle detection
//! - `generate` - resolved AST to a standalone Go server program
//! - `diagnostics` - ordered `line:column: message` diagnostics
//!
//! Every stage returns partial results plus diagnostics instead of
//! aborting; [`compile_file`] threads them through and leaves the verdict
//! to the caller.

pub mod ast;
pub mod diagnostics;
pub mod generate;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod token;

#[cfg(test)]
mod resolve_tests;

use std::path::{Path, PathBuf};

use diagnostics::Diagnostic;

/// Errors that abort a compilation before the pipeline can produce
/// diagnostics of its own.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Output of a full pipeline run. `go_source` is always present, possibly
/// generated from a partial tree; the caller inspects the diagnostics to
/// decide whether it is usable.
#[derive(Debug)]
pub struct Compilation {
    pub go_source: String,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Compilation {
    pub fn is_ok(&self) -> bool {
        !diagnostics::has_errors(&self.errors)
    }
}

/// Run the whole pipeline on one file: read, parse, resolve, generate.
pub fn compile_file(path: &Path) -> Result<Compilation> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(compile_source(&text, path))
}

/// Same pipeline over source text already in memory; `path` anchors
/// relative imports.
pub fn compile_source(text: &str, path: &Path) -> Compilation {
    let parse = parser::parse(text);
    let mut errors = parse.errors;

    let resolution = resolve::resolve(&parse.file, path);
    errors.extend(resolution.errors);

    let go_source = generate::generate(&resolution.resolved);
    Compilation {
        go_source,
        errors,
        warnings: resolution.warnings,
    }
}
