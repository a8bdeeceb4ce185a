//! Command implementations. Each command owns its args struct and exits
//! the process with 0 on success, 1 on any error.

pub mod ast;
pub mod build;
pub mod check;
pub mod fmt;
pub mod run;

use std::path::Path;
use std::process;

use gmx_compiler::diagnostics::{self, Diagnostic};

pub(crate) fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: could not read {}: {err}", path.display());
            process::exit(1);
        }
    }
}

/// Render accumulated diagnostics to stderr, warnings included.
pub(crate) fn report(source: &str, path: &Path, errors: &[Diagnostic], warnings: &[Diagnostic]) {
    let path = path.display().to_string();
    if !warnings.is_empty() {
        eprint!("{}", diagnostics::render(source, warnings, Some(&path)));
    }
    if !errors.is_empty() {
        eprint!("{}", diagnostics::render(source, errors, Some(&path)));
    }
}
