use std::fs;
use std::path::PathBuf;

use clap::ArgMatches;
use gmx_compiler::ast::SourceFile;
use gmx_compiler::{diagnostics, parser};

pub struct FmtArgs {
    pub file: PathBuf,
    pub write: bool,
}

impl FmtArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            file: matches.get_one::<PathBuf>("file").cloned().expect("required"),
            write: matches.get_flag("write"),
        }
    }
}

pub fn run(args: FmtArgs) {
    let source = super::read_source(&args.file);

    let parse = parser::parse(&source);
    if diagnostics::has_errors(&parse.errors) {
        super::report(&source, &args.file, &parse.errors, &[]);
        std::process::exit(1);
    }

    let formatted = canonical(&parse.file);
    if args.write {
        if let Err(err) = fs::write(&args.file, formatted) {
            eprintln!("error: could not write {}: {err}", args.file.display());
            std::process::exit(1);
        }
    } else {
        print!("{formatted}");
    }
}

/// Canonical section order: script, template, style. Payloads are kept
/// verbatim.
fn canonical(file: &SourceFile) -> String {
    let mut sections = Vec::new();
    if let Some(script) = &file.script {
        sections.push(format!("<script>\n{}\n</script>\n", script.source));
    }
    if let Some(template) = &file.template {
        sections.push(format!("<template>\n{}\n</template>\n", template.source));
    }
    if let Some(style) = &file.style {
        let tag = if style.scoped { "<style scoped>" } else { "<style>" };
        sections.push(format!("{tag}\n{}\n</style>\n", style.source));
    }
    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use gmx_compiler::parser;

    use super::canonical;

    #[test]
    fn sections_are_reordered_canonically() {
        let source = "<style scoped>\n.x{}\n</style>\n<template>\n<p>hi</p>\n</template>\n<script>\nlet a = 1\n</script>";
        let parse = parser::parse(source);
        assert!(parse.errors.is_empty());
        let formatted = canonical(&parse.file);
        assert_eq!(
            formatted,
            "<script>\nlet a = 1\n</script>\n\n<template>\n<p>hi</p>\n</template>\n\n<style scoped>\n.x{}\n</style>\n"
        );
    }

    #[test]
    fn formatting_is_idempotent() {
        let source = "<template>\n<p>hi</p>\n</template>\n<script>\nlet a = 1\n</script>";
        let once = canonical(&parser::parse(source).file);
        let twice = canonical(&parser::parse(&once).file);
        assert_eq!(once, twice);
    }
}
