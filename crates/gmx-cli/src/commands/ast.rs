use std::path::PathBuf;

use clap::ArgMatches;
use gmx_compiler::{diagnostics, parser, resolve};

pub struct AstArgs {
    pub file: PathBuf,
    pub compact: bool,
}

impl AstArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            file: matches.get_one::<PathBuf>("file").cloned().expect("required"),
            compact: matches.get_flag("compact"),
        }
    }
}

pub fn run(args: AstArgs) {
    let source = super::read_source(&args.file);

    let parse = parser::parse(&source);
    let mut errors = parse.errors;
    let resolution = resolve::resolve(&parse.file, &args.file);
    errors.extend(resolution.errors);

    super::report(&source, &args.file, &errors, &resolution.warnings);

    let json = if args.compact {
        serde_json::to_string(&resolution.resolved)
    } else {
        serde_json::to_string_pretty(&resolution.resolved)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("error: could not serialize AST: {err}");
            std::process::exit(1);
        }
    }

    if diagnostics::has_errors(&errors) {
        std::process::exit(1);
    }
}
