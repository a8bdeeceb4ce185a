use std::path::PathBuf;

use clap::ArgMatches;
use gmx_compiler::{diagnostics, parser, resolve};

pub struct CheckArgs {
    pub file: PathBuf,
}

impl CheckArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            file: matches.get_one::<PathBuf>("file").cloned().expect("required"),
        }
    }
}

pub fn run(args: CheckArgs) {
    let source = super::read_source(&args.file);

    let parse = parser::parse(&source);
    let mut errors = parse.errors;
    let resolution = resolve::resolve(&parse.file, &args.file);
    errors.extend(resolution.errors);

    super::report(&source, &args.file, &errors, &resolution.warnings);
    if diagnostics::has_errors(&errors) {
        std::process::exit(1);
    }
    // silent on success
}
