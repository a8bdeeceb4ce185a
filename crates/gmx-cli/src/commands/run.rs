use std::fs;
use std::path::PathBuf;
use std::process::Command;

use clap::ArgMatches;
use gmx_compiler::compile_source;

pub struct RunArgs {
    pub file: PathBuf,
}

impl RunArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            file: matches.get_one::<PathBuf>("file").cloned().expect("required"),
        }
    }
}

pub fn run(args: RunArgs) {
    let source = super::read_source(&args.file);
    let compilation = compile_source(&source, &args.file);
    super::report(&source, &args.file, &compilation.errors, &compilation.warnings);
    if !compilation.is_ok() {
        std::process::exit(1);
    }

    let dir = match tempfile::Builder::new().prefix("gmx-run-").tempdir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("error: could not create build directory: {err}");
            std::process::exit(1);
        }
    };
    let main_go = dir.path().join("main.go");
    if let Err(err) = fs::write(&main_go, compilation.go_source) {
        eprintln!("error: could not write {}: {err}", main_go.display());
        std::process::exit(1);
    }

    let status = Command::new("go").arg("run").arg(&main_go).status();
    let code = match status {
        Ok(status) => status.code().unwrap_or(1),
        Err(err) => {
            eprintln!("error: could not invoke the go toolchain: {err}");
            1
        }
    };
    // process::exit skips Drop; remove the scratch directory explicitly
    if let Err(err) = dir.close() {
        eprintln!("warning: could not remove build directory: {err}");
    }
    std::process::exit(code);
}
