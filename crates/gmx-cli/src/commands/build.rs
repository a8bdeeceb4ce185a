use std::fs;
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use gmx_compiler::compile_source;

pub struct BuildArgs {
    pub file: PathBuf,
    pub output: Option<PathBuf>,
}

impl BuildArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            file: matches.get_one::<PathBuf>("file").cloned().expect("required"),
            output: matches.get_one::<PathBuf>("output").cloned(),
        }
    }
}

pub fn run(args: BuildArgs) {
    let source = super::read_source(&args.file);
    let compilation = compile_source(&source, &args.file);
    super::report(&source, &args.file, &compilation.errors, &compilation.warnings);
    if !compilation.is_ok() {
        std::process::exit(1);
    }

    let out_dir = args
        .output
        .unwrap_or_else(|| default_output_dir(&args.file));
    if let Err(err) = fs::create_dir_all(&out_dir) {
        eprintln!("error: could not create {}: {err}", out_dir.display());
        std::process::exit(1);
    }
    let target = out_dir.join("main.go");
    if let Err(err) = fs::write(&target, compilation.go_source) {
        eprintln!("error: could not write {}: {err}", target.display());
        std::process::exit(1);
    }
    println!("wrote {}", target.display());
}

fn default_output_dir(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("app");
    file.with_file_name(format!("{stem}-build"))
}
