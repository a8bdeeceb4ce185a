mod cli;
mod commands;

use std::path::PathBuf;

use cli::build_cli;
use commands::build::BuildArgs;

fn main() {
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("build", m)) => commands::build::run(BuildArgs::from_matches(m)),
        Some(("run", m)) => commands::run::run(commands::run::RunArgs::from_matches(m)),
        Some(("check", m)) => commands::check::run(commands::check::CheckArgs::from_matches(m)),
        Some(("ast", m)) => commands::ast::run(commands::ast::AstArgs::from_matches(m)),
        Some(("fmt", m)) => commands::fmt::run(commands::fmt::FmtArgs::from_matches(m)),
        Some(_) => unreachable!("clap should have caught this"),
        None => {
            // a bare file argument is shorthand for `build`
            match matches.get_one::<PathBuf>("file") {
                Some(file) => commands::build::run(BuildArgs {
                    file: file.clone(),
                    output: None,
                }),
                None => {
                    let _ = build_cli().print_help();
                    std::process::exit(1);
                }
            }
        }
    }
}
