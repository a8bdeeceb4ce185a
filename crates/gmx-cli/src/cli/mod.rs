//! CLI definition: the `gmx` command tree.

pub mod args;

use clap::Command;

pub fn build_cli() -> Command {
    Command::new("gmx")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiler for single-file GMX web applications")
        .arg(args::file_arg())
        .subcommand(
            Command::new("build")
                .about("Compile a .gmx file into a Go program")
                .arg(args::file_arg().required(true))
                .arg(args::output_dir_arg()),
        )
        .subcommand(
            Command::new("run")
                .about("Compile and run through the Go toolchain")
                .arg(args::file_arg().required(true)),
        )
        .subcommand(
            Command::new("check")
                .about("Parse and resolve without generating code")
                .arg(args::file_arg().required(true)),
        )
        .subcommand(
            Command::new("ast")
                .about("Dump the resolved AST as JSON")
                .arg(args::file_arg().required(true))
                .arg(args::compact_arg()),
        )
        .subcommand(
            Command::new("fmt")
                .about("Reorder top-level sections into canonical order")
                .arg(args::file_arg().required(true))
                .arg(args::write_arg()),
        )
}
