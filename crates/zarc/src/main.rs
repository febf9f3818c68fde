//! `zarc`: extract, compress, list, test, and inspect tar/tar.gz archives
//! (spec §6). Thin glue over `zarc-archive`/`zarc-tar`/`zarc-gzip`/
//! `zarc-deflate` in the teacher's `dctl`-style binary shape: a `clap`
//! derive `Cli`, per-subcommand dispatch, `tracing` for diagnostics,
//! `colored` for direct user-facing output.

mod cli;
mod commands;
mod format;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse_from(normalize_level_shortcuts(std::env::args()));

    init_color();
    init_tracing(cli.command.is_verbose(), cli.command.is_quiet());

    let result = match &cli.command {
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Compress(args) => commands::compress::run(args),
        Commands::List(args) => commands::list::run(args),
        Commands::Test(args) => commands::test::run(args),
        Commands::Info(args) => commands::info::run(args),
    };

    if let Err(err) = result {
        eprintln!("{}", err.render().red());
        std::process::exit(err.exit_code());
    }
}

fn init_color() {
    let no_color = std::env::var_os("ZARC_NO_COLOR").is_some() || std::env::var_os("NO_COLOR").is_some();
    if no_color {
        colored::control::set_override(false);
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::TRACE
    } else if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}

/// `clap` has no clean way to accept a bare `-6`-style short flag (it reads
/// as a negative number, not a flag), so the classic gzip/xz `-1`..`-9`
/// compression-level shortcuts are rewritten to `--level=N` before parsing.
fn normalize_level_shortcuts(argv: impl Iterator<Item = String>) -> Vec<String> {
    argv.map(|arg| {
        let bytes = arg.as_bytes();
        if bytes.len() == 2 && bytes[0] == b'-' && bytes[1].is_ascii_digit() && bytes[1] != b'0' {
            format!("--level={}", (bytes[1] - b'0') as char)
        } else {
            arg
        }
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_numeric_level_shortcuts() {
        let argv = ["zarc", "c", "out.tar.gz", "src", "-9"].into_iter().map(String::from);
        let rewritten = normalize_level_shortcuts(argv);
        assert_eq!(rewritten, vec!["zarc", "c", "out.tar.gz", "src", "--level=9"]);
    }

    #[test]
    fn leaves_other_flags_alone() {
        let argv = ["zarc", "x", "out.tar.gz", "-C", "/tmp"].into_iter().map(String::from);
        let rewritten = normalize_level_shortcuts(argv);
        assert_eq!(rewritten, vec!["zarc", "x", "out.tar.gz", "-C", "/tmp"]);
    }
}
