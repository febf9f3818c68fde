//! Argument surface (spec §6's subcommand/option table), in the teacher's
//! `clap` derive idiom: a top-level `Cli` wrapping a `Commands` enum, one
//! `Args` struct per subcommand, aliases attached with `#[clap(alias(...))]`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "zarc", version, about = "A cross-platform tar/gzip archive tool", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract an archive into a destination directory
    #[clap(alias = "x")]
    Extract(ExtractArgs),
    /// Compress files and directories into an archive
    #[clap(alias = "c", alias = "create")]
    Compress(CompressArgs),
    /// List an archive's contents without extracting
    #[clap(alias = "l", alias = "ls")]
    List(ListArgs),
    /// Read every entry of an archive, verifying its integrity
    #[clap(alias = "t")]
    Test(TestArgs),
    /// Print metadata about an archive
    #[clap(alias = "i")]
    Info(InfoArgs),
}

impl Commands {
    pub fn is_verbose(&self) -> bool {
        match self {
            Commands::Extract(a) => a.verbose,
            Commands::Compress(a) => a.verbose,
            Commands::List(a) => a.verbose,
            Commands::Test(a) => a.verbose,
            Commands::Info(_) => false,
        }
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self, Commands::Extract(a) if a.quiet)
    }
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// The archive to extract
    pub archive: PathBuf,

    /// Directory to extract into (defaults to the current directory)
    pub destination: Option<PathBuf>,

    /// Same as the positional destination; takes precedence if both are given
    #[arg(short = 'C', long = "output")]
    pub output: Option<PathBuf>,

    /// Overwrite files that already exist at the destination
    #[arg(short = 'f', long = "overwrite")]
    pub overwrite: bool,

    /// Skip entries whose destination path already exists, instead of erroring
    #[arg(short = 'k', long = "keep-existing", conflicts_with = "overwrite")]
    pub keep_existing: bool,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(short, long)]
    pub quiet: bool,

    /// Restore each entry's stored permissions (default: use the umask)
    #[arg(short = 'p', long = "preserve-permissions")]
    pub preserve_permissions: bool,

    #[arg(long = "no-preserve-permissions", conflicts_with = "preserve_permissions")]
    pub no_preserve_permissions: bool,

    /// Only extract entries matching this glob (may be repeated)
    #[arg(long = "include")]
    pub include: Vec<String>,

    /// Skip entries matching this glob (may be repeated)
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Strip this many leading path components from each entry
    #[arg(long = "strip-components", default_value_t = 0)]
    pub strip_components: usize,

    /// Keep extracting after a per-entry failure instead of aborting
    #[arg(long = "continue-on-error")]
    pub continue_on_error: bool,

    /// Allow symlink entries whose target stays inside the destination
    #[arg(long = "allow-symlinks")]
    pub allow_symlinks: bool,
}

#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Archive file to create
    pub archive: PathBuf,

    /// Files and/or directories to add
    #[arg(required = true, num_args = 1..)]
    pub source: Vec<PathBuf>,

    /// Container format: "tar" or "tar.gz" (default: inferred from the archive's extension)
    #[arg(short = 'f', long = "format")]
    pub format: Option<String>,

    /// DEFLATE compression level, 0 (stored) through 9 (best); shortcuts -1..-9 are accepted too
    #[arg(long = "level")]
    pub level: Option<u8>,

    /// Shortcut for --level 1
    #[arg(long = "fast", conflicts_with = "level")]
    pub fast: bool,

    /// Shortcut for --level 9
    #[arg(long = "best", conflicts_with = "level")]
    pub best: bool,

    #[arg(short, long)]
    pub verbose: bool,

    /// Skip paths matching this glob (may be repeated)
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Store the contents symlinks point to, instead of the symlink itself
    #[arg(short = 'L', long = "follow-symlinks")]
    pub follow_symlinks: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    pub archive: PathBuf,

    #[arg(short, long)]
    pub verbose: bool,

    /// Show permissions, owner, size and mtime per entry, like `ls -l`
    #[arg(short = 'l', long = "long")]
    pub long: bool,

    /// Render sizes as 1.2 MiB instead of raw byte counts
    #[arg(short = 'h', long = "human-readable")]
    pub human_readable: bool,
}

#[derive(Args, Debug)]
pub struct TestArgs {
    pub archive: PathBuf,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    pub archive: PathBuf,
}
