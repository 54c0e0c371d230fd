use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "Arbor: structural-sharing merge for JSON documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log merge and store activity at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge a source document into a target document
    Merge(MergeArgs),
    /// Apply a JSON-lines command log to a fresh store
    Replay(ReplayArgs),
    /// Show which parts of a document survive merging another into it
    Diff(DiffArgs),
}

#[derive(Args)]
pub struct MergeArgs {
    /// Target document (JSON)
    pub target: PathBuf,
    /// Source document (JSON)
    pub source: PathBuf,
    /// Print the identity diff instead of the merged document
    #[arg(long)]
    pub changes: bool,
    /// Treat objects with a "$type" member as opaque records
    #[arg(long)]
    pub tagged: bool,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Command log, one JSON command per line
    pub commands: PathBuf,
    /// Store configuration (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct DiffArgs {
    pub before: PathBuf,
    pub after: PathBuf,
    /// Treat objects with a "$type" member as opaque records
    #[arg(long)]
    pub tagged: bool,
}
