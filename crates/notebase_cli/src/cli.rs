use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "notebase")]
#[command(about = "Local note store with tree browsing and full-text search", version)]
pub struct Cli {
    /// SQLite database file holding the notes.
    #[arg(long, global = true, default_value = "notebase.sqlite3")]
    pub db: PathBuf,
    /// Directory for rolling log files. Logging stays off when omitted.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
    /// Overrides the configured log level.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// JSON config file (index options, search limit, log level).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import every UTF-8 file under a directory.
    Import(ImportArgs),
    /// Print the note path tree.
    Tree(TreeArgs),
    /// Full-text search over note contents.
    Search(SearchArgs),
    /// Print one note by key or tree node id.
    Show(ShowArgs),
    /// Print corpus status and the last import.
    Status,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Directory to import. Keys are prefixed with its folder name.
    pub dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Emit the widget JSON shape instead of an indented listing.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(allow_hyphen_values = true)]
    pub query: String,
    /// Maximum hits; defaults to the configured search limit.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Corpus key (`vault/a.md`) or node id (`root/vault/a.md`).
    pub target: String,
}
