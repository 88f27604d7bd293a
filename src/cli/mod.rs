pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stripfeed")]
#[command(about = "Collect new web comic strips and push them to Telegram", long_about = None)]
pub struct Cli {
    /// Path to the watermark database
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect new strips and deliver them
    Run(RunArgs),
    /// List the known sources
    Sources,
    /// Show the stored watermark of every source
    Watermarks,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Print to the console instead of sending to Telegram
    #[arg(long)]
    pub console: bool,

    /// Days to look back for sources without a watermark
    #[arg(long)]
    pub delta: Option<i64>,

    /// Only collect these source ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub strips: Vec<String>,

    /// Deliver without storing the new watermarks
    #[arg(long)]
    pub dry_run: bool,
}
