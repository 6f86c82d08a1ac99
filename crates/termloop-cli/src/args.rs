use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "termloop")]
#[command(
    about = "Interactive console playground: queued output, auto-flush, shell-style history",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (all keys optional)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the history capacity from the config
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Disable the HH:MM:SS prefix on notice lines
    #[arg(long)]
    pub no_timestamps: bool,

    /// Force the line-buffered fallback even on a real terminal
    #[arg(long)]
    pub plain: bool,

    /// Do not start the background notice producer
    #[arg(long)]
    pub no_producer: bool,
}
