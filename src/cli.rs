//! CLI argument definitions using clap derive macros.

use clap::Parser;
use std::path::PathBuf;

/// Mirror HTTP(S) URLs into a local directory tree.
///
/// `https://host/a/b/c.png?v=1` is saved as `<output>/a/b/c.png`.
#[derive(Parser, Debug)]
#[command(name = "treefetch")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to download
    pub urls: Vec<String>,

    /// Base directory (defaults to the current directory, after confirmation)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum concurrent transfers
    #[arg(short = 'c', long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Replace files that are in the way of a directory
    #[arg(long)]
    pub clear: bool,

    /// Download into the current directory without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Exit with status 1 when any transfer failed
    #[arg(long)]
    pub strict: bool,

    /// Do not draw progress bars
    #[arg(long)]
    pub hide_progress: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Interpret an answer to a yes/no prompt. Anything but a yes is a no.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
