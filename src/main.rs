//! CLI entry point.

use std::path::Path;

use clap::Parser;
use color_eyre::Result;
use console::{style, Term};
use tracing::debug;
use treefetch::downloader::DownloaderBuilder;

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Parse CLI arguments first, so --help works without logs.
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    if args.urls.is_empty() {
        eprintln!("No URLs given. Example: treefetch -o mirror https://example.com/img/a.png");
        return Ok(());
    }

    let directory = match args.output {
        Some(ref output) => output.clone(),
        None => {
            let current = std::env::current_dir()?;
            if !args.yes && !confirm_directory(&current)? {
                eprintln!("Change into the directory to save into and run again, or pass -o.");
                return Ok(());
            }
            current
        }
    };

    let builder = if args.hide_progress || args.quiet {
        DownloaderBuilder::hidden()
    } else {
        DownloaderBuilder::new()
    };
    let downloader = builder
        .directory(directory)
        .concurrent_downloads(usize::from(args.concurrency))
        .clear(args.clear)
        .build();

    let result = downloader.run(args.urls.as_slice()).await?;

    if !result.is_success() {
        println!(
            "{} of {} downloads failed:",
            style(result.failed()).red().bold(),
            result.total()
        );
        for failure in result.failures() {
            println!("  {} ({})", failure.url(), style(failure.reason()).dim());
        }
    } else if !args.quiet {
        println!(
            "{} {} files mirrored",
            style("✓").green(),
            result.succeeded()
        );
    }

    if args.strict && !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Ask on the terminal whether `dir` is the right place to save into.
fn confirm_directory(dir: &Path) -> std::io::Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!(
        "Download into the current directory {}? [y/N] ",
        style(dir.display()).bold()
    ))?;
    let answer = term.read_line()?;
    Ok(cli::is_yes(&answer))
}
