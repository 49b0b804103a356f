//! iinfo - print what an image plugin sees in a file
//!
//! Opens each input through the OpenEXR plugin and prints its spec,
//! optionally every subimage and decoded channel ranges.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod info;

#[derive(Parser, Debug)]
#[command(name = "iinfo")]
#[command(author, version, about = "Print image information")]
#[command(long_about = "
Prints the resolution, channels, tiling and metadata of image files as
seen through the imageio plugin interface.

Examples:
  iinfo beauty.exr                 # One-line summary
  iinfo -a beauty.exr              # All metadata
  iinfo -s texture.exr             # Resolution of every mip level
  iinfo --verify -j 8 shots/*.exr  # Decode every pixel, 8 files at a time
")]
struct Cli {
    /// Input image(s)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long)]
    verbose: bool,

    /// Show all metadata
    #[arg(short, long)]
    all: bool,

    /// Show every subimage
    #[arg(short, long)]
    subimages: bool,

    /// Decode every pixel and report per-channel ranges
    #[arg(long)]
    verify: bool,

    /// Reject slightly malformed files
    #[arg(long)]
    pedantic: bool,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    info::run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["iinfo", "a.exr"]).unwrap();
        assert_eq!(cli.inputs, [PathBuf::from("a.exr")]);
        assert!(!cli.verbose && !cli.all && !cli.subimages && !cli.verify && !cli.pedantic);
        assert_eq!(cli.threads, 0);
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "iinfo", "-v", "-a", "-s", "--verify", "--pedantic", "-j", "4", "a.exr", "b.exr",
        ])
        .unwrap();
        assert!(cli.verbose && cli.all && cli.subimages && cli.verify && cli.pedantic);
        assert_eq!(cli.threads, 4);
        assert_eq!(cli.inputs.len(), 2);
    }

    #[test]
    fn test_parse_long_names() {
        let cli = Cli::try_parse_from(["iinfo", "--all", "--subimages", "--threads", "2", "x.exr"])
            .unwrap();
        assert!(cli.all && cli.subimages);
        assert_eq!(cli.threads, 2);
    }

    #[test]
    fn test_inputs_required() {
        assert!(Cli::try_parse_from(["iinfo"]).is_err());
        assert!(Cli::try_parse_from(["iinfo", "-j", "many", "a.exr"]).is_err());
    }
}
