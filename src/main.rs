//! linkonce - mirror a directory tree as hard links, once per file.
//!
//! Walks the current directory and hard-links every file into the same
//! relative location under the destination. Linked paths are remembered in
//! a state file, so re-running after the tree changes only links new files.
//!
//! Usage:
//!   linkonce -d DEST             Link new files into DEST
//!   linkonce -d DEST -s FILE     Use FILE instead of .linkonce for state
//!   linkonce -d DEST -v          Log every newly linked file
//!   linkonce --help              Show help

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use linkonce_core::DEFAULT_STATE_FILE;
use linkonce_ops::{Session, SessionConfig, SessionSummary};

#[derive(Parser)]
#[command(
    name = "linkonce",
    version,
    about = "Hard-link new files of the current directory into a mirror tree",
    long_about = "linkonce walks the current directory and creates a hard link for every \
                  file under the destination directory, at the same relative path.\n\n\
                  Linked paths are remembered in a state file, so running it again only \
                  links files that appeared since the previous run."
)]
struct Cli {
    /// Destination directory
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// State file to remember already linked files
    #[arg(short, long, default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// Verbose output (log every linked file)
    #[arg(short, long)]
    verbose: bool,

    /// Summary format; text is only printed with --verbose
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = SessionConfig::new(cli.dest.unwrap_or_default());
    config.state_file = cli.state;

    let summary = Session::new(config).run().context("linking failed")?;

    match cli.format {
        OutputFormat::Text if cli.verbose => print_summary(&summary),
        OutputFormat::Text => {}
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print a one-screen summary of the session.
fn print_summary(summary: &SessionSummary) {
    let walk = &summary.walk;
    eprintln!(
        "{} linked, {} already linked, {} directories in {:.2}s",
        walk.linked,
        walk.skipped,
        walk.dirs,
        summary.elapsed.as_secs_f64()
    );
    eprintln!(
        "state: {} -> {} entries",
        summary.state_before, summary.state_after
    );
}
