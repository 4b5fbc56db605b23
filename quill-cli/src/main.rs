//! Quill: render one text template with file metadata and record what it
//! read.
//!
//! # Usage
//!
//! ```text
//! quill [-v] [-n] <infile> [--out FILE] [--meta NAME] [--dep FILE TARGET]
//!       [--var KEY VALUE]... | [--varfile FILE] [--creation-cmd PROGRAM]
//! ```

mod commands;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use commands::render::RenderArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "quill",
    version,
    about = "Render a template with file metadata and emit its dependencies",
    long_about = None,
)]
struct Cli {
    /// Log arguments, metadata handling and dependencies to stderr.
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    render: RenderArgs,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.render.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
