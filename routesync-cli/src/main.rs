//! routesync — keep a local route index in step with the remote route listing.
//!
//! # Usage
//!
//! ```text
//! routesync -k <API_KEY> -t <AUTH_TOKEN> -u <USER_ID>
//!           [--config <yaml>] [--index-file <path>] [--base-url <url>]
//!           [--dry-run] [--json] [-v]
//! ```

mod commands;

use anyhow::Result;
use clap::Parser;

use commands::sync::SyncArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "routesync",
    version,
    about = "Fetch new and updated routes, purge removed ones",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    sync: SyncArgs,

    /// Log progress to stderr (RUST_LOG takes precedence).
    #[arg(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.sync.run()
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
