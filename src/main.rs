//! UI Conductor test runner
//!
//! Runs pre-recorded UI Conductor JSON tests through the uicd CLI against one
//! or more devices and reports a verdict per test case.

use clap::Parser;
use uicd_runner::cli;
use uicd_runner::commands::Commands;
use uicd_runner::common::logging;

#[derive(Parser)]
#[command(name = "uicd-runner", about = "Run UI Conductor tests through the uicd CLI")]
#[command(version, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(path) = logging::init_cli(cli.verbose) {
        tracing::debug!("Logging to {}", path.display());
    }

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(hint) = cli::hint(&e) {
                eprintln!("Hint: {hint}");
            }
            std::process::exit(2);
        }
    }
}
