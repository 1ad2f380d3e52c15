//! Grani Command-Line Interface
//!
//! The main entry point for the Grani CLI tool.
//!
//! ```text
//!            G R A N I
//!   Reversible sorts & Grover search
//!     on simulators and real QPUs
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{backends, search, sort, version};

/// Grani - comparator-sort and Grover-search circuits on quantum backends
#[derive(Parser)]
#[command(name = "grani")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Grover eraser search and aggregate counts across trials
    Search {
        /// Run on IBM hardware instead of the local simulator
        #[arg(long)]
        hardware: bool,

        /// Hardware backend name
        #[arg(short, long, default_value = "ibm_brisbane")]
        backend: String,

        /// Repeat count
        #[arg(short, long, default_value = "1")]
        trials: u32,

        /// Shots per trial
        #[arg(short, long, default_value = "1024")]
        shots: u32,

        /// Target bitstring to amplify
        #[arg(long, default_value = "011")]
        target: String,

        /// Oracle + diffusion rounds
        #[arg(long, default_value = "2")]
        iterations: u32,

        /// Fail on unrecognizable result keys instead of passing them through
        #[arg(long)]
        strict_decode: bool,
    },

    /// Run a comparator-sort circuit on the simulator
    Sort {
        /// Comparator network variant (2 or 3 passes)
        #[arg(short, long, default_value = "2")]
        passes: u8,

        /// 3-bit input register; sweeps all inputs if omitted
        #[arg(short, long)]
        input: Option<String>,

        /// Shots per input
        #[arg(short, long, default_value = "1024")]
        shots: u32,
    },

    /// List available backends
    Backends,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Search {
            hardware,
            backend,
            trials,
            shots,
            target,
            iterations,
            strict_decode,
        } => {
            search::execute(search::SearchConfig {
                hardware,
                backend,
                trials,
                shots,
                target,
                iterations,
                strict_decode,
            })
            .await
        }

        Commands::Sort {
            passes,
            input,
            shots,
        } => sort::execute(passes, input.as_deref(), shots).await,

        Commands::Backends => backends::execute().await,

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
