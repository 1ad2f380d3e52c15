//! Search command implementation: the multi-trial amplification run.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use grani_hal::Aggregate;
use grani_ir::search;

use super::common::{create_backend, format_counts, print_summary};

/// Configuration for a search run.
///
/// Defaults live in the clap definitions; this struct is what the run
/// routine actually consumes.
pub struct SearchConfig {
    /// Run on IBM hardware instead of the local simulator.
    pub hardware: bool,
    /// Hardware backend name.
    pub backend: String,
    /// Number of independent trials.
    pub trials: u32,
    /// Shots per trial.
    pub shots: u32,
    /// Target bitstring to amplify.
    pub target: String,
    /// Oracle + diffusion rounds per circuit.
    pub iterations: u32,
    /// Fail on unrecognizable result keys.
    pub strict_decode: bool,
}

/// Execute the search command.
pub async fn execute(config: SearchConfig) -> Result<()> {
    println!(
        "{} Amplifying {} ({} trial(s) × {} shots, {} rounds)",
        style("→").cyan().bold(),
        style(&config.target).green(),
        config.trials,
        config.shots,
        config.iterations
    );

    let backend =
        create_backend(config.hardware, &config.backend, config.strict_decode).await?;

    let avail = backend.availability().await?;
    if !avail.is_available {
        anyhow::bail!(
            "Backend '{}' is not available{}",
            backend.name(),
            avail
                .status_message
                .map(|m| format!(": {m}"))
                .unwrap_or_default()
        );
    }

    let mut aggregate = Aggregate::new(config.shots);

    for trial in 1..=config.trials {
        let circuit = search::grover_eraser(&config.target, config.iterations)?;

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        spinner.set_message(format!("Trial {trial}/{}: submitting...", config.trials));
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));

        let job_id = backend.submit(&circuit, config.shots).await?;
        spinner.set_message(format!("Trial {trial}/{}: job {job_id}...", config.trials));

        let result = backend.wait(&job_id).await?;
        spinner.finish_and_clear();

        println!("Trial {trial}: {}", format_counts(&result.counts));
        aggregate.fold(&result.counts);
    }

    print_summary(&aggregate, &config.target);

    Ok(())
}
