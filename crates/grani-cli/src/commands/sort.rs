//! Sort command implementation.

use anyhow::Result;
use console::style;

use grani_adapter_sim::SimulatorBackend;
use grani_hal::Backend;
use grani_ir::{Circuit, IrResult, sort};

use super::common::format_counts;

/// Execute the sort command.
///
/// Runs the chosen comparator network on the simulator, either for one
/// 3-bit input or sweeping all eight.
pub async fn execute(passes: u8, input: Option<&str>, shots: u32) -> Result<()> {
    let build: fn(&str) -> IrResult<Circuit> = match passes {
        2 => sort::two_pass,
        3 => sort::three_pass,
        other => anyhow::bail!("Unsupported pass count: {other}. Available: 2, 3"),
    };

    let inputs: Vec<String> = match input {
        Some(bits) => vec![bits.to_string()],
        None => (0..8).map(|i| format!("{i:03b}")).collect(),
    };

    println!(
        "{} {passes}-pass comparator network ({} shots each)",
        style("→").cyan().bold(),
        shots
    );

    let backend = SimulatorBackend::new();

    for bits in &inputs {
        let circuit = build(bits)?;
        let job_id = backend.submit(&circuit, shots).await?;
        let result = backend.wait(&job_id).await?;

        println!(
            "Input |{}⟩ → {}",
            style(bits).green(),
            format_counts(&result.counts)
        );

        if let Some((readout, _)) = result.counts.most_frequent() {
            println!("  register readout: {}", style(readout).cyan());
        }
    }

    Ok(())
}
