//! Shared helpers for CLI commands.

use anyhow::Result;
use console::style;

use grani_adapter_sim::SimulatorBackend;
use grani_hal::{Aggregate, Backend, Counts};

#[cfg(feature = "ibm")]
use grani_adapter_ibm::{IbmBackend, KeyPolicy};

/// Create the execution backend for a run.
///
/// Without `--hardware` the local simulator runs and the backend name is
/// ignored.
pub async fn create_backend(
    hardware: bool,
    backend: &str,
    strict_decode: bool,
) -> Result<Box<dyn Backend>> {
    if !hardware {
        tracing::debug!(%backend, strict_decode, "local run, hardware flags ignored");
        println!("  {} local statevector simulator", style("→").cyan().bold());
        return Ok(Box::new(SimulatorBackend::new()));
    }

    #[cfg(feature = "ibm")]
    {
        println!("  Connecting to IBM Quantum ({backend})...");
        match IbmBackend::connect(backend).await {
            Ok(b) => {
                let policy = if strict_decode {
                    KeyPolicy::Strict
                } else {
                    KeyPolicy::Lenient
                };
                Ok(Box::new(b.with_key_policy(policy)))
            }
            Err(e) => {
                anyhow::bail!(
                    "Failed to connect to IBM Quantum: {}. Set IBM_API_KEY + IBM_SERVICE_CRN (or IBM_QUANTUM_TOKEN).",
                    e
                );
            }
        }
    }

    #[cfg(not(feature = "ibm"))]
    {
        anyhow::bail!("IBM backend not available. Rebuild with --features ibm");
    }
}

/// One-line rendering of a trial's counts, highest first.
pub fn format_counts(counts: &Counts) -> String {
    let entries: Vec<String> = counts
        .sorted()
        .iter()
        .map(|(bits, count)| format!("{bits}: {count}"))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// Print the ranked aggregate summary with the target's amplification.
pub fn print_summary(aggregate: &Aggregate, target: &str) {
    println!("\n{} Aggregated results:", style("✓").green().bold());

    for (bits, count) in aggregate.ranked() {
        let pct = aggregate.percentage(bits);
        let bar_len = (pct / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);
        let mark = if bits == target { " ✓" } else { "" };

        println!(
            "  {}: {:>6} ({:>5.2}%) {}{}",
            style(bits).cyan(),
            count,
            pct,
            style(bar).green(),
            mark
        );
    }

    println!(
        "\nAmplification for \"{}\": {:.2} % over {} shots",
        style(target).cyan(),
        aggregate.percentage(target),
        aggregate.expected_total()
    );
}
