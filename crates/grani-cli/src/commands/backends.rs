//! Backends command implementation.

use anyhow::Result;
use console::style;

use grani_adapter_sim::SimulatorBackend;
use grani_hal::Backend;

#[cfg(feature = "ibm")]
use grani_adapter_ibm::IbmBackend;

/// Execute the backends command.
pub async fn execute() -> Result<()> {
    println!("{} Available backends:\n", style("Grani").cyan().bold());

    // Simulator
    let sim = SimulatorBackend::new();
    let caps = sim.capabilities();
    let available = sim.availability().await?.is_available;

    println!(
        "  {} {} (local)",
        if available {
            style("●").green()
        } else {
            style("○").red()
        },
        style("simulator").bold(),
    );
    println!("    Qubits: {}", caps.num_qubits);
    println!("    Max shots: {}", caps.max_shots);
    println!("    Gates: {}", caps.gate_set.gates().join(", "));
    println!();

    // IBM backend
    #[cfg(feature = "ibm")]
    {
        match IbmBackend::new() {
            Ok(ibm) => {
                let available = ibm.availability().await.is_ok_and(|a| a.is_available);
                let caps = ibm.capabilities();
                println!(
                    "  {} {} ({})",
                    if available {
                        style("●").green()
                    } else {
                        style("○").yellow()
                    },
                    style("ibm").bold(),
                    ibm.target()
                );
                println!("    Qubits: {}", caps.num_qubits);
                println!("    Max shots: {}", caps.max_shots);
                if !available {
                    println!("    Status: offline or maintenance");
                }
            }
            Err(_) => {
                println!(
                    "  {} {} (not configured)",
                    style("○").dim(),
                    style("ibm").dim()
                );
                println!("    Set IBM_API_KEY + IBM_SERVICE_CRN or IBM_QUANTUM_TOKEN to enable");
            }
        }
        println!();
    }

    #[cfg(not(feature = "ibm"))]
    {
        println!(
            "  {} {} (not compiled in)",
            style("○").dim(),
            style("ibm").dim()
        );
        println!("    Rebuild with --features ibm to enable");
    }

    Ok(())
}
