//! Grani Local Statevector Simulator
//!
//! This crate provides the local execution path: exact statevector
//! simulation of Grani circuits with probabilistic measurement sampling.
//! The circuits Grani ships are 3–5 qubits, far below the practical
//! statevector limit, so simulation is effectively instant.
//!
//! # Features
//!
//! - **Exact Simulation**: Full statevector representation
//! - **All Grani Gates**: Supports the complete `grani-ir` gate set
//! - **Measurement Mapping**: Honors per-instruction qubit→clbit wiring,
//!   including the big-endian mapping the sort circuits use
//!
//! # Example
//!
//! ```ignore
//! use grani_adapter_sim::SimulatorBackend;
//! use grani_hal::Backend;
//! use grani_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new();
//!
//!     let circuit = Circuit::bell()?;
//!     let job_id = backend.submit(&circuit, 1000).await?;
//!     let result = backend.wait(&job_id).await?;
//!
//!     // Expect ~50% |00⟩ and ~50% |11⟩
//!     println!("Results: {:?}", result.counts);
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::SimulatorBackend;
