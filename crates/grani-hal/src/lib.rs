//! Grani Hardware Abstraction Layer
//!
//! This crate provides a unified interface for running Grani circuits on
//! quantum backends — the local statevector simulator and IBM Quantum
//! hardware share one job lifecycle and one result model.
//!
//! # Overview
//!
//! - A common [`Backend`] trait for job submission and management
//! - [`Capabilities`] to describe backend features and constraints
//! - Unified result handling via [`ExecutionResult`] and [`Counts`]
//! - Cross-trial accumulation via [`Aggregate`]
//!
//! # Example: Running a Circuit
//!
//! ```ignore
//! use grani_hal::Backend;
//! use grani_adapter_sim::SimulatorBackend;
//! use grani_ir::search;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let circuit = search::grover_eraser("011", 2)?;
//!     let backend = SimulatorBackend::new();
//!
//!     let job_id = backend.submit(&circuit, 1024).await?;
//!     let result = backend.wait(&job_id).await?;
//!
//!     if let Some((bitstring, count)) = result.counts.most_frequent() {
//!         println!("Most frequent: {} ({} times)", bitstring, count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Job lifecycle
//!
//! ```text
//!   capabilities() ──→ validate() ──→ submit() ──→ status() ──→ result()
//!    (sync, &ref)       (async)       (async)      (async)      (async)
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod result;

pub use backend::{Backend, BackendAvailability, BackendConfig, BackendFactory, ValidationResult};
pub use capability::{Capabilities, GateSet};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use result::{Aggregate, Counts, ExecutionResult};
