//! IBM Quantum backend adapter for Grani.
//!
//! Talks to the IBM Quantum REST API (both the current Cloud endpoint and
//! the legacy token endpoint), submits circuits as OpenQASM 3 sampler jobs,
//! and normalizes whichever result shape the service returns — legacy
//! quasi-distributions, pre-aggregated counts, or V2 bit-array samples —
//! into canonical [`grani_hal::Counts`].
//!
//! # Authentication
//!
//! - `IBM_API_KEY` + `IBM_SERVICE_CRN` — new Cloud API via IAM key exchange
//! - `IBM_QUANTUM_TOKEN` — legacy direct-token endpoint
//!
//! # Example
//!
//! ```ignore
//! use grani_adapter_ibm::IbmBackend;
//! use grani_hal::Backend;
//! use grani_ir::search;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = IbmBackend::connect("ibm_brisbane").await?;
//!     let circuit = search::grover_eraser("011", 2)?;
//!
//!     let job_id = backend.submit(&circuit, 1024).await?;
//!     let result = backend.wait(&job_id).await?;
//!     println!("{:?}", result.counts.most_frequent());
//!     Ok(())
//! }
//! ```

mod api;
mod backend;
mod decode;
mod error;
mod qasm;

pub use backend::IbmBackend;
pub use decode::{DecodeError, KeyPolicy, ResultFormat};
pub use error::{IbmError, IbmResult};
