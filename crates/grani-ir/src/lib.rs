//! Grani Circuit Intermediate Representation
//!
//! This crate provides the core data structures for representing the small
//! fixed-size circuits Grani runs: reversible comparator sorts and Grover
//! "eraser" searches on 3–5 qubits.
//!
//! # Overview
//!
//! A [`Circuit`] is a validated sequence of [`Instruction`]s over a fixed set
//! of qubits and classical bits. There are no symbolic parameters and no
//! compilation passes — circuits are built programmatically and handed to a
//! backend as-is.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`] for addressing
//!   quantum and classical registers
//! - **Gates**: [`StandardGate`] for the built-in non-parameterized gate set
//! - **Instructions**: [`Instruction`] combining gates with their operands
//! - **Circuit**: [`Circuit`] high-level builder API
//! - **Domain circuits**: [`sort`] (reversible comparator sorts) and
//!   [`search`] (Grover amplitude amplification)
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use grani_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert!(circuit.depth() >= 2);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg` | 1 | S and S-dagger gates |
//! | `T`, `Tdg` | 1 | T and T-dagger gates |
//! | `CX`, `CY`, `CZ`, `CH` | 2 | Controlled single-qubit gates |
//! | `Swap` | 2 | SWAP gate |
//! | `CCX` | 3 | Toffoli (CCNOT) gate |
//! | `CSwap` | 3 | Fredkin (controlled-SWAP) gate |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;
pub mod search;
pub mod sort;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{ClbitId, QubitId};
