//! Grover "eraser" search circuit.
//!
//! Amplitude amplification over a 3-qubit register: uniform superposition,
//! then repeated oracle + diffusion rounds that concentrate probability on a
//! chosen target bitstring. The target string is written most-significant
//! bit first, matching the canonical outcome rendering (classical bit 2
//! leftmost).

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::qubit::{ClbitId, QubitId};

/// Width of the search register.
pub const SEARCH_WIDTH: u32 = 3;

/// Recommended number of amplification rounds for a 3-qubit register.
pub const DEFAULT_ITERATIONS: u32 = 2;

/// Per-qubit target bits, parsed from the MSB-first target string.
///
/// `bits[i]` is the desired value of qubit `i`, so the leftmost character of
/// the string maps to the highest qubit index.
fn target_bits(target: &str) -> IrResult<[bool; SEARCH_WIDTH as usize]> {
    if target.len() != SEARCH_WIDTH as usize || !target.chars().all(|c| c == '0' || c == '1') {
        return Err(IrError::InvalidBitstring {
            value: target.to_string(),
            expected: SEARCH_WIDTH,
        });
    }
    let mut bits = [false; SEARCH_WIDTH as usize];
    for (i, c) in target.chars().rev().enumerate() {
        bits[i] = c == '1';
    }
    Ok(bits)
}

/// Phase oracle: flip the sign of the target basis state.
///
/// X-conjugation turns the target into |111⟩, where the H·CCX·H sandwich on
/// qubit 0 acts as a CCZ.
fn oracle(circuit: &mut Circuit, bits: &[bool; 3]) -> IrResult<()> {
    for (i, &bit) in bits.iter().enumerate() {
        if !bit {
            circuit.x(QubitId(i as u32))?;
        }
    }

    circuit.h(QubitId(0))?;
    circuit.ccx(QubitId(1), QubitId(2), QubitId(0))?;
    circuit.h(QubitId(0))?;

    for (i, &bit) in bits.iter().enumerate() {
        if !bit {
            circuit.x(QubitId(i as u32))?;
        }
    }
    Ok(())
}

/// Diffusion operator: inversion about the mean.
fn diffusion(circuit: &mut Circuit) -> IrResult<()> {
    for i in 0..SEARCH_WIDTH {
        circuit.h(QubitId(i))?;
    }
    for i in 0..SEARCH_WIDTH {
        circuit.x(QubitId(i))?;
    }

    circuit.h(QubitId(2))?;
    circuit.ccx(QubitId(0), QubitId(1), QubitId(2))?;
    circuit.h(QubitId(2))?;

    for i in 0..SEARCH_WIDTH {
        circuit.x(QubitId(i))?;
    }
    for i in 0..SEARCH_WIDTH {
        circuit.h(QubitId(i))?;
    }
    Ok(())
}

/// Build the Grover eraser circuit amplifying `target`.
///
/// `target` is a 3-character 0/1 string; `iterations` oracle + diffusion
/// rounds are applied (two is optimal for 3 qubits).
pub fn grover_eraser(target: &str, iterations: u32) -> IrResult<Circuit> {
    let bits = target_bits(target)?;
    let mut circuit = Circuit::with_size(
        format!("grover_{target}"),
        SEARCH_WIDTH,
        SEARCH_WIDTH,
    );

    for i in 0..SEARCH_WIDTH {
        circuit.h(QubitId(i))?;
    }

    for _ in 0..iterations {
        oracle(&mut circuit, &bits)?;
        diffusion(&mut circuit)?;
    }

    for i in 0..SEARCH_WIDTH {
        circuit.measure(QubitId(i), ClbitId(i))?;
    }
    Ok(circuit)
}
