//! Reversible comparator-sort circuits.
//!
//! Two builders over a 3-bit data register:
//!
//! - [`two_pass`] — a compact comparator (one shared ancilla) applied to the
//!   pairs (0,1) and (1,2). Each pass moves the pair maximum to the
//!   higher-index qubit, so ones bubble toward qubit 2; the lower qubit
//!   keeps its value, so the result is a prefix-maximum sweep rather than a
//!   permutation of the input.
//! - [`three_pass`] — a full compare-and-swap (two ancillas) applied
//!   bubble-sort style to (0,1), (1,2), (0,1); the register ends sorted
//!   ascending.
//!
//! The swap decision is irreversible on the data alone, so each pass leaves
//! its record in the ancillas; they are explicitly reset before reuse —
//! stale ancilla state would corrupt the next pass's condition.
//!
//! Data qubits are measured most-significant-first: qubit 0 lands in the
//! highest classical bit, so the canonical outcome string reads the register
//! left to right.

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::qubit::{ClbitId, QubitId};

/// Width of the sorted data register.
pub const DATA_WIDTH: u32 = 3;

/// Parse a 3-character 0/1 string into per-qubit initial values.
fn parse_bits(bits: &str) -> IrResult<Vec<bool>> {
    if bits.len() != DATA_WIDTH as usize || !bits.chars().all(|c| c == '0' || c == '1') {
        return Err(IrError::InvalidBitstring {
            value: bits.to_string(),
            expected: DATA_WIDTH,
        });
    }
    Ok(bits.chars().map(|c| c == '1').collect())
}

/// Load the input bits into the data qubits.
fn load_input(circuit: &mut Circuit, bits: &[bool]) -> IrResult<()> {
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            circuit.x(QubitId(i as u32))?;
        }
    }
    Ok(())
}

/// Measure the data qubits most-significant-first.
///
/// Qubit `i` goes to classical bit `W-1-i`, so the rendered bitstring reads
/// `q0 q1 q2` left to right.
fn measure_data(circuit: &mut Circuit) -> IrResult<()> {
    for i in 0..DATA_WIDTH {
        circuit.measure(QubitId(i), ClbitId(DATA_WIDTH - 1 - i))?;
    }
    Ok(())
}

/// Comparator pass on qubits `a` and `b`: moves the pair maximum into `b`.
///
/// The ancilla computes `a XOR b` to condition the flip of `b`, then is
/// reset — it absorbs the bit of information the overwrite destroys.
fn comparator(circuit: &mut Circuit, a: QubitId, b: QubitId, ancilla: QubitId) -> IrResult<()> {
    circuit.cx(b, ancilla)?;
    circuit.cx(a, ancilla)?;
    circuit.ccx(ancilla, a, b)?;
    circuit.reset(ancilla)?;
    Ok(())
}

/// Compare-and-swap: swap qubits `i` and `j` when `i > j`.
///
/// `anc_not` holds NOT(j), `anc_cond` holds `i AND NOT(j)`. After the
/// conditional swap both ancillas are reset for the next pass.
fn compare_and_swap(
    circuit: &mut Circuit,
    i: QubitId,
    j: QubitId,
    anc_not: QubitId,
    anc_cond: QubitId,
) -> IrResult<()> {
    circuit.x(j)?;
    circuit.cx(j, anc_not)?;
    circuit.x(j)?;

    circuit.ccx(i, anc_not, anc_cond)?;
    circuit.cswap(anc_cond, i, j)?;

    circuit.reset(anc_cond)?;
    circuit.reset(anc_not)?;
    Ok(())
}

/// Build the 2-pass comparator circuit for a 3-bit input.
///
/// Four qubits: three data plus one shared ancilla.
pub fn two_pass(bits: &str) -> IrResult<Circuit> {
    let input = parse_bits(bits)?;
    let mut circuit = Circuit::with_size(format!("sort2_{bits}"), DATA_WIDTH + 1, DATA_WIDTH);

    load_input(&mut circuit, &input)?;
    circuit.barrier_all()?;

    let ancilla = QubitId(3);
    comparator(&mut circuit, QubitId(0), QubitId(1), ancilla)?;
    comparator(&mut circuit, QubitId(1), QubitId(2), ancilla)?;
    circuit.barrier_all()?;

    measure_data(&mut circuit)?;
    Ok(circuit)
}

/// Build the 3-pass bubble-sort circuit for a 3-bit input.
///
/// Five qubits: three data plus two ancillas reset between the three
/// compare-and-swap passes. The measured register is sorted ascending.
pub fn three_pass(bits: &str) -> IrResult<Circuit> {
    let input = parse_bits(bits)?;
    let mut circuit = Circuit::with_size(format!("sort3_{bits}"), DATA_WIDTH + 2, DATA_WIDTH);

    load_input(&mut circuit, &input)?;

    let (anc_not, anc_cond) = (QubitId(3), QubitId(4));
    compare_and_swap(&mut circuit, QubitId(0), QubitId(1), anc_not, anc_cond)?;
    compare_and_swap(&mut circuit, QubitId(1), QubitId(2), anc_not, anc_cond)?;
    compare_and_swap(&mut circuit, QubitId(0), QubitId(1), anc_not, anc_cond)?;
    circuit.barrier_all()?;

    measure_data(&mut circuit)?;
    Ok(circuit)
}
