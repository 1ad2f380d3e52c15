//! OpenQASM 3 emission for job submission.
//!
//! IBM's sampler accepts circuits as OpenQASM 3 source. The Grani gate set
//! maps 1:1 onto `stdgates.inc`, so emission is a direct serialization of
//! the instruction list — no decomposition needed; IBM's runtime transpiles
//! to device-native gates server-side.

use grani_ir::{Circuit, Instruction, InstructionKind};

/// Emit a circuit as OpenQASM 3 source.
pub fn emit(circuit: &Circuit) -> String {
    let mut out = String::new();

    out.push_str("OPENQASM 3.0;\n");
    out.push_str("include \"stdgates.inc\";\n\n");

    let num_qubits = circuit.num_qubits();
    if num_qubits > 0 {
        out.push_str(&format!("qubit[{num_qubits}] q;\n"));
    }
    let num_clbits = circuit.num_clbits();
    if num_clbits > 0 {
        out.push_str(&format!("bit[{num_clbits}] c;\n"));
    }
    if num_qubits > 0 || num_clbits > 0 {
        out.push('\n');
    }

    for instruction in circuit.instructions() {
        emit_instruction(&mut out, instruction);
    }

    out
}

fn emit_instruction(out: &mut String, instruction: &Instruction) {
    match &instruction.kind {
        InstructionKind::Gate(gate) => {
            let qubits = qubit_list(instruction);
            out.push_str(&format!("{} {};\n", gate.name(), qubits));
        }
        InstructionKind::Measure => {
            for (q, c) in instruction.qubits.iter().zip(instruction.clbits.iter()) {
                out.push_str(&format!("c[{}] = measure q[{}];\n", c.0, q.0));
            }
        }
        InstructionKind::Reset => {
            let qubits = qubit_list(instruction);
            out.push_str(&format!("reset {qubits};\n"));
        }
        InstructionKind::Barrier => {
            if instruction.qubits.is_empty() {
                out.push_str("barrier;\n");
            } else {
                out.push_str(&format!("barrier {};\n", qubit_list(instruction)));
            }
        }
    }
}

fn qubit_list(instruction: &Instruction) -> String {
    instruction
        .qubits
        .iter()
        .map(|q| format!("q[{}]", q.0))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use grani_ir::{search, sort};

    #[test]
    fn test_emit_bell() {
        let circuit = Circuit::bell().unwrap();
        let qasm = emit(&circuit);

        assert!(qasm.starts_with("OPENQASM 3.0;\n"));
        assert!(qasm.contains("include \"stdgates.inc\";"));
        assert!(qasm.contains("qubit[2] q;"));
        assert!(qasm.contains("bit[2] c;"));
        assert!(qasm.contains("h q[0];"));
        assert!(qasm.contains("cx q[0], q[1];"));
        assert!(qasm.contains("c[0] = measure q[0];"));
        assert!(qasm.contains("c[1] = measure q[1];"));
    }

    #[test]
    fn test_emit_sort_circuit() {
        let circuit = sort::three_pass("101").unwrap();
        let qasm = emit(&circuit);

        assert!(qasm.contains("qubit[5] q;"));
        assert!(qasm.contains("bit[3] c;"));
        assert!(qasm.contains("cswap q[4], q[0], q[1];"));
        assert!(qasm.contains("reset q[4];"));
        // Big-endian measurement mapping
        assert!(qasm.contains("c[2] = measure q[0];"));
        assert!(qasm.contains("c[0] = measure q[2];"));
    }

    #[test]
    fn test_emit_grover_circuit() {
        let circuit = search::grover_eraser("011", 2).unwrap();
        let qasm = emit(&circuit);

        assert!(qasm.contains("qubit[3] q;"));
        assert!(qasm.contains("ccx q[1], q[2], q[0];"));
        assert!(qasm.contains("x q[2];"));
    }

    #[test]
    fn test_emit_barrier() {
        let mut circuit = Circuit::with_size("b", 2, 0);
        circuit.barrier_all().unwrap();
        let qasm = emit(&circuit);
        assert!(qasm.contains("barrier q[0], q[1];"));
    }
}
