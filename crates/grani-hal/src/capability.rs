//! Backend capability descriptions.

use serde::{Deserialize, Serialize};

/// The set of gate names a backend accepts (OpenQASM 3 naming convention).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSet {
    gates: Vec<String>,
}

impl GateSet {
    /// Create a gate set from explicit gate names.
    pub fn new(gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            gates: gates.into_iter().map(Into::into).collect(),
        }
    }

    /// The full Grani gate vocabulary (simulators accept everything).
    pub fn universal() -> Self {
        Self::new([
            "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "cx", "cy", "cz", "ch", "swap",
            "ccx", "cswap",
        ])
    }

    /// Gates accepted by IBM sampler submission.
    ///
    /// IBM's runtime transpiles to native gates server-side, so the accepted
    /// surface is the stdgates vocabulary we emit, not the Heron native set.
    pub fn ibm() -> Self {
        Self::universal()
    }

    /// Check whether a gate name is in the set.
    pub fn contains(&self, name: &str) -> bool {
        self.gates.iter().any(|g| g == name)
    }

    /// The gate names in this set.
    pub fn gates(&self) -> &[String] {
        &self.gates
    }
}

/// Capabilities of a quantum backend.
///
/// Cached at backend construction time; `Backend::capabilities()` returns a
/// reference without I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set.
    pub gate_set: GateSet,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (`true`) vs real hardware (`false`).
    pub is_simulator: bool,
}

impl Capabilities {
    /// Create capabilities for the local simulator.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            gate_set: GateSet::universal(),
            max_shots: 100_000,
            is_simulator: true,
        }
    }

    /// Create capabilities for IBM devices.
    pub fn ibm(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            gate_set: GateSet::ibm(),
            max_shots: 100_000,
            is_simulator: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universal_gate_set() {
        let gs = GateSet::universal();
        assert!(gs.contains("h"));
        assert!(gs.contains("ccx"));
        assert!(gs.contains("cswap"));
        assert!(!gs.contains("rzz"));
    }

    #[test]
    fn test_simulator_capabilities() {
        let caps = Capabilities::simulator(20);
        assert!(caps.is_simulator);
        assert_eq!(caps.num_qubits, 20);
        assert_eq!(caps.name, "simulator");
    }

    #[test]
    fn test_ibm_capabilities() {
        let caps = Capabilities::ibm("ibm_brisbane", 127);
        assert!(!caps.is_simulator);
        assert_eq!(caps.num_qubits, 127);
        assert!(caps.gate_set.contains("ccx"));
    }
}
