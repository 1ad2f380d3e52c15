//! Simulator backend implementation.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use grani_hal::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, Capabilities, Counts,
    ExecutionResult, HalError, HalResult, Job, JobId, JobStatus, ValidationResult,
    result::to_bitstring,
};
use grani_ir::Circuit;

use crate::statevector::Statevector;

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

/// Local simulator backend.
///
/// Simulates circuits with a statevector and samples measurement outcomes
/// per shot. Jobs complete synchronously inside `submit`.
pub struct SimulatorBackend {
    /// Backend configuration.
    config: BackendConfig,
    /// Cached capabilities (sync introspection).
    capabilities: Capabilities,
    /// Active jobs.
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    /// Maximum number of qubits supported.
    max_qubits: u32,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(20)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            config: BackendConfig::new("simulator"),
            capabilities: Capabilities::simulator(max_qubits),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            max_qubits,
        }
    }

    /// Run simulation synchronously.
    #[instrument(skip(self, circuit))]
    fn run_simulation(&self, circuit: &Circuit, shots: u32) -> ExecutionResult {
        let start = Instant::now();

        let num_qubits = circuit.num_qubits();
        debug!("Starting simulation: {} qubits, {} shots", num_qubits, shots);

        // qubit → clbit wiring, applied to each sampled outcome.
        let measures: Vec<(usize, usize)> = circuit
            .instructions()
            .iter()
            .filter(|inst| inst.is_measure())
            .flat_map(|inst| {
                inst.qubits
                    .iter()
                    .zip(inst.clbits.iter())
                    .map(|(q, c)| (q.0 as usize, c.0 as usize))
            })
            .collect();

        let mut counts = Counts::new();

        for shot in 0..shots {
            let mut sv = Statevector::new(num_qubits);
            for inst in circuit.instructions() {
                sv.apply(inst);
            }

            let outcome = sv.sample();
            let bitstring = render_outcome(outcome, &measures, num_qubits, circuit.num_clbits());
            counts.insert(bitstring, 1);

            if shot > 0 && shot % 1000 == 0 {
                debug!("Completed {} shots", shot);
            }
        }

        let elapsed = start.elapsed();
        debug!("Simulation completed in {:?}", elapsed);

        ExecutionResult::new(counts, shots).with_execution_time(elapsed.as_millis() as u64)
    }
}

/// Render a sampled register index as a canonical bitstring.
///
/// With measurement wiring, classical bit `c` takes the sampled value of its
/// source qubit and the string reads `c[W-1] .. c[0]`; unmeasured clbits stay
/// 0. Without any measure instruction the whole quantum register is rendered
/// (qubit `n-1` leftmost).
fn render_outcome(
    outcome: usize,
    measures: &[(usize, usize)],
    num_qubits: usize,
    num_clbits: usize,
) -> String {
    if measures.is_empty() || num_clbits == 0 {
        return to_bitstring(outcome as u64, num_qubits);
    }

    let mut word: u64 = 0;
    for &(qubit, clbit) in measures {
        let bit = (outcome >> qubit) & 1;
        if bit != 0 {
            word |= 1 << clbit;
        } else {
            word &= !(1 << clbit);
        }
    }
    to_bitstring(word, num_clbits)
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        let mut reasons = Vec::new();

        if circuit.num_qubits() > self.max_qubits as usize {
            reasons.push(format!(
                "Circuit requires {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                self.max_qubits
            ));
        }

        for inst in circuit.instructions() {
            if let Some(gate) = inst.as_gate() {
                if !self.capabilities.gate_set.contains(gate.name()) {
                    reasons.push(format!("Unsupported gate: {}", gate.name()));
                    break;
                }
            }
        }

        if reasons.is_empty() {
            Ok(ValidationResult::Valid)
        } else {
            Ok(ValidationResult::Invalid { reasons })
        }
    }

    #[instrument(skip(self, circuit))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        if circuit.num_qubits() > self.max_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                self.max_qubits
            )));
        }

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let job = Job::new(job_id.clone(), shots).with_backend("simulator");

        {
            let mut jobs = self
                .jobs
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            jobs.insert(job_id.0.clone(), SimJob { job, result: None });
        }

        debug!("Submitted job: {}", job_id);

        // Run immediately; the job is Completed by the time submit returns.
        let result = self.run_simulation(circuit, shots);

        {
            let mut jobs = self
                .jobs
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(sim_job) = jobs.get_mut(&job_id.0) {
                sim_job.result = Some(result);
                sim_job.job = sim_job.job.clone().with_status(JobStatus::Completed);
            }
        }

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        jobs.get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        jobs.get(&job_id.0)
            .and_then(|j| j.result.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(sim_job) = jobs.get_mut(&job_id.0) {
            sim_job.job = sim_job.job.clone().with_status(JobStatus::Cancelled);
            Ok(())
        } else {
            Err(HalError::JobNotFound(job_id.0.clone()))
        }
    }
}

impl BackendFactory for SimulatorBackend {
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let max_qubits = config
            .extra
            .get("max_qubits")
            .and_then(serde_json::value::Value::as_u64)
            .map_or(20, |v| v as u32);

        Ok(Self {
            capabilities: Capabilities::simulator(max_qubits),
            config,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            max_qubits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grani_ir::{search, sort};

    #[tokio::test]
    async fn test_simulator_capabilities() {
        let backend = SimulatorBackend::new();
        let caps = backend.capabilities();

        assert!(caps.is_simulator);
        assert_eq!(caps.num_qubits, 20);
    }

    #[tokio::test]
    async fn test_simulator_bell_state() {
        let backend = SimulatorBackend::new();

        let circuit = Circuit::bell().unwrap();
        let job_id = backend.submit(&circuit, 1000).await.unwrap();

        let status = backend.status(&job_id).await.unwrap();
        assert!(status.is_success());

        let result = backend.result(&job_id).await.unwrap();
        assert_eq!(result.shots, 1000);

        // Bell state should produce only 00 and 11
        let counts = &result.counts;
        assert!(counts.get("00") + counts.get("11") == 1000);
        assert!(counts.get("01") + counts.get("10") == 0);
    }

    #[tokio::test]
    async fn test_simulator_ghz_state() {
        let backend = SimulatorBackend::new();

        let circuit = Circuit::ghz(3).unwrap();
        let job_id = backend.submit(&circuit, 1000).await.unwrap();

        let result = backend.result(&job_id).await.unwrap();

        // GHZ state should produce only 000 and 111
        let counts = &result.counts;
        assert!(counts.get("000") + counts.get("111") == 1000);
    }

    #[tokio::test]
    async fn test_simulator_too_many_qubits() {
        let backend = SimulatorBackend::with_max_qubits(5);

        let circuit = Circuit::with_size("test", 10, 0);
        let result = backend.submit(&circuit, 100).await;

        assert!(matches!(result, Err(HalError::CircuitTooLarge(_))));
    }

    #[tokio::test]
    async fn test_two_pass_bubbles_ones_rightward() {
        let backend = SimulatorBackend::new();

        // All operations are classical on basis states; every shot gives
        // the same register readout.
        for (input, expected) in [
            ("000", "000"),
            ("001", "001"),
            ("010", "011"),
            ("011", "011"),
            ("100", "111"),
            ("101", "111"),
            ("110", "111"),
            ("111", "111"),
        ] {
            let circuit = sort::two_pass(input).unwrap();
            let job_id = backend.submit(&circuit, 64).await.unwrap();
            let result = backend.wait(&job_id).await.unwrap();
            assert_eq!(result.counts.get(expected), 64, "input {input}");
        }
    }

    #[tokio::test]
    async fn test_three_pass_sort_orders_register() {
        let backend = SimulatorBackend::new();

        let circuit = sort::three_pass("101").unwrap();
        let job_id = backend.submit(&circuit, 256).await.unwrap();
        let result = backend.wait(&job_id).await.unwrap();

        // 1,0,1 bubble-sorts to 0,1,1 read left to right.
        assert_eq!(result.counts.get("011"), 256);
    }

    #[tokio::test]
    async fn test_three_pass_sort_all_inputs() {
        let backend = SimulatorBackend::new();

        for (input, expected) in [
            ("000", "000"),
            ("001", "001"),
            ("010", "001"),
            ("011", "011"),
            ("100", "001"),
            ("101", "011"),
            ("110", "011"),
            ("111", "111"),
        ] {
            let circuit = sort::three_pass(input).unwrap();
            let job_id = backend.submit(&circuit, 64).await.unwrap();
            let result = backend.wait(&job_id).await.unwrap();
            assert_eq!(result.counts.get(expected), 64, "input {input}");
        }
    }

    #[tokio::test]
    async fn test_grover_amplifies_target() {
        let backend = SimulatorBackend::new();

        let circuit = search::grover_eraser("011", 2).unwrap();
        let job_id = backend.submit(&circuit, 1024).await.unwrap();
        let result = backend.wait(&job_id).await.unwrap();

        // Two rounds on 3 qubits put ~94.5% of the amplitude on the target;
        // 3/4 of the shots is a comfortable statistical floor.
        assert!(result.counts.get("011") > 768);

        // Every outcome is a 3-bit string.
        for (bits, _) in result.counts.iter() {
            assert_eq!(bits.len(), 3);
        }
    }

    #[tokio::test]
    async fn test_validate_rejects_oversized_circuit() {
        let backend = SimulatorBackend::with_max_qubits(2);
        let circuit = Circuit::with_size("big", 4, 0);

        let validation = backend.validate(&circuit).await.unwrap();
        assert!(!validation.is_valid());
    }

    #[tokio::test]
    async fn test_cancel_unknown_job() {
        let backend = SimulatorBackend::new();
        let result = backend.cancel(&JobId::new("nope")).await;
        assert!(matches!(result, Err(HalError::JobNotFound(_))));
    }

    #[test]
    fn test_render_outcome_big_endian_wiring() {
        // Sort wiring: q0→c2, q1→c1, q2→c0. Outcome 0b011 (q0=1, q1=1, q2=0)
        // reads "110".
        let measures = [(0, 2), (1, 1), (2, 0)];
        assert_eq!(render_outcome(0b011, &measures, 4, 3), "110");
    }

    #[test]
    fn test_render_outcome_without_measures() {
        assert_eq!(render_outcome(0b101, &[], 3, 0), "101");
    }
}
