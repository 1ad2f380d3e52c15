//! IBM Quantum backend implementation.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use grani_hal::{
    Backend, BackendAvailability, BackendConfig, Capabilities, ExecutionResult, HalError,
    HalResult, JobId, JobStatus, ValidationResult,
};
use grani_ir::Circuit;

use crate::api::{BackendInfo, IbmClient, JobStatusResponse, LEGACY_ENDPOINT, SamplerResult};
use crate::decode::{self, DecodeError, KeyPolicy};
use crate::error::{IbmError, IbmResult};
use crate::qasm;

/// Default IBM Quantum backend.
const DEFAULT_BACKEND: &str = "ibm_brisbane";

/// How long to cache backend info before refreshing from the API.
const BACKEND_INFO_TTL: Duration = Duration::from_secs(5 * 60);

/// Submission details recorded per job and needed to decode its results.
#[derive(Debug, Clone, Copy)]
struct SubmittedJob {
    /// Classical register width of the submitted circuit.
    width: usize,
    /// Requested shots.
    shots: u32,
}

/// IBM Quantum backend adapter.
pub struct IbmBackend {
    /// API client.
    client: Arc<IbmClient>,
    /// Target backend name.
    target: String,
    /// Cached capabilities (sync introspection).
    capabilities: Capabilities,
    /// Cached backend info with fetch timestamp for TTL-based refresh.
    backend_info: Arc<RwLock<Option<(BackendInfo, Instant)>>>,
    /// Width/shots recorded at submission, keyed by job id.
    submitted: Mutex<FxHashMap<String, SubmittedJob>>,
    /// How to treat unrecognizable quasi-distribution keys.
    key_policy: KeyPolicy,
}

impl IbmBackend {
    /// Create a new IBM backend with default settings (legacy token mode).
    ///
    /// Reads the API token from the `IBM_QUANTUM_TOKEN` environment variable.
    /// For the new IBM Cloud API, use [`IbmBackend::connect`] instead.
    pub fn new() -> IbmResult<Self> {
        Self::with_target(DEFAULT_BACKEND)
    }

    /// Create a backend targeting a specific IBM Quantum device (legacy
    /// token mode).
    pub fn with_target(target: impl Into<String>) -> IbmResult<Self> {
        let token = std::env::var("IBM_QUANTUM_TOKEN").map_err(|_| IbmError::MissingToken)?;

        let client = IbmClient::new(LEGACY_ENDPOINT, &token)?;
        let target = target.into();

        Ok(Self {
            client: Arc::new(client),
            capabilities: Capabilities::ibm(&target, 127),
            target,
            backend_info: Arc::new(RwLock::new(None)),
            submitted: Mutex::new(FxHashMap::default()),
            key_policy: KeyPolicy::default(),
        })
    }

    /// Connect to an IBM Quantum backend using the new Cloud API.
    ///
    /// Reads `IBM_API_KEY` and `IBM_SERVICE_CRN` from environment. If
    /// `IBM_API_KEY` is not set, falls back to `IBM_QUANTUM_TOKEN` with the
    /// legacy endpoint.
    pub async fn connect(target: impl Into<String>) -> IbmResult<Self> {
        let target = target.into();

        // Try new Cloud API first (IBM_API_KEY + IBM_SERVICE_CRN)
        if let Ok(api_key) = std::env::var("IBM_API_KEY") {
            let service_crn =
                std::env::var("IBM_SERVICE_CRN").map_err(|_| IbmError::MissingServiceCrn)?;

            tracing::info!("connecting to IBM Cloud API (IAM key exchange)");
            let client = IbmClient::connect(&api_key, &service_crn).await?;

            return Ok(Self {
                client: Arc::new(client),
                capabilities: Capabilities::ibm(&target, 133),
                target,
                backend_info: Arc::new(RwLock::new(None)),
                submitted: Mutex::new(FxHashMap::default()),
                key_policy: KeyPolicy::default(),
            });
        }

        // Fall back to legacy direct-token mode
        if std::env::var("IBM_QUANTUM_TOKEN").is_ok() {
            tracing::info!("falling back to legacy IBM Quantum token");
            return Self::with_target(target);
        }

        Err(IbmError::MissingToken)
    }

    /// Create a backend with explicit configuration.
    pub fn with_config(config: BackendConfig) -> IbmResult<Self> {
        let endpoint = config.endpoint.as_deref().unwrap_or(LEGACY_ENDPOINT);

        let token = config.token.as_ref().ok_or(IbmError::MissingToken)?;

        let target = config
            .extra
            .get("backend")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_BACKEND);

        let mut client = IbmClient::new(endpoint, token)?;

        // Set instance if provided
        if let Some(instance) = config.extra.get("instance").and_then(|v| v.as_str()) {
            client = client.with_instance(instance);
        }

        let key_policy = if config
            .extra
            .get("strict_keys")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
        {
            KeyPolicy::Strict
        } else {
            KeyPolicy::Lenient
        };

        Ok(Self {
            client: Arc::new(client),
            capabilities: Capabilities::ibm(target, 127),
            target: target.to_string(),
            backend_info: Arc::new(RwLock::new(None)),
            submitted: Mutex::new(FxHashMap::default()),
            key_policy,
        })
    }

    /// Set the quasi-distribution key policy.
    pub fn with_key_policy(mut self, policy: KeyPolicy) -> Self {
        self.key_policy = policy;
        self
    }

    /// Get the target backend name.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Get backend information, fetching from API if not cached or stale.
    async fn get_backend_info(&self) -> IbmResult<BackendInfo> {
        // Check cache first; refresh if older than TTL.
        {
            let cached = self.backend_info.read().await;
            if let Some((ref info, fetched_at)) = *cached {
                if fetched_at.elapsed() < BACKEND_INFO_TTL {
                    return Ok(info.clone());
                }
            }
        }

        // Fetch from API
        let info = self.client.get_backend(&self.target).await?;

        // Cache it with current timestamp
        {
            let mut cached = self.backend_info.write().await;
            *cached = Some((info.clone(), Instant::now()));
        }

        Ok(info)
    }

    fn record_submission(&self, job_id: &str, width: usize, shots: u32) {
        let mut submitted = self
            .submitted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        submitted.insert(job_id.to_string(), SubmittedJob { width, shots });
    }

    fn recorded_submission(&self, job_id: &str) -> Option<SubmittedJob> {
        let submitted = self
            .submitted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        submitted.get(job_id).copied()
    }
}

/// Width fallback for jobs submitted outside this process: fixed-width rows
/// and declared register widths pin it, otherwise the largest observed value
/// decides.
fn fallback_width(sampler: &SamplerResult) -> usize {
    if let Some(data) = &sampler.data {
        return decode::infer_bit_width(data);
    }

    let keys: Vec<&String> = if let Some(counts) = &sampler.counts {
        counts.keys().collect()
    } else if let Some(dists) = &sampler.quasi_dists {
        dists.first().map(|d| d.keys().collect()).unwrap_or_default()
    } else {
        Vec::new()
    };

    let mut max_value: u64 = 0;
    for key in keys {
        if !key.is_empty() && key.bytes().all(|b| b == b'0' || b == b'1') {
            // A binary key pins the width directly.
            return key.len();
        }
        if let Some(hex) = key.strip_prefix("0x") {
            if let Ok(value) = u64::from_str_radix(hex, 16) {
                max_value = max_value.max(value);
            }
        }
    }

    if max_value == 0 {
        1
    } else {
        64 - max_value.leading_zeros() as usize
    }
}

/// Map an API status response onto the HAL job state machine.
fn map_status(status: &JobStatusResponse) -> JobStatus {
    match status.status.to_uppercase().as_str() {
        "QUEUED" => JobStatus::Queued,
        "VALIDATING" | "RUNNING" => JobStatus::Running,
        "COMPLETED" => JobStatus::Completed,
        "FAILED" | "ERROR" => {
            let msg = status
                .error_message()
                .unwrap_or_else(|| "Unknown error".to_string());
            JobStatus::Failed(msg)
        }
        "CANCELLED" => JobStatus::Cancelled,
        _ => JobStatus::Running, // Treat unknown as running
    }
}

#[async_trait]
impl Backend for IbmBackend {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ibm"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        match self.get_backend_info().await {
            Ok(info) => {
                if info.status.operational {
                    Ok(BackendAvailability {
                        is_available: true,
                        queue_depth: info.status.pending_jobs,
                        status_message: info.status.status_msg,
                    })
                } else {
                    Ok(BackendAvailability::unavailable(
                        info.status
                            .status_msg
                            .unwrap_or_else(|| "backend offline".to_string()),
                    ))
                }
            }
            Err(e) => {
                tracing::warn!("IBM backend availability check failed: {e}");
                Ok(BackendAvailability::unavailable("failed to query backend"))
            }
        }
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        let caps = self.capabilities();
        let mut reasons = Vec::new();

        if circuit.num_qubits() > caps.num_qubits as usize {
            reasons.push(format!(
                "Circuit requires {} qubits but backend only has {}",
                circuit.num_qubits(),
                caps.num_qubits
            ));
        }

        for inst in circuit.instructions() {
            if let Some(gate) = inst.as_gate() {
                if !caps.gate_set.contains(gate.name()) {
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

    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        // Check qubit count against the live device
        let info = self
            .get_backend_info()
            .await
            .map_err(|e| HalError::Backend(e.to_string()))?;

        if circuit.num_qubits() > info.num_qubits {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit requires {} qubits but backend only has {}",
                circuit.num_qubits(),
                info.num_qubits
            )));
        }

        if !info.status.operational {
            return Err(HalError::BackendUnavailable(
                info.status
                    .status_msg
                    .unwrap_or_else(|| "Backend offline".to_string()),
            ));
        }

        let qasm = qasm::emit(circuit);

        let response = self
            .client
            .submit_sampler_job(&self.target, vec![qasm], shots)
            .await
            .map_err(|e| HalError::SubmissionFailed(e.to_string()))?;

        // Remember the measured register width so results decode at the
        // circuit's width, not the device's.
        let width = if circuit.num_clbits() > 0 {
            circuit.num_clbits()
        } else {
            circuit.num_qubits()
        };
        self.record_submission(&response.id, width, shots);

        Ok(JobId(response.id))
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let status = self
            .client
            .get_job_status(&job_id.0)
            .await
            .map_err(|e| match e {
                IbmError::JobNotFound(id) => HalError::JobNotFound(id),
                other => HalError::Backend(other.to_string()),
            })?;

        Ok(map_status(&status))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        // First check job status
        let status = self
            .client
            .get_job_status(&job_id.0)
            .await
            .map_err(|e| HalError::Backend(e.to_string()))?;

        if !status.is_completed() {
            if status.is_failed() {
                let msg = status
                    .error_message()
                    .unwrap_or_else(|| "Job failed".to_string());
                return Err(HalError::JobFailed(msg));
            }
            if status.is_cancelled() {
                return Err(HalError::JobCancelled);
            }
            return Err(HalError::Backend(format!(
                "Job {} not yet completed",
                job_id.0
            )));
        }

        // Get results
        let results = self
            .client
            .get_job_results(&job_id.0)
            .await
            .map_err(|e| HalError::Backend(e.to_string()))?;

        let sampler = results
            .results
            .first()
            .ok_or_else(|| HalError::from(IbmError::Decode(DecodeError::EmptyResults)))?;

        let (width, shots) = match self.recorded_submission(&job_id.0) {
            Some(job) => (job.width, job.shots),
            // Job from another process: infer the width from the payload and
            // assume the service default shot count for quasi conversion.
            None => (fallback_width(sampler), 1024),
        };

        let counts = decode::decode_counts(sampler, width, shots, self.key_policy)
            .map_err(|e| HalError::from(IbmError::Decode(e)))?;

        let total_shots = u32::try_from(counts.total_shots()).unwrap_or(u32::MAX);
        Ok(ExecutionResult::new(counts, total_shots))
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.client
            .cancel_job(&job_id.0)
            .await
            .map_err(|e| HalError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_backend_config() {
        // Just test that config parsing works (without token)
        let config = BackendConfig::new("ibm")
            .with_endpoint("https://test.example.com")
            .with_token("test-token");

        assert_eq!(config.name, "ibm");
        assert_eq!(
            config.endpoint,
            Some("https://test.example.com".to_string())
        );
    }

    #[test]
    fn test_with_config_reads_strict_keys() {
        let config = BackendConfig::new("ibm")
            .with_token("test-token")
            .with_extra("backend", serde_json::json!("ibm_brisbane"))
            .with_extra("strict_keys", serde_json::json!(true));

        let backend = IbmBackend::with_config(config).unwrap();
        assert_eq!(backend.key_policy, KeyPolicy::Strict);
        assert_eq!(backend.target(), "ibm_brisbane");
    }

    #[test]
    fn test_with_config_requires_token() {
        let config = BackendConfig::new("ibm");
        assert!(matches!(
            IbmBackend::with_config(config),
            Err(IbmError::MissingToken)
        ));
    }

    #[test]
    fn test_map_status() {
        let resp = |status: &str| JobStatusResponse {
            id: "j".into(),
            status: status.into(),
            backend: None,
            error: None,
            state: None,
        };

        assert_eq!(map_status(&resp("QUEUED")), JobStatus::Queued);
        assert_eq!(map_status(&resp("Running")), JobStatus::Running);
        assert_eq!(map_status(&resp("VALIDATING")), JobStatus::Running);
        assert_eq!(map_status(&resp("completed")), JobStatus::Completed);
        assert_eq!(map_status(&resp("CANCELLED")), JobStatus::Cancelled);
        assert!(matches!(map_status(&resp("FAILED")), JobStatus::Failed(_)));
        assert_eq!(map_status(&resp("SOMETHING_NEW")), JobStatus::Running);
    }

    #[test]
    fn test_fallback_width_from_binary_keys() {
        let sampler = SamplerResult {
            data: None,
            quasi_dists: Some(vec![HashMap::from([("0110".to_string(), 1.0)])]),
            counts: None,
            metadata: None,
        };
        assert_eq!(fallback_width(&sampler), 4);
    }

    #[test]
    fn test_fallback_width_from_hex_counts() {
        let sampler = SamplerResult {
            data: None,
            quasi_dists: None,
            counts: Some(HashMap::from([
                ("0x0".to_string(), 3),
                ("0x5".to_string(), 7),
            ])),
            metadata: None,
        };
        assert_eq!(fallback_width(&sampler), 3);
    }
}
