//! IBM Quantum Platform API client.
//!
//! This module implements the IBM Quantum Cloud REST API for:
//! - Authentication via IAM token exchange (new API key flow)
//! - Fetching backend configuration and status
//! - Submitting jobs (Qiskit Runtime sampler primitive)
//! - Polling job status and retrieving results
//!
//! Supports both the new IBM Cloud API (`quantum.cloud.ibm.com/api`) and the
//! legacy endpoint (`api.quantum-computing.ibm.com`) for backward compatibility.

// Allow dead code for API response fields that are deserialized but not yet used.
// These fields are part of the IBM Quantum API contract.
#![allow(dead_code)]

use reqwest::{Client, header};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

use crate::error::{IbmError, IbmResult};

/// Default IBM Quantum Cloud API endpoint (new).
pub const DEFAULT_ENDPOINT: &str = "https://quantum.cloud.ibm.com/api";

/// Legacy IBM Quantum API endpoint.
pub const LEGACY_ENDPOINT: &str = "https://api.quantum-computing.ibm.com";

/// IBM Cloud IAM token endpoint.
const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// IBM API version header value.
const IBM_API_VERSION: &str = "2026-02-01";

/// User-Agent sent with requests (Cloudflare blocks default reqwest UA).
const USER_AGENT: &str = "grani/0.4 (quantum-sdk)";

/// IBM Quantum API client.
pub struct IbmClient {
    /// HTTP client.
    client: Client,
    /// API endpoint URL.
    endpoint: String,
    /// Bearer token (either from IAM exchange or direct).
    token: String,
    /// Selected instance (hub/group/project) — legacy mode only.
    instance: Option<String>,
    /// Whether using the new Cloud API (vs legacy).
    cloud_api: bool,
}

impl fmt::Debug for IbmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("instance", &self.instance)
            .field("cloud_api", &self.cloud_api)
            .finish()
    }
}

/// IAM token response from `iam.cloud.ibm.com`.
#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl IbmClient {
    /// Create a new IBM Quantum client using the legacy direct-token mode.
    ///
    /// This connects to the old `api.quantum-computing.ibm.com` endpoint.
    /// For the new IBM Cloud API, use [`IbmClient::connect`] instead.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> IbmResult<Self> {
        let token = token.into();

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| IbmError::InvalidToken)?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
            instance: None,
            cloud_api: false,
        })
    }

    /// Create a new IBM Quantum client using the new IBM Cloud API key flow.
    ///
    /// Exchanges the API key for an IAM bearer token and configures the
    /// Service-CRN header required by the new `quantum.cloud.ibm.com/api`.
    pub async fn connect(api_key: &str, service_crn: &str) -> IbmResult<Self> {
        // Exchange API key for IAM bearer token
        let iam_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        let iam_response = iam_client
            .post(IAM_TOKEN_URL)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(format!(
                "grant_type=urn:ibm:params:oauth:grant-type:apikey&apikey={api_key}"
            ))
            .send()
            .await
            .map_err(|e| IbmError::IamTokenExchange(e.to_string()))?;

        if !iam_response.status().is_success() {
            let status = iam_response.status();
            let body = iam_response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            return Err(IbmError::IamTokenExchange(format!(
                "IAM returned {status}: {body}"
            )));
        }

        let iam_token: IamTokenResponse = iam_response.json().await.map_err(|e| {
            IbmError::IamTokenExchange(format!("failed to parse IAM response: {e}"))
        })?;

        let bearer_token = iam_token.access_token;

        // Build default headers for the new Cloud API
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {bearer_token}"))
                .map_err(|_| IbmError::InvalidToken)?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        // Service-CRN header — required on every request to the new API
        headers.insert(
            header::HeaderName::from_static("service-crn"),
            header::HeaderValue::from_str(service_crn)
                .map_err(|_| IbmError::InvalidParameter("invalid Service-CRN value".into()))?,
        );
        // IBM-API-Version header
        headers.insert(
            header::HeaderName::from_static("ibm-api-version"),
            header::HeaderValue::from_static(IBM_API_VERSION),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: bearer_token,
            instance: None,
            cloud_api: true,
        })
    }

    /// Set the instance (hub/group/project) for job submission (legacy mode).
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Whether this client uses the new Cloud API.
    pub fn is_cloud_api(&self) -> bool {
        self.cloud_api
    }

    /// Get details for a specific backend.
    ///
    /// On the new Cloud API, fetches `/configuration` and `/status` separately
    /// and merges into a single `BackendInfo`.
    pub async fn get_backend(&self, name: &str) -> IbmResult<BackendInfo> {
        if self.cloud_api {
            self.get_backend_cloud(name).await
        } else {
            self.get_backend_legacy(name).await
        }
    }

    /// Fetch backend info from the new Cloud API.
    async fn get_backend_cloud(&self, name: &str) -> IbmResult<BackendInfo> {
        // Fetch configuration
        let config_url = format!("{}/v1/backends/{}/configuration", self.endpoint, name);
        let config_response = self.client.get(&config_url).send().await?;

        if !config_response.status().is_success() {
            if config_response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(IbmError::BackendUnavailable(name.to_string()));
            }
            let body = config_response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            return Err(IbmError::ApiError {
                code: None,
                message: format!("backend configuration failed for {name}: {body}"),
            });
        }

        let config: BackendConfigResponse = config_response.json().await?;

        // Fetch status
        let status_url = format!("{}/v1/backends/{}/status", self.endpoint, name);
        let status_response = self.client.get(&status_url).send().await?;

        let status = if status_response.status().is_success() {
            let s: BackendStatusResponse = status_response.json().await?;
            BackendStatus {
                operational: s.state,
                status_msg: Some(s.status),
                pending_jobs: Some(u32::try_from(s.length_queue).unwrap_or(u32::MAX)),
            }
        } else {
            // If status fetch fails, assume operational (config succeeded)
            BackendStatus {
                operational: true,
                status_msg: None,
                pending_jobs: None,
            }
        };

        Ok(BackendInfo {
            name: config.backend_name,
            num_qubits: config.n_qubits,
            status,
            basis_gates: config.basis_gates,
            simulator: config.simulator.unwrap_or(false),
            max_shots: config.max_shots,
        })
    }

    /// Fetch backend info from the legacy API.
    async fn get_backend_legacy(&self, name: &str) -> IbmResult<BackendInfo> {
        let url = format!("{}/v1/backends/{}", self.endpoint, name);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(IbmError::BackendUnavailable(name.to_string()));
            }
            let error: ApiErrorResponse = response.json().await?;
            return Err(IbmError::ApiError {
                code: error.code,
                message: error.message,
            });
        }

        response.json().await.map_err(IbmError::from)
    }

    /// Submit a job using the Sampler primitive.
    ///
    /// Uses V2 PUB format for the Cloud API, V1 format for legacy.
    pub async fn submit_sampler_job(
        &self,
        backend: &str,
        circuits: Vec<String>,
        shots: u32,
    ) -> IbmResult<SubmitResponse> {
        let url = format!("{}/v1/jobs", self.endpoint);

        let body = if self.cloud_api {
            // V2 Sampler: PUBs format — each PUB is (circuit, params, shots)
            let pubs: Vec<serde_json::Value> = circuits
                .into_iter()
                .map(|c| serde_json::json!([c, {}, shots]))
                .collect();

            let mut params = serde_json::json!({
                "version": 2,
                "pubs": pubs
            });
            // V2 Sampler requires ISA circuits by default; optimization_level
            // 1 lets IBM handle basis translation and physical routing for
            // the stdgates circuits we emit.
            params["options"] = serde_json::json!({
                "optimization_level": 1
            });

            serde_json::json!({
                "program_id": "sampler",
                "backend": backend,
                "params": params
            })
        } else {
            // V1 Sampler: legacy format
            let mut request = serde_json::json!({
                "program_id": "sampler",
                "backend": backend,
                "params": {
                    "circuits": circuits,
                    "shots": shots
                }
            });
            if let Some(hub) = &self.instance {
                request["hub"] = serde_json::json!(hub);
            }
            request
        };

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            return Err(IbmError::ApiError {
                code: None,
                message: format!("job submission failed: {body}"),
            });
        }

        response.json().await.map_err(IbmError::from)
    }

    /// Get job status.
    pub async fn get_job_status(&self, job_id: &str) -> IbmResult<JobStatusResponse> {
        let url = format!("{}/v1/jobs/{}", self.endpoint, job_id);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(IbmError::JobNotFound(job_id.to_string()));
            }
            let error: ApiErrorResponse = response.json().await?;
            return Err(IbmError::ApiError {
                code: error.code,
                message: error.message,
            });
        }

        response.json().await.map_err(IbmError::from)
    }

    /// Get job results.
    pub async fn get_job_results(&self, job_id: &str) -> IbmResult<JobResultResponse> {
        let url = format!("{}/v1/jobs/{}/results", self.endpoint, job_id);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(IbmError::JobNotFound(job_id.to_string()));
            }
            let error: ApiErrorResponse = response.json().await?;
            return Err(IbmError::ApiError {
                code: error.code,
                message: error.message,
            });
        }

        response.json().await.map_err(IbmError::from)
    }

    /// Cancel a job.
    pub async fn cancel_job(&self, job_id: &str) -> IbmResult<()> {
        let url = format!("{}/v1/jobs/{}/cancel", self.endpoint, job_id);

        let response = self.client.post(&url).send().await?;

        if !response.status().is_success() {
            let error: ApiErrorResponse = response.json().await?;
            return Err(IbmError::ApiError {
                code: error.code,
                message: error.message,
            });
        }

        Ok(())
    }
}

// ============================================================================
// Response types
// ============================================================================

/// API error response.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    /// Error code.
    #[serde(default)]
    code: Option<String>,
    /// Error message.
    #[serde(default)]
    message: String,
}

/// New Cloud API: backend configuration response from `/backends/{name}/configuration`.
#[derive(Debug, Deserialize)]
struct BackendConfigResponse {
    /// Backend name.
    backend_name: String,
    /// Number of qubits.
    n_qubits: usize,
    /// Basis gates.
    #[serde(default)]
    basis_gates: Vec<String>,
    /// Whether this is a simulator.
    #[serde(default)]
    simulator: Option<bool>,
    /// Maximum number of shots.
    #[serde(default)]
    max_shots: Option<u32>,
}

/// New Cloud API: backend status response from `/backends/{name}/status`.
#[derive(Debug, Deserialize)]
struct BackendStatusResponse {
    /// Whether the backend is operational.
    state: bool,
    /// Status string (e.g., "active").
    #[serde(default)]
    status: String,
    /// Status message.
    #[serde(default)]
    message: String,
    /// Queue length.
    #[serde(default)]
    length_queue: u64,
}

/// Backend information.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendInfo {
    /// Backend name.
    pub name: String,
    /// Number of qubits.
    pub num_qubits: usize,
    /// Backend status.
    pub status: BackendStatus,
    /// Basis gates.
    #[serde(default)]
    pub basis_gates: Vec<String>,
    /// Whether this is a simulator.
    #[serde(default)]
    pub simulator: bool,
    /// Maximum number of shots.
    #[serde(default)]
    pub max_shots: Option<u32>,
}

/// Backend status.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendStatus {
    /// Whether the backend is operational.
    pub operational: bool,
    /// Status message.
    #[serde(default)]
    pub status_msg: Option<String>,
    /// Number of pending jobs.
    #[serde(default)]
    pub pending_jobs: Option<u32>,
}

/// Job submission response.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Job ID.
    pub id: String,
    /// Job status.
    #[serde(default)]
    pub status: String,
}

/// Job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    /// Job ID.
    pub id: String,
    /// Job status (top-level, may be mixed case on new API).
    pub status: String,
    /// Backend name.
    #[serde(default)]
    pub backend: Option<String>,
    /// Error information if failed (legacy API).
    #[serde(default)]
    pub error: Option<JobError>,
    /// State object with reason (new Cloud API).
    #[serde(default)]
    pub state: Option<JobState>,
}

/// Job error information (legacy API).
#[derive(Debug, Clone, Deserialize)]
pub struct JobError {
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Error message.
    pub message: String,
}

/// Job state with reason (new Cloud API).
#[derive(Debug, Clone, Deserialize)]
pub struct JobState {
    /// Status string.
    #[serde(default)]
    pub status: String,
    /// Reason for failure.
    #[serde(default)]
    pub reason: Option<String>,
    /// Reason code.
    #[serde(default)]
    pub reason_code: Option<u32>,
}

impl JobStatusResponse {
    /// Normalized uppercase status for comparison.
    fn normalized_status(&self) -> String {
        self.status.to_uppercase()
    }

    /// Check if job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.normalized_status().as_str(),
            "COMPLETED" | "FAILED" | "CANCELLED" | "ERROR"
        )
    }

    /// Check if job completed successfully.
    pub fn is_completed(&self) -> bool {
        self.normalized_status() == "COMPLETED"
    }

    /// Check if job failed.
    pub fn is_failed(&self) -> bool {
        matches!(self.normalized_status().as_str(), "FAILED" | "ERROR")
    }

    /// Check if job was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.normalized_status() == "CANCELLED"
    }

    /// Get the error/failure reason message.
    pub fn error_message(&self) -> Option<String> {
        // Try new API state.reason first
        if let Some(state) = &self.state {
            if let Some(reason) = &state.reason {
                return Some(reason.clone());
            }
        }
        // Fall back to legacy error.message
        self.error.as_ref().map(|e| e.message.clone())
    }
}

/// Job result response.
#[derive(Debug, Deserialize)]
pub struct JobResultResponse {
    /// Job ID (may be absent in V2 results endpoint).
    #[serde(default)]
    pub id: Option<String>,
    /// Results from sampler primitive.
    pub results: Vec<SamplerResult>,
}

/// Sampler result for one circuit.
#[derive(Debug, Deserialize)]
pub struct SamplerResult {
    /// V2 Sampler data: map of classical register names to sample data.
    #[serde(default)]
    pub data: Option<HashMap<String, ClassicalRegisterData>>,
    /// Quasi-probability distribution (outcome key -> probability) — V1 only.
    #[serde(default)]
    pub quasi_dists: Option<Vec<HashMap<String, f64>>>,
    /// Measurement counts (bitstring -> count) — V1 only.
    #[serde(default)]
    pub counts: Option<HashMap<String, u64>>,
    /// Metadata.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Classical register data from V2 Sampler results.
///
/// `samples` rows come in several shapes depending on the service build:
/// hex strings (`"0x3"`), fixed-width bit rows (`[0, 1, 1]`), one-element
/// integer rows (`[3]`), or bare integers (`3`). Normalization lives in
/// [`crate::decode`].
#[derive(Debug, Deserialize)]
pub struct ClassicalRegisterData {
    /// Raw per-shot measurement samples.
    pub samples: Vec<serde_json::Value>,
    /// Declared register width in bits, when the service reports it.
    #[serde(default)]
    pub num_bits: Option<usize>,
}
