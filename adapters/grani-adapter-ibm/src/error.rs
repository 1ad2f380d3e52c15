//! Error types for the IBM Quantum adapter.

use thiserror::Error;

use crate::decode::DecodeError;

/// Result type for IBM operations.
pub type IbmResult<T> = Result<T, IbmError>;

/// Errors that can occur when using IBM Quantum.
#[derive(Debug, Error)]
pub enum IbmError {
    /// Missing API token.
    #[error(
        "IBM Quantum API token not found. Set IBM_API_KEY or IBM_QUANTUM_TOKEN environment variable."
    )]
    MissingToken,

    /// Invalid API token.
    #[error("Invalid IBM Quantum API token")]
    InvalidToken,

    /// IAM token exchange failed.
    #[error("IAM token exchange failed: {0}")]
    IamTokenExchange(String),

    /// Missing service CRN.
    #[error("IBM_SERVICE_CRN environment variable is required when using IBM_API_KEY")]
    MissingServiceCrn,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error.
    #[error("IBM Quantum API error: {message}")]
    ApiError {
        /// Error code from API.
        code: Option<String>,
        /// Error message.
        message: String,
    },

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Job failed.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job was cancelled.
    #[error("Job was cancelled: {0}")]
    JobCancelled(String),

    /// Backend not available.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// Result payload could not be normalized into counts.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Circuit too large for backend.
    #[error("Circuit requires {required} qubits but backend only has {available}")]
    TooManyQubits {
        /// Qubits needed.
        required: usize,
        /// Qubits available.
        available: usize,
    },

    /// Invalid parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<IbmError> for grani_hal::HalError {
    fn from(e: IbmError) -> Self {
        match e {
            IbmError::MissingToken
            | IbmError::InvalidToken
            | IbmError::IamTokenExchange(_)
            | IbmError::MissingServiceCrn => {
                grani_hal::HalError::AuthenticationFailed(e.to_string())
            }
            IbmError::JobNotFound(id) => grani_hal::HalError::JobNotFound(id),
            IbmError::JobFailed(msg) => grani_hal::HalError::JobFailed(msg),
            IbmError::JobCancelled(_) => grani_hal::HalError::JobCancelled,
            IbmError::BackendUnavailable(msg) => grani_hal::HalError::BackendUnavailable(msg),
            IbmError::Decode(e) => grani_hal::HalError::MalformedResult(e.to_string()),
            IbmError::TooManyQubits {
                required,
                available,
            } => grani_hal::HalError::CircuitTooLarge(format!(
                "Circuit requires {required} qubits but backend only has {available}"
            )),
            _ => grani_hal::HalError::Backend(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_display() {
        let err = IbmError::MissingToken;
        assert!(err.to_string().contains("IBM_API_KEY"));
    }

    #[test]
    fn test_api_error_display() {
        let err = IbmError::ApiError {
            code: Some("ERR_401".into()),
            message: "Unauthorized".into(),
        };
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[test]
    fn test_too_many_qubits_display() {
        let err = IbmError::TooManyQubits {
            required: 50,
            available: 27,
        };
        let msg = err.to_string();
        assert!(msg.contains("50"));
        assert!(msg.contains("27"));
    }

    #[test]
    fn test_missing_token_to_hal_auth_failed() {
        let hal: grani_hal::HalError = IbmError::MissingToken.into();
        assert!(matches!(hal, grani_hal::HalError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_job_not_found_to_hal() {
        let hal: grani_hal::HalError = IbmError::JobNotFound("j1".into()).into();
        assert!(matches!(hal, grani_hal::HalError::JobNotFound(id) if id == "j1"));
    }

    #[test]
    fn test_job_cancelled_to_hal() {
        let hal: grani_hal::HalError = IbmError::JobCancelled("user".into()).into();
        assert!(matches!(hal, grani_hal::HalError::JobCancelled));
    }

    #[test]
    fn test_decode_error_to_hal_malformed_result() {
        let hal: grani_hal::HalError = IbmError::Decode(DecodeError::UnknownFormat).into();
        assert!(matches!(hal, grani_hal::HalError::MalformedResult(_)));
    }

    #[test]
    fn test_api_error_to_hal_backend() {
        let hal: grani_hal::HalError = IbmError::ApiError {
            code: None,
            message: "server error".into(),
        }
        .into();
        assert!(matches!(hal, grani_hal::HalError::Backend(_)));
    }
}
