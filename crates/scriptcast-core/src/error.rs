//! Error types module
//!
//! Three layers, from the wire up:
//!
//! - [`GatewayError`]: what a single backend call can produce.
//! - [`UploadError`]: the upload coordinator's result taxonomy.
//! - [`WorkflowError`]: fatal, run-level failures of the generation workflow.
//!   Per-batch failures are never reported through it; they land in the run summary.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a busy workflow
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Self-description of an error for presentation layers.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "NETWORK_FAILURE")
    fn error_code(&self) -> &'static str;

    /// Whether repeating the same request may succeed
    fn is_recoverable(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx response whose body carried `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Everything except a structured backend rejection.
    pub fn is_transport(&self) -> bool {
        !matches!(self, GatewayError::Rejected(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file format '{extension}' (allowed: {allowed:?})")]
    UnsupportedFormat {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Backend rejected upload: {0}")]
    BackendRejected(String),
}

impl From<GatewayError> for UploadError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected(message) => UploadError::BackendRejected(message),
            other => UploadError::NetworkFailure(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("A generation run is already in progress")]
    AlreadyRunning,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Backend call failed: {0}")]
    Gateway(#[from] GatewayError),
}

impl ErrorMetadata for GatewayError {
    fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Transport(_) => "TRANSPORT_ERROR",
            GatewayError::Timeout(_) => "TIMEOUT",
            GatewayError::Status { .. } => "HTTP_STATUS_ERROR",
            GatewayError::Rejected(_) => "BACKEND_REJECTED",
            GatewayError::Decode(_) => "DECODE_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            GatewayError::Transport(_) | GatewayError::Timeout(_) => true,
            GatewayError::Status { status, .. } => *status >= 500,
            GatewayError::Rejected(_) | GatewayError::Decode(_) => false,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            GatewayError::Rejected(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            UploadError::NetworkFailure(_) => "NETWORK_FAILURE",
            UploadError::BackendRejected(_) => "BACKEND_REJECTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, UploadError::NetworkFailure(_))
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::UnsupportedFormat { .. } => LogLevel::Debug,
            UploadError::NetworkFailure(_) => LogLevel::Error,
            UploadError::BackendRejected(_) => LogLevel::Warn,
        }
    }
}

impl ErrorMetadata for WorkflowError {
    fn error_code(&self) -> &'static str {
        match self {
            WorkflowError::AlreadyRunning => "ALREADY_RUNNING",
            WorkflowError::InvalidParameters(_) => "INVALID_PARAMETERS",
            WorkflowError::Upload(inner) => inner.error_code(),
            WorkflowError::Gateway(inner) => inner.error_code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            WorkflowError::AlreadyRunning => true,
            WorkflowError::InvalidParameters(_) => false,
            WorkflowError::Upload(inner) => inner.is_recoverable(),
            WorkflowError::Gateway(inner) => inner.is_recoverable(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            WorkflowError::AlreadyRunning => LogLevel::Warn,
            WorkflowError::InvalidParameters(_) => LogLevel::Debug,
            WorkflowError::Upload(inner) => inner.log_level(),
            WorkflowError::Gateway(inner) => inner.log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_rejection_maps_to_backend_rejected() {
        let err = UploadError::from(GatewayError::Rejected("bad sheet".to_string()));
        assert_eq!(err, UploadError::BackendRejected("bad sheet".to_string()));
        assert_eq!(err.error_code(), "BACKEND_REJECTED");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_transport_errors_map_to_network_failure() {
        for err in [
            GatewayError::Transport("connection refused".to_string()),
            GatewayError::Timeout("10s".to_string()),
            GatewayError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            },
            GatewayError::Decode("expected value".to_string()),
        ] {
            assert!(err.is_transport());
            assert!(matches!(
                UploadError::from(err),
                UploadError::NetworkFailure(_)
            ));
        }
    }

    #[test]
    fn test_status_recoverability() {
        let server = GatewayError::Status {
            status: 503,
            body: String::new(),
        };
        let client = GatewayError::Status {
            status: 404,
            body: String::new(),
        };
        assert!(server.is_recoverable());
        assert!(!client.is_recoverable());
    }

    #[test]
    fn test_workflow_error_delegates_metadata() {
        let err = WorkflowError::from(UploadError::UnsupportedFormat {
            extension: ".pdf".to_string(),
            allowed: vec![".csv".to_string()],
        });
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert!(err.to_string().contains(".pdf"));

        assert_eq!(WorkflowError::AlreadyRunning.error_code(), "ALREADY_RUNNING");
        assert_eq!(WorkflowError::AlreadyRunning.log_level(), LogLevel::Warn);
    }
}
