//! Error types for the client.
//!
//! Errors are grouped into kinds so callers can branch without matching every
//! variant:
//!
//! | Kind | Variants | Recovery |
//! |------|----------|----------|
//! | **Authentication** | `Authentication` | Log in again |
//! | **Submission** | `Submission`, `Rejected` | Fix the request |
//! | **Job** | `JobFailed`, `JobNotFinished`, `JobCancelled` | Resubmit or wait |
//! | **Timeout** | `Timeout`, `Interrupted` | Wait longer |
//! | **Transport** | `Transport`, `Server` | Retry |
//! | **Configuration** | `Configuration` | Fix configuration |
//! | **Result** | `BitstringLength`, `InvalidBitstring`, `IncompleteObservable`, `InvalidResult`, `Serialization` | Fix the query |
//!
//! `Execution` is produced only by [`QuantumClient::run`](crate::QuantumClient::run)
//! and reports the kind of the failure it wraps.

use std::time::Duration;

use thiserror::Error;

use crate::job::{JobId, JobStatus};
use crate::transport::TransportError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    Submission,
    Job,
    Timeout,
    Transport,
    Configuration,
    Result,
}

/// Errors that can occur when talking to the quantum computing service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Missing, invalid or expired credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The creation request could not be delivered.
    #[error("Job submission failed: {message}")]
    Submission {
        message: String,
        #[source]
        source: Option<Box<ClientError>>,
    },

    /// The service rejected the request (4xx).
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The service reports that the job failed.
    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: JobId, message: String },

    /// Results were requested for a job that has not completed.
    #[error("Job {job_id} is not finished (status: {status})")]
    JobNotFinished { job_id: JobId, status: JobStatus },

    /// The job was cancelled before it completed.
    #[error("Job {job_id} was cancelled")]
    JobCancelled { job_id: JobId },

    /// The local wait budget was exhausted.
    #[error("Timeout waiting for job {job_id} after {:.1}s", .elapsed.as_secs_f64())]
    Timeout {
        job_id: JobId,
        elapsed: Duration,
        last_error: Option<String>,
    },

    /// The wait was interrupted through its cancel flag.
    #[error("Wait for job {job_id} was interrupted")]
    Interrupted { job_id: JobId },

    /// Network or connection failure.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service failed internally (5xx).
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Invalid client-side configuration or arguments.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A bitstring does not have the register width of the result.
    #[error("Bitstring '{bitstring}' has length {found}, expected {expected}")]
    BitstringLength {
        bitstring: String,
        expected: usize,
        found: usize,
    },

    /// A bitstring contains characters other than `0` and `1`.
    #[error("Invalid bitstring '{0}': only '0' and '1' are allowed")]
    InvalidBitstring(String),

    /// The observable has no coefficient for an outcome present in the result.
    #[error("Observable has no coefficient for observed bitstring '{0}'")]
    IncompleteObservable(String),

    /// The result payload returned by the service is malformed.
    #[error("Invalid result payload: {0}")]
    InvalidResult(String),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `run()` could not produce a result; `source` is the reason.
    #[error("Execution of job {job_id} failed: {source}")]
    Execution {
        job_id: JobId,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Submission { .. } | Self::Rejected { .. } => ErrorKind::Submission,
            Self::JobFailed { .. } | Self::JobNotFinished { .. } | Self::JobCancelled { .. } => {
                ErrorKind::Job
            }
            Self::Timeout { .. } | Self::Interrupted { .. } => ErrorKind::Timeout,
            Self::Transport(_) | Self::Server { .. } => ErrorKind::Transport,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::BitstringLength { .. }
            | Self::InvalidBitstring(_)
            | Self::IncompleteObservable(_)
            | Self::InvalidResult(_)
            | Self::Serialization(_) => ErrorKind::Result,
            Self::Execution { source, .. } => source.kind(),
        }
    }

    /// Returns `true` if the operation may succeed when simply repeated.
    ///
    /// The polling loop absorbs exactly these errors.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { .. })
    }

    /// The error wrapped by `Execution`, or `self`.
    pub fn root(&self) -> &ClientError {
        match self {
            Self::Execution { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            ClientError::Authentication("x".into()).kind(),
            ErrorKind::Authentication
        );
        assert_eq!(
            ClientError::Rejected {
                status: 400,
                message: "unknown backend".into()
            }
            .kind(),
            ErrorKind::Submission
        );
        assert_eq!(
            ClientError::Configuration("bad".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ClientError::IncompleteObservable("01".into()).kind(),
            ErrorKind::Result
        );
    }

    #[test]
    fn test_transient_errors() {
        assert!(ClientError::Transport(TransportError::Connection("reset".into())).is_transient());
        assert!(
            ClientError::Server {
                status: 503,
                message: "busy".into()
            }
            .is_transient()
        );
        assert!(!ClientError::Authentication("expired".into()).is_transient());
        assert!(
            !ClientError::Rejected {
                status: 404,
                message: "no such job".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_execution_reports_wrapped_kind() {
        let err = ClientError::Execution {
            job_id: JobId::new("7"),
            source: Box::new(ClientError::Timeout {
                job_id: JobId::new("7"),
                elapsed: Duration::from_secs(300),
                last_error: None,
            }),
        };
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(matches!(err.root(), ClientError::Timeout { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::JobFailed {
            job_id: JobId::new("42"),
            message: "circuit too deep".into(),
        };
        assert_eq!(err.to_string(), "Job 42 failed: circuit too deep");

        let err = ClientError::BitstringLength {
            bitstring: "0".into(),
            expected: 2,
            found: 1,
        };
        assert!(err.to_string().contains("expected 2"));
    }
}
