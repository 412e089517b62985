//! Job lifecycle controller.
//!
//! Submission, status polling and result retrieval. The polling loop in
//! [`QuantumClient::wait_for_job_with`] is the only place where time passes:
//!
//! ```text
//!   ┌──→ cancelled? ──yes──→ Interrupted
//!   │        │ no
//!   │        ▼
//!   │    fetch job ──transient error──→ PollError ─┐
//!   │        │ ok                                  │
//!   │        ▼                                     │
//!   │    Status event                              │
//!   │        │                                     │
//!   │        ├── completed ──→ fetch result ──→ Completed
//!   │        ├── error ──→ Failed(message)         │
//!   │        ├── cancelled ──→ Cancelled           │
//!   │        ▼ pending                             │
//!   └─── sleep min(interval, remaining) ◀──────────┘
//!
//!   budget exhausted ──→ TimedOut
//! ```
//!
//! Transport and 5xx failures on a poll are absorbed; authentication and
//! rejection errors end the wait immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use crate::client::QuantumClient;
use crate::error::{ClientError, ClientResult};
use crate::job::{Job, JobId, JobRequest, JobStatus};
use crate::result::{ExecutionResult, ResultPayload};
use crate::transport::{Request, Transport};

const JOBS_PATH: &str = "/api/runner/jobs/";
const JOB_CREATE_PATH: &str = "/api/runner/jobs/create/";

/// Default time between status fetches.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(5);

/// Default wait budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

fn job_path(id: &JobId) -> String {
    format!("{JOBS_PATH}{id}/")
}

/// Shared flag that stops a wait at its next iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Polling parameters for [`QuantumClient::wait_for_job`].
#[derive(Debug, Clone)]
pub struct WaitOptions {
    pub polling_interval: Duration,
    pub timeout: Duration,
    pub cancel: Option<CancelFlag>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            polling_interval: DEFAULT_POLLING_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            cancel: None,
        }
    }
}

impl WaitOptions {
    pub fn new(polling_interval: Duration, timeout: Duration) -> Self {
        Self {
            polling_interval,
            timeout,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Reject interval/timeout combinations the loop cannot honor.
    pub fn validate(&self) -> ClientResult<()> {
        if self.polling_interval.is_zero() {
            return Err(ClientError::Configuration(
                "polling_interval must be greater than 0".into(),
            ));
        }
        if self.polling_interval > self.timeout {
            return Err(ClientError::Configuration(format!(
                "polling_interval ({:?}) must not exceed timeout ({:?})",
                self.polling_interval, self.timeout
            )));
        }
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// Event passed to the wait callback, once per poll.
#[derive(Debug)]
pub enum PollEvent<'a> {
    /// The poll fetched the job.
    Status {
        poll: u32,
        status: &'a JobStatus,
        job: &'a Job,
    },
    /// The poll failed with a retryable error; the wait continues.
    PollError { poll: u32, error: &'a ClientError },
}

impl PollEvent<'_> {
    pub fn poll(&self) -> u32 {
        match self {
            Self::Status { poll, .. } | Self::PollError { poll, .. } => *poll,
        }
    }
}

/// How a wait ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    /// The job completed and its result was fetched.
    Completed(ExecutionResult),
    /// The service reports the job as failed.
    Failed { message: String },
    /// The job was cancelled.
    Cancelled,
    /// The wait budget ran out before a terminal state.
    TimedOut {
        elapsed: Duration,
        polls: u32,
        /// Last absorbed poll error, if any.
        last_error: Option<String>,
    },
    /// The cancel flag was raised.
    Interrupted { elapsed: Duration, polls: u32 },
}

impl WaitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Error text for unsuccessful outcomes; `"timeout"` for a timed-out wait.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Completed(_) => None,
            Self::Failed { message } => Some(message.clone()),
            Self::Cancelled => Some("Job was cancelled".into()),
            Self::TimedOut { .. } => Some("timeout".into()),
            Self::Interrupted { .. } => Some("interrupted".into()),
        }
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        match self {
            Self::Completed(r) => Some(r),
            _ => None,
        }
    }

    /// Convert into a result, turning every unsuccessful outcome into an error.
    pub fn into_result(self, job_id: &JobId) -> ClientResult<ExecutionResult> {
        let job_id = job_id.clone();
        match self {
            Self::Completed(r) => Ok(r),
            Self::Failed { message } => Err(ClientError::JobFailed { job_id, message }),
            Self::Cancelled => Err(ClientError::JobCancelled { job_id }),
            Self::TimedOut {
                elapsed,
                last_error,
                ..
            } => Err(ClientError::Timeout {
                job_id,
                elapsed,
                last_error,
            }),
            Self::Interrupted { .. } => Err(ClientError::Interrupted { job_id }),
        }
    }
}

impl<T: Transport> QuantumClient<T> {
    /// Create a job.
    ///
    /// A request the service refuses is [`ClientError::Rejected`]; a request
    /// that never got an answer is [`ClientError::Submission`].
    #[instrument(skip_all, fields(backend = %request.backend, shots = request.shots))]
    pub async fn submit(&self, request: &JobRequest) -> ClientResult<Job> {
        request.validate()?;
        let body = serde_json::to_value(request)?;

        let job: Job = match self.request_as(Request::post(JOB_CREATE_PATH, body)).await {
            Ok(job) => job,
            Err(e) if e.is_transient() => {
                return Err(ClientError::Submission {
                    message: e.to_string(),
                    source: Some(Box::new(e)),
                });
            }
            Err(e) => return Err(e),
        };

        info!(job_id = %job.id, status = %job.status, "Job submitted");
        Ok(job)
    }

    /// Fetch a job once.
    #[instrument(skip(self))]
    pub async fn get_job(&self, job_id: &JobId) -> ClientResult<Job> {
        self.request_as(Request::get(job_path(job_id))).await
    }

    /// Re-fetch a locally held job, replacing it with the latest observation.
    pub async fn refresh_job(&self, job: &mut Job) -> ClientResult<()> {
        let latest = self.get_job(&job.id).await?;
        if latest.status != job.status {
            debug!(job_id = %job.id, from = %job.status, to = %latest.status, "Status changed");
        }
        *job = latest;
        Ok(())
    }

    /// All of the caller's jobs, optionally only those in one status.
    #[instrument(skip(self))]
    pub async fn list_jobs(&self, status: Option<&JobStatus>) -> ClientResult<Vec<Job>> {
        let mut request = Request::get(JOBS_PATH);
        if let Some(status) = status {
            request = request.with_query("status", status.as_str());
        }
        self.request_as(request).await
    }

    /// Ask the service to cancel a job. Returns `true` once it confirms.
    #[instrument(skip(self))]
    pub async fn cancel_job(&self, job_id: &JobId) -> ClientResult<bool> {
        let body = self
            .request(Request::delete(format!("{}cancel/", job_path(job_id))))
            .await?;
        let cancelled = body.get("status").and_then(|s| s.as_str()) == Some("cancelled");
        info!(job_id = %job_id, cancelled, "Cancel requested");
        Ok(cancelled)
    }

    /// Fetch the result of a completed job without polling.
    #[instrument(skip(self))]
    pub async fn get_job_results(&self, job_id: &JobId) -> ClientResult<ExecutionResult> {
        let job = self.get_job(job_id).await?;
        match job.status {
            JobStatus::Completed => self.fetch_results(job_id).await,
            JobStatus::Error => Err(ClientError::JobFailed {
                job_id: job_id.clone(),
                message: job.failure_message(),
            }),
            JobStatus::Cancelled => Err(ClientError::JobCancelled {
                job_id: job_id.clone(),
            }),
            status => Err(ClientError::JobNotFinished {
                job_id: job_id.clone(),
                status,
            }),
        }
    }

    async fn fetch_results(&self, job_id: &JobId) -> ClientResult<ExecutionResult> {
        let payload: ResultPayload = self
            .request_as(Request::get(format!("{}results/", job_path(job_id))))
            .await?;
        ExecutionResult::from_payload(job_id.clone(), payload)
    }

    /// Poll a job until it finishes or the budget runs out.
    pub async fn wait_for_job(
        &self,
        job_id: &JobId,
        options: &WaitOptions,
    ) -> ClientResult<WaitOutcome> {
        self.wait_for_job_with(job_id, options, |_| {}).await
    }

    /// [`wait_for_job`](Self::wait_for_job), calling `on_event` after every
    /// poll, including the one that observes the terminal state.
    ///
    /// Returns `Err` only for invalid options, non-retryable poll errors and
    /// a failed result fetch. Every other ending is a [`WaitOutcome`].
    #[instrument(skip(self, options, on_event), fields(job_id = %job_id))]
    pub async fn wait_for_job_with<F>(
        &self,
        job_id: &JobId,
        options: &WaitOptions,
        mut on_event: F,
    ) -> ClientResult<WaitOutcome>
    where
        F: FnMut(&PollEvent<'_>),
    {
        options.validate()?;

        let start = Instant::now();
        let mut polls = 0u32;
        let mut last_error = None;

        while start.elapsed() < options.timeout {
            if options.is_cancelled() {
                info!(polls, "Wait interrupted");
                return Ok(WaitOutcome::Interrupted {
                    elapsed: start.elapsed(),
                    polls,
                });
            }

            polls += 1;
            match self.get_job(job_id).await {
                Ok(job) => {
                    on_event(&PollEvent::Status {
                        poll: polls,
                        status: &job.status,
                        job: &job,
                    });
                    match &job.status {
                        JobStatus::Completed => {
                            info!(polls, "Job completed");
                            let result = self.fetch_results(job_id).await?;
                            return Ok(WaitOutcome::Completed(result));
                        }
                        JobStatus::Error => {
                            let message = job.failure_message();
                            info!(polls, %message, "Job failed");
                            return Ok(WaitOutcome::Failed { message });
                        }
                        JobStatus::Cancelled => {
                            info!(polls, "Job cancelled");
                            return Ok(WaitOutcome::Cancelled);
                        }
                        status => debug!(poll = polls, %status, "Job pending"),
                    }
                }
                Err(e) if e.is_transient() => {
                    warn!(poll = polls, error = %e, "Poll failed, retrying");
                    on_event(&PollEvent::PollError {
                        poll: polls,
                        error: &e,
                    });
                    last_error = Some(e.to_string());
                }
                Err(e) => return Err(e),
            }

            let remaining = options.timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }
            sleep(options.polling_interval.min(remaining)).await;
        }

        let elapsed = start.elapsed();
        warn!(polls, elapsed_secs = elapsed.as_secs_f64(), "Timed out waiting for job");
        Ok(WaitOutcome::TimedOut {
            elapsed,
            polls,
            last_error,
        })
    }
}
