//! Client for the SNU quantum computing service.
//!
//! Submit quantum circuits to a remote execution service, poll them to
//! completion and read results as probabilities and expectation values.
//!
//! # Overview
//!
//! - [`QuantumClient`] is the entry point. It owns a [`Transport`] and the
//!   caller's authentication [`Token`].
//! - [`QuantumClient::submit`], [`QuantumClient::wait_for_job`] and
//!   [`QuantumClient::get_job_results`] drive a job through its lifecycle.
//! - [`QuantumClient::run`] chains all three.
//! - [`ExecutionResult`] answers [`get_probability`](ExecutionResult::get_probability)
//!   and [`expectation_value`](ExecutionResult::expectation_value) queries.
//!
//! # Configuration
//!
//! | Setting | Environment | Default |
//! |---------|-------------|---------|
//! | Base URL | `QCSNU_BASE_URL` | `http://localhost:8000` |
//! | Token | `QCSNU_TOKEN` | none, call `login()` |
//!
//! # Example
//!
//! ```ignore
//! use qcsnu_client::{JobRequest, Observable, QuantumClient, WaitOptions, WaitOutcome};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut client = QuantumClient::new(None, None)?;
//!     client.login("alice", "secret").await?;
//!
//!     let job = client
//!         .submit(&JobRequest::new(BELL_QASM, "cassiopeia", 1024))
//!         .await?;
//!
//!     let outcome = client
//!         .wait_for_job_with(&job.id, &WaitOptions::default(), |event| {
//!             println!("poll {}: {:?}", event.poll(), event);
//!         })
//!         .await?;
//!
//!     if let WaitOutcome::Completed(result) = outcome {
//!         let zz = Observable::parity(2)?;
//!         println!("<ZZ> = {}", result.expectation_value(&zz)?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod experiment;
pub mod job;
pub mod lifecycle;
pub mod mitigation;
pub mod result;
pub mod transport;

pub use auth::{Credentials, Token};
pub use backend::BackendInfo;
pub use client::QuantumClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use experiment::{Experiment, ExperimentId};
pub use job::{Circuit, DEFAULT_BACKEND, DEFAULT_SHOTS, Job, JobId, JobRequest, JobStatus};
pub use lifecycle::{CancelFlag, PollEvent, WaitOptions, WaitOutcome};
pub use mitigation::{Extrapolation, MitigationParams};
pub use result::{Distribution, ExecutionResult, Observable};
pub use transport::{HttpTransport, Method, Request, Response, Transport, TransportError};
