//! Wait command implementation.
//!
//! Poll a job until it reaches a terminal state, then print results.

use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::ProgressBar;
use tokio::task::JoinHandle;

use qcsnu_client::{
    CancelFlag, ExecutionResult, JobId, PollEvent, QuantumClient, WaitOptions, WaitOutcome,
};

use super::common::{OutputFormat, ServiceArgs, connect, print_result, spinner};

/// Execute the wait command.
pub async fn execute(service: &ServiceArgs, job_id: &str, interval: u64, timeout: u64) -> Result<()> {
    let client = connect(service)?;
    let job_id = JobId::new(job_id);

    let result = wait_for_result(&client, &job_id, interval, timeout).await?;
    print_result(&result, OutputFormat::Table)
}

/// Spinner and Ctrl-C handling around one wait.
///
/// Ctrl-C raises the cancel flag, which stops the wait without cancelling
/// the job.
pub struct WaitProgress {
    options: WaitOptions,
    spinner: ProgressBar,
    ctrl_c: JoinHandle<()>,
}

impl WaitProgress {
    pub fn start(interval: u64, timeout: u64) -> Result<Self> {
        let cancel = CancelFlag::new();
        let on_ctrl_c = cancel.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_ctrl_c.cancel();
            }
        });

        let options =
            WaitOptions::new(Duration::from_secs(interval), Duration::from_secs(timeout))
                .with_cancel(cancel);

        Ok(Self {
            options,
            spinner: spinner("Waiting for job to complete...")?,
            ctrl_c,
        })
    }

    pub fn options(&self) -> &WaitOptions {
        &self.options
    }

    pub fn on_event(&self, event: &PollEvent<'_>) {
        match event {
            PollEvent::Status { poll, status, job } => {
                self.spinner
                    .set_message(format!("Job {}: {status} (poll {poll})", job.id));
            }
            PollEvent::PollError { poll, error } => {
                self.spinner
                    .set_message(format!("Poll {poll} failed, retrying: {error}"));
            }
        }
    }

    pub fn finish(self) {
        self.spinner.finish_and_clear();
        self.ctrl_c.abort();
    }
}

/// Wait for `job_id` behind a spinner and return its result.
pub async fn wait_for_result(
    client: &QuantumClient,
    job_id: &JobId,
    interval: u64,
    timeout: u64,
) -> Result<ExecutionResult> {
    println!(
        "{} Waiting for job {} (interval: {}s, timeout: {}s)",
        style("→").cyan().bold(),
        style(job_id).dim(),
        interval,
        timeout
    );

    let progress = WaitProgress::start(interval, timeout)?;
    let outcome = client
        .wait_for_job_with(job_id, progress.options(), |event| progress.on_event(event))
        .await;
    progress.finish();

    match outcome? {
        WaitOutcome::Completed(result) => Ok(result),
        WaitOutcome::Failed { message } => {
            println!("{} Job {} failed", style("✗").red().bold(), style(job_id).cyan());
            anyhow::bail!(message)
        }
        WaitOutcome::Cancelled => {
            anyhow::bail!("Job {job_id} was cancelled")
        }
        WaitOutcome::TimedOut {
            elapsed,
            polls,
            last_error,
        } => {
            let hint = last_error
                .map(|e| format!(" Last poll error: {e}."))
                .unwrap_or_default();
            anyhow::bail!(
                "Timeout after {:.0}s ({} polls).{} Use 'qcsnu status {}' to check later.",
                elapsed.as_secs_f64(),
                polls,
                hint,
                job_id
            )
        }
        WaitOutcome::Interrupted { .. } => {
            anyhow::bail!(
                "Interrupted. Job {job_id} keeps running; use 'qcsnu wait {job_id}' to resume."
            )
        }
    }
}
