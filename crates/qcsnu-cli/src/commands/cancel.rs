//! Cancel command implementation.

use anyhow::Result;
use console::style;

use qcsnu_client::JobId;

use super::common::{ServiceArgs, connect};

/// Execute the cancel command.
pub async fn execute(service: &ServiceArgs, job_id: &str) -> Result<()> {
    let client = connect(service)?;
    let job_id = JobId::new(job_id);

    if client.cancel_job(&job_id).await? {
        println!(
            "{} Job {} cancelled",
            style("✓").green().bold(),
            style(&job_id).cyan()
        );
    } else {
        println!(
            "{} Job {} could not be cancelled",
            style("✗").red(),
            style(&job_id).cyan()
        );
    }
    Ok(())
}
