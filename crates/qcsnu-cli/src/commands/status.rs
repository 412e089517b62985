//! Status command implementation.

use anyhow::Result;
use console::style;

use qcsnu_client::{JobId, JobStatus};

use super::common::{ServiceArgs, connect, print_job};

/// Execute the status command.
pub async fn execute(
    service: &ServiceArgs,
    job_id: Option<&str>,
    all: bool,
    filter: Option<&str>,
) -> Result<()> {
    let client = connect(service)?;

    if all {
        let filter = filter.map(parse_filter).transpose()?;
        let jobs = client.list_jobs(filter.as_ref()).await?;

        println!("{} {} job(s):\n", style("→").cyan().bold(), jobs.len());
        for job in &jobs {
            print_job(job);
            println!();
        }
        return Ok(());
    }

    let Some(job_id) = job_id else {
        anyhow::bail!("Specify a job ID or use --all");
    };

    let job = client.get_job(&JobId::new(job_id)).await?;
    println!("{} Job {}:\n", style("→").cyan().bold(), style(&job.id).cyan());
    print_job(&job);
    Ok(())
}

/// Parse a `--filter` value; only statuses the service knows are accepted.
fn parse_filter(value: &str) -> Result<JobStatus> {
    match JobStatus::from_wire(&value.to_lowercase()) {
        JobStatus::Unknown(other) => anyhow::bail!(
            "Unknown status: '{other}'. Available: created, queued, running, completed, error, cancelled"
        ),
        status => Ok(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter("RUNNING").unwrap(), JobStatus::Running);
        assert_eq!(parse_filter("cancelled").unwrap(), JobStatus::Cancelled);
        assert!(parse_filter("paused").is_err());
    }
}
