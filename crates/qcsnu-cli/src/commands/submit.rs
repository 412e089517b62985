//! Submit command implementation.

use anyhow::{Context, Result};
use console::style;

use qcsnu_client::{JobRequest, MitigationParams};

use super::common::{OutputFormat, ServiceArgs, connect, load_circuit, print_job, print_result};
use super::wait::wait_for_result;

/// Execute the submit command.
pub async fn execute(
    service: &ServiceArgs,
    input: &str,
    backend: &str,
    shots: u32,
    mitigation: Option<&str>,
    wait: bool,
) -> Result<()> {
    let client = connect(service)?;
    let request = build_request(input, backend, shots, mitigation)?;

    println!(
        "{} Submitting {} to {} ({} shots)",
        style("→").cyan().bold(),
        style(input).green(),
        style(backend).yellow(),
        shots
    );

    let job = client.submit(&request).await?;
    println!("{} Job submitted", style("✓").green().bold());
    print_job(&job);

    if wait {
        println!();
        let result = wait_for_result(&client, &job.id, 5, 300).await?;
        print_result(&result, OutputFormat::Table)?;
    } else {
        println!(
            "\n  Use '{}' to follow it.",
            style(format!("qcsnu wait {}", job.id)).dim()
        );
    }

    Ok(())
}

/// Build a validated job request from command-line arguments.
pub fn build_request(
    input: &str,
    backend: &str,
    shots: u32,
    mitigation: Option<&str>,
) -> Result<JobRequest> {
    let circuit = load_circuit(input)?;
    let mut request = JobRequest::new(circuit, backend, shots);

    if let Some(json) = mitigation {
        let params: MitigationParams =
            serde_json::from_str(json).context("Invalid --mitigation JSON")?;
        request = request.with_mitigation(params);
    }

    request.validate()?;
    Ok(request)
}
