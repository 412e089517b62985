//! Result command implementation.

use anyhow::Result;
use console::style;

use qcsnu_client::{ExecutionResult, JobId};

use super::common::{OutputFormat, ServiceArgs, connect, print_result};

/// Execute the result command.
pub async fn execute(
    service: &ServiceArgs,
    job_id: &str,
    format: OutputFormat,
    parity: bool,
) -> Result<()> {
    let client = connect(service)?;
    let result = client.get_job_results(&JobId::new(job_id)).await?;

    print_result(&result, format)?;
    if parity {
        print_parity(&result);
    }
    Ok(())
}

/// Print the expectation of Z on every qubit of the register.
pub fn print_parity(result: &ExecutionResult) {
    let Some(width) = result.width() else {
        println!("\n  Parity: n/a (no outcomes)");
        return;
    };
    let value = result.parity_expectation();
    println!("\n  <Z^{width}> = {}", style(format!("{value:+.4}")).yellow());
}
