//! Run command implementation.
//!
//! Submit, wait and print in one step.

use anyhow::Result;
use console::style;

use super::common::{OutputFormat, ServiceArgs, connect, print_result};
use super::submit::build_request;
use super::wait::WaitProgress;

/// Execute the run command.
#[allow(clippy::too_many_arguments)]
pub async fn execute(
    service: &ServiceArgs,
    input: &str,
    backend: &str,
    shots: u32,
    mitigation: Option<&str>,
    interval: u64,
    timeout: u64,
    format: OutputFormat,
) -> Result<()> {
    let client = connect(service)?;
    let request = build_request(input, backend, shots, mitigation)?;

    println!(
        "{} Running {} on {} ({} shots, interval: {}s, timeout: {}s)",
        style("→").cyan().bold(),
        style(input).green(),
        style(backend).yellow(),
        shots,
        interval,
        timeout
    );

    let progress = WaitProgress::start(interval, timeout)?;
    let result = client
        .run_with(&request, progress.options(), |event| progress.on_event(event))
        .await;
    progress.finish();

    print_result(&result?, format)
}
