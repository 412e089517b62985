//! Backends command implementation.

use anyhow::Result;
use console::style;
use serde_json::{Map, Value};

use super::common::{ServiceArgs, connect};

/// Execute the backends command.
pub async fn execute(
    service: &ServiceArgs,
    status: Option<&str>,
    calibration: Option<&str>,
) -> Result<()> {
    let client = connect(service)?;

    if let Some(name) = status {
        let details = client.get_backend_status(name).await?;
        println!("{} Status of {}:\n", style("→").cyan().bold(), style(name).bold());
        print_map(&details);
        return Ok(());
    }

    if let Some(name) = calibration {
        let details = client.get_backend_calibration(name).await?;
        println!(
            "{} Calibration of {}:\n",
            style("→").cyan().bold(),
            style(name).bold()
        );
        print_map(&details);
        return Ok(());
    }

    let backends = client.list_backends().await?;
    println!("{} Available backends:\n", style("QCSNU").cyan().bold());

    if backends.is_empty() {
        println!("  (none)");
    }

    for backend in &backends {
        println!(
            "  {} {} ({})",
            if backend.is_online() {
                style("●").green()
            } else {
                style("○").red()
            },
            style(&backend.name).bold(),
            backend.status
        );
        println!("    Qubits: {}", backend.n_qubits);

        let capabilities: Vec<&str> = backend
            .capabilities
            .iter()
            .filter(|(_, v)| v.as_bool().unwrap_or(true))
            .map(|(k, _)| k.as_str())
            .collect();
        if !capabilities.is_empty() {
            println!("    Capabilities: {}", capabilities.join(", "));
        }
        println!();
    }

    Ok(())
}

fn print_map(map: &Map<String, Value>) {
    if map.is_empty() {
        println!("  (empty)");
    }
    for (key, value) in map {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("  {:<20} {}", style(key).cyan(), rendered);
    }
}
