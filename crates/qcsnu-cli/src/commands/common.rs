//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use qcsnu_client::{Circuit, ClientConfig, ExecutionResult, Job, QuantumClient};

/// Global connection options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct ServiceArgs {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Token saved by `auth login`, stored as a single line in a file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// The store at `~/.qcsnu/token`.
    pub fn default_location() -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(Self::at(home.join(".qcsnu").join("token")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved token, or `None` if nothing usable is stored.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token file: {}", self.path.display()))?;
        let token = contents.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        fs::write(&self.path, format!("{token}\n"))
            .with_context(|| format!("Failed to write token file: {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Delete the saved token. Returns whether one existed.
    pub fn remove(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove token file: {}", self.path.display()))?;
        Ok(true)
    }
}

/// Build a client. A token given on the command line or in the environment
/// wins over the saved one.
pub fn connect(service: &ServiceArgs) -> Result<QuantumClient> {
    let mut config = ClientConfig::resolve(service.base_url.clone(), service.token.clone());

    if config.token.is_none() {
        let store = TokenStore::default_location()?;
        if let Some(token) = store.load()? {
            debug!(path = %store.path().display(), "Using saved token");
            config = config.with_token(token);
        }
    }

    Ok(QuantumClient::from_config(config)?)
}

/// Load an OpenQASM source file. The file stem becomes the circuit name.
pub fn load_circuit(path: &str) -> Result<Circuit> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    if source.trim().is_empty() {
        anyhow::bail!("Circuit file is empty: {path}");
    }

    let mut circuit = Circuit::new(source);
    if let Some(stem) = path_obj.file_stem().and_then(|s| s.to_str()) {
        circuit = circuit.with_name(stem);
    }
    Ok(circuit)
}

/// A steadily ticking spinner with `message`.
pub fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(spinner)
}

/// Print a job summary.
pub fn print_job(job: &Job) {
    let status = job.status.as_str();
    let status = if job.status.is_success() {
        style(status).green()
    } else if job.status.is_failure() {
        style(status).red()
    } else {
        style(status).yellow()
    };

    println!("  Job ID:   {}", style(&job.id).cyan());
    println!("  Status:   {status}");
    println!("  Backend:  {}", job.backend);
    println!("  Shots:    {}", job.shots);
    if let Some(name) = job.circuit.as_ref().and_then(|c| c.name.as_deref()) {
        println!("  Circuit:  {name}");
    }
    if let Some(created) = job.created_at {
        println!(
            "  Created:  {}",
            created
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
        );
    }
    if let Some(updated) = job.updated_at {
        println!(
            "  Updated:  {}",
            updated
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
        );
    }
    if job.status.is_failure() {
        println!("  Error:    {}", style(job.failure_message()).red());
    }
}

/// Print a result as a table of the most likely outcomes, or as JSON.
pub fn print_result(result: &ExecutionResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Table => print_table(result),
    }
    Ok(())
}

fn print_table(result: &ExecutionResult) {
    match result.total_shots() {
        Some(shots) => println!(
            "\n{} Results for job {} ({} shots):",
            style("✓").green().bold(),
            style(&result.job_id).cyan(),
            shots
        ),
        None => println!(
            "\n{} Results for job {} (probabilities):",
            style("✓").green().bold(),
            style(&result.job_id).cyan()
        ),
    }

    let sorted = result.sorted();
    if sorted.is_empty() {
        println!("  (no outcomes)");
    }

    for (bitstring, prob) in sorted.iter().take(16) {
        let percent = prob * 100.0;
        let bar_len = (percent / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);

        println!(
            "  {}: {:>6.4} ({:>5.2}%) {}",
            style(bitstring).cyan(),
            prob,
            percent,
            style(bar).green()
        );
    }

    if sorted.len() > 16 {
        println!("  ... and {} more outcomes", sorted.len() - 16);
    }

    if let Some(backend) = result.backend() {
        println!("\n  Backend: {}", style(backend).yellow());
    }
    if let Some(seconds) = result.execution_time() {
        println!("  Execution time: {} s", style(seconds).yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("nested").join("token"));

        assert_eq!(store.load().unwrap(), None);
        store.save("abc123").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc123"));

        assert!(store.remove().unwrap());
        assert!(!store.remove().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_token_store_ignores_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "  \n").unwrap();

        assert_eq!(TokenStore::at(&path).load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("token"));
        store.save("secret").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_load_circuit_names_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bell.qasm");
        fs::write(&path, "OPENQASM 2.0;\nqreg q[2];\n").unwrap();

        let circuit = load_circuit(path.to_str().unwrap()).unwrap();
        assert_eq!(circuit.name.as_deref(), Some("bell"));
        assert!(circuit.qasm.starts_with("OPENQASM 2.0;"));
    }

    #[test]
    fn test_load_circuit_rejects_missing_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.qasm");
        assert!(load_circuit(missing.to_str().unwrap()).is_err());

        let empty = dir.path().join("empty.qasm");
        fs::write(&empty, "\n").unwrap();
        let err = load_circuit(empty.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
