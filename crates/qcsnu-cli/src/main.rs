//! QCSNU Command-Line Interface
//!
//! Submit circuits to the SNU quantum computing service and follow them to
//! completion from the shell.
//!
//! ```text
//! qcsnu auth login -u alice
//! qcsnu run -i bell.qasm -b cassiopeia -s 1024
//! qcsnu status --all --filter running
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::{OutputFormat, ServiceArgs};
use commands::{auth, backends, cancel, result, run, status, submit, version, wait};

/// qcsnu - client for the SNU quantum computing service
#[derive(Parser)]
#[command(name = "qcsnu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Service base URL
    #[arg(long, env = "QCSNU_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Authentication token (overrides the saved token)
    #[arg(long, env = "QCSNU_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the saved authentication token
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// List backends, or show one backend's status or calibration
    Backends {
        /// Show live status of this backend
        #[arg(long, value_name = "NAME")]
        status: Option<String>,

        /// Show calibration data of this backend
        #[arg(long, value_name = "NAME", conflicts_with = "status")]
        calibration: Option<String>,
    },

    /// Submit a circuit
    Submit {
        /// Input file (OpenQASM)
        #[arg(short, long)]
        input: String,

        /// Backend to run on
        #[arg(short, long, default_value = qcsnu_client::DEFAULT_BACKEND)]
        backend: String,

        /// Number of shots
        #[arg(short, long, default_value_t = qcsnu_client::DEFAULT_SHOTS)]
        shots: u32,

        /// Error mitigation as JSON, e.g. '{"technique":"zne","params":{}}'
        #[arg(long)]
        mitigation: Option<String>,

        /// Wait for the job to finish
        #[arg(short, long)]
        wait: bool,
    },

    /// Query job status
    Status {
        /// Job ID
        job_id: Option<String>,

        /// List all jobs
        #[arg(short, long)]
        all: bool,

        /// Only list jobs in this status (created, queued, running, completed, error, cancelled)
        #[arg(short, long, requires = "all")]
        filter: Option<String>,
    },

    /// Wait for a job to finish
    Wait {
        /// Job ID
        job_id: String,

        /// Polling interval in seconds
        #[arg(long, default_value = "5")]
        interval: u64,

        /// Timeout in seconds
        #[arg(short, long, default_value = "300")]
        timeout: u64,
    },

    /// Retrieve results for a completed job
    Result {
        /// Job ID
        job_id: String,

        /// Output format (table, json)
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Also print the Z-parity expectation value
        #[arg(long)]
        parity: bool,
    },

    /// Submit a circuit, wait for it and print the result
    Run {
        /// Input file (OpenQASM)
        #[arg(short, long)]
        input: String,

        /// Backend to run on
        #[arg(short, long, default_value = qcsnu_client::DEFAULT_BACKEND)]
        backend: String,

        /// Number of shots
        #[arg(short, long, default_value_t = qcsnu_client::DEFAULT_SHOTS)]
        shots: u32,

        /// Error mitigation as JSON, e.g. '{"technique":"readout","params":{}}'
        #[arg(long)]
        mitigation: Option<String>,

        /// Polling interval in seconds
        #[arg(long, default_value = "5")]
        interval: u64,

        /// Timeout in seconds
        #[arg(short, long, default_value = "300")]
        timeout: u64,

        /// Output format (table, json)
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Cancel a job
    Cancel {
        /// Job ID
        job_id: String,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in with username and password and save the token
    Login {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(long, env = "QCSNU_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Check whether the current token is accepted
    Status,

    /// Remove the saved token
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let service = ServiceArgs {
        base_url: cli.base_url,
        token: cli.token,
    };

    let result = match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login { username, password } => {
                auth::execute_login(&service, &username, &password).await
            }
            AuthAction::Status => auth::execute_status(&service).await,
            AuthAction::Logout => auth::execute_logout(),
        },

        Commands::Backends {
            status,
            calibration,
        } => backends::execute(&service, status.as_deref(), calibration.as_deref()).await,

        Commands::Submit {
            input,
            backend,
            shots,
            mitigation,
            wait: do_wait,
        } => {
            submit::execute(
                &service,
                &input,
                &backend,
                shots,
                mitigation.as_deref(),
                do_wait,
            )
            .await
        }

        Commands::Status {
            job_id,
            all,
            filter,
        } => status::execute(&service, job_id.as_deref(), all, filter.as_deref()).await,

        Commands::Wait {
            job_id,
            interval,
            timeout,
        } => wait::execute(&service, &job_id, interval, timeout).await,

        Commands::Result {
            job_id,
            format,
            parity,
        } => result::execute(&service, &job_id, format, parity).await,

        Commands::Run {
            input,
            backend,
            shots,
            mitigation,
            interval,
            timeout,
            format,
        } => {
            run::execute(
                &service,
                &input,
                &backend,
                shots,
                mitigation.as_deref(),
                interval,
                timeout,
                format,
            )
            .await
        }

        Commands::Cancel { job_id } => cancel::execute(&service, &job_id).await,

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["qcsnu", "run", "-i", "bell.qasm"]).unwrap();
        let Commands::Run {
            backend,
            shots,
            interval,
            timeout,
            format,
            mitigation,
            ..
        } = cli.command
        else {
            panic!("expected run command");
        };
        assert_eq!(backend, "cassiopeia");
        assert_eq!(shots, 1024);
        assert_eq!((interval, timeout), (5, 300));
        assert_eq!(format, OutputFormat::Table);
        assert!(mitigation.is_none());
    }

    #[test]
    fn test_run_accepts_mitigation() {
        let cli = Cli::try_parse_from([
            "qcsnu",
            "run",
            "-i",
            "bell.qasm",
            "--mitigation",
            r#"{"technique": "zne", "params": {}}"#,
        ])
        .unwrap();
        let Commands::Run { mitigation, .. } = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(mitigation.as_deref(), Some(r#"{"technique": "zne", "params": {}}"#));
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "qcsnu",
            "status",
            "42",
            "--base-url",
            "http://qc.example.org",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://qc.example.org"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_filter_requires_all() {
        assert!(Cli::try_parse_from(["qcsnu", "status", "--filter", "running"]).is_err());
        assert!(Cli::try_parse_from(["qcsnu", "status", "--all", "--filter", "running"]).is_ok());
    }

    #[test]
    fn test_result_format_json() {
        let cli = Cli::try_parse_from(["qcsnu", "result", "7", "--format", "json", "--parity"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Result {
                format: OutputFormat::Json,
                parity: true,
                ..
            }
        ));
    }
}
