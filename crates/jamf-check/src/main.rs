use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use jamf_check::{ConfigSource, HealthCheckRunner, Reporter, load_credentials, telemetry};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "jamf-check",
    about = "Verify connectivity and OAuth authentication to a Jamf Pro instance"
)]
struct Cli {
    /// Env file to load before reading JAMF_* variables (default: .env if present).
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Jamf Pro hostname without protocol. Overrides JAMF_INSTANCE_FQDN.
    #[arg(long)]
    instance_fqdn: Option<String>,

    /// OAuth client id. Overrides JAMF_CLIENT_ID.
    #[arg(long)]
    client_id: Option<String>,

    /// OAuth client secret. Overrides JAMF_CLIENT_SECRET.
    #[arg(long)]
    client_secret: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init(cli.log_json);

    let mut reporter = Reporter::new(std::io::stdout().lock());
    reporter.banner()?;

    let source = ConfigSource {
        instance_fqdn: cli.instance_fqdn,
        client_id: cli.client_id,
        client_secret: cli.client_secret,
    };
    let credentials = match load_credentials(cli.env_file.as_deref(), source) {
        Ok(credentials) => credentials,
        Err(e) => {
            reporter.check_error(&e)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    if credentials.scheme_stripped() {
        reporter.scheme_stripped()?;
    }
    reporter.target(&credentials.base_url())?;

    let runner = HealthCheckRunner::new();
    tokio::select! {
        outcome = runner.run(&credentials) => {
            reporter.outcome(&outcome)?;
            info!(stage = ?outcome.stage, "connection check finished");
            Ok(ExitCode::from(outcome.exit_code()))
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted");
            reporter.interrupted()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
