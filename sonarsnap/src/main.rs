//! Sonarsnap - SonarCloud Findings Snapshot Tool
//!
//! CLI tool that writes every vulnerability issue and security hotspot of a project to
//! one JSON results file
use clap::Parser;
use log::{error, info};
use sonarcloud_api::SonarClient;
use sonarsnap::{Result, SnapshotOptions, cli, config, run_snapshot};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse CLI arguments
    let args = cli::Cli::parse();

    info!("Sonarsnap - SonarCloud Findings Snapshot Tool");

    // Token is checked here, before any network activity
    let token = config::token_from_env();
    let sonar_config =
        config::create_sonar_config(&args, token.as_deref()).inspect_err(|e| error!("{e}"))?;
    let options = SnapshotOptions::from_cli(&args);

    let client = SonarClient::new(sonar_config).inspect_err(|e| error!("{e}"))?;

    match run_snapshot(&client, &options).await {
        Ok(report) => {
            info!(
                "Snapshot complete: {} issues and {} hotspots written to {}",
                report.issues,
                report.hotspots,
                report.path.display()
            );
            Ok(())
        }
        Err(e) => {
            error!("Snapshot failed: {e}");
            Err(e)
        }
    }
}
