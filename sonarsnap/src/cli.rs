//! CLI argument parsing for sonarsnap
use clap::Parser;
use sonarcloud_api::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE};
use std::path::PathBuf;

/// Organization searched when `SONAR_ORGANIZATION` is unset or blank
pub const DEFAULT_ORGANIZATION: &str = "Cognia-Security";

/// Project searched when `SONAR_PROJECT_KEY` is unset or blank
pub const DEFAULT_PROJECT_KEY: &str = "Cognia-Security_BenchmarkJava";

#[derive(Parser, Debug)]
#[command(
    name = "sonarsnap",
    version,
    about = "Snapshot SonarCloud vulnerabilities and security hotspots into one JSON file",
    long_about = "Pages through the SonarCloud issue (VULNERABILITY only) and security hotspot \
                  searches for one project and writes every finding, exactly as returned, to \
                  <output-dir>/Benchmark_<version>-sonarqube-v<serverVersion>.json",
    after_help = "ENVIRONMENT:
  SONAR_TOKEN          User token (required, read from the environment only)
  SONAR_ORGANIZATION   Organization key (default: Cognia-Security)
  SONAR_PROJECT_KEY    Project key (default: Cognia-Security_BenchmarkJava)
  SONAR_BRANCH         Branch to search (default: the main branch)
  SONAR_DIRECTORIES    Directory filter for the issue search
  SONAR_LANGUAGES      Language filter for the issue search (default: java)
  SONAR_HOST_URL       Server root (default: https://sonarcloud.io)
  SONAR_PROXY_URL      HTTP(S) proxy for all requests

Blank values are treated as unset.

EXAMPLES:
  SONAR_TOKEN=squ_... sonarsnap
  sonarsnap --branch main --output-dir results --pom ../BenchmarkJava/pom.xml"
)]
pub struct Cli {
    /// Organization key
    #[arg(long, env = "SONAR_ORGANIZATION")]
    pub organization: Option<String>,

    /// Project key
    #[arg(long, env = "SONAR_PROJECT_KEY")]
    pub project_key: Option<String>,

    /// Branch to search
    #[arg(long, env = "SONAR_BRANCH")]
    pub branch: Option<String>,

    /// Directory filter for the issue search
    #[arg(long, env = "SONAR_DIRECTORIES")]
    pub directories: Option<String>,

    /// Comma-separated language filter for the issue search
    #[arg(long, env = "SONAR_LANGUAGES")]
    pub languages: Option<String>,

    /// Server root URL
    #[arg(long, env = "SONAR_HOST_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Results requested per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = validate_page_size)]
    pub page_size: u32,

    /// Maven descriptor holding the project version
    #[arg(long, default_value = "pom.xml")]
    pub pom: PathBuf,

    /// Directory the results file is written to (created if missing)
    #[arg(short, long, default_value = "results")]
    pub output_dir: PathBuf,

    /// TCP connect timeout in seconds
    #[arg(long, default_value_t = 30, value_parser = validate_timeout)]
    pub connect_timeout: u64,

    /// Whole-request timeout in seconds
    #[arg(long, default_value_t = 300, value_parser = validate_timeout)]
    pub request_timeout: u64,

    /// HTTP(S) proxy URL
    #[arg(long, env = "SONAR_PROXY_URL")]
    pub proxy: Option<String>,

    /// Accept invalid TLS certificates (development only)
    #[arg(long)]
    pub insecure: bool,
}

/// Validate page size is at least 1
fn validate_page_size(s: &str) -> Result<u32, String> {
    let size: u32 = s
        .parse()
        .map_err(|_| format!("Invalid page size '{s}'. Must be a positive integer"))?;

    if size == 0 {
        return Err("Page size must be at least 1".to_string());
    }

    Ok(size)
}

/// Validate timeout is between 1 and 3600 seconds
fn validate_timeout(s: &str) -> Result<u64, String> {
    let secs: u64 = s
        .parse()
        .map_err(|_| format!("Invalid timeout '{s}'. Must be a number of seconds"))?;

    if !(1..=3600).contains(&secs) {
        return Err(format!(
            "Timeout must be between 1 and 3600 seconds, got {secs}"
        ));
    }

    Ok(secs)
}
