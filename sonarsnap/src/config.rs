//! Resolve CLI and environment input into client configuration and run options
use crate::cli::{Cli, DEFAULT_ORGANIZATION, DEFAULT_PROJECT_KEY};
use crate::error::{Result, SnapshotError};
use log::{debug, warn};
use sonarcloud_api::{DEFAULT_BASE_URL, ProjectScope, SonarConfig};
use std::path::PathBuf;

/// Treat a blank value the same as an unset one
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Environment variable holding the user token
pub const TOKEN_ENV: &str = "SONAR_TOKEN";

/// Token from the environment; it is never accepted on the command line
#[must_use]
pub fn token_from_env() -> Option<String> {
    std::env::var(TOKEN_ENV).ok()
}

/// Require a non-blank token.
///
/// # Errors
///
/// Returns [`SnapshotError::MissingToken`] when the token is unset or blank.
pub fn load_token(token: Option<&str>) -> Result<String> {
    match non_blank(token) {
        Some(token) => {
            debug!("SonarCloud token loaded ({} characters)", token.len());
            Ok(token.to_string())
        }
        None => Err(SnapshotError::MissingToken),
    }
}

/// Build the client configuration from parsed arguments and the token.
///
/// The token is checked first so a missing credential fails before anything else.
///
/// # Errors
///
/// Returns [`SnapshotError::MissingToken`] when no usable token was supplied.
pub fn create_sonar_config(cli: &Cli, token: Option<&str>) -> Result<SonarConfig> {
    let token = load_token(token)?;
    let base_url = non_blank(Some(&cli.base_url)).unwrap_or(DEFAULT_BASE_URL);

    let mut config = SonarConfig::new(token)
        .with_base_url(base_url)
        .with_page_size(cli.page_size)
        .with_timeouts(cli.connect_timeout, cli.request_timeout);

    if let Some(proxy) = non_blank(cli.proxy.as_deref()) {
        debug!("Using proxy {proxy}");
        config = config.with_proxy(proxy);
    }

    if cli.insecure {
        warn!("TLS certificate validation disabled");
        config = config.with_certificate_validation_disabled();
    }

    Ok(config)
}

/// What to snapshot and where to put it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub organization: String,
    pub project_key: String,
    pub branch: Option<String>,
    pub directories: Option<String>,
    pub languages: Option<String>,
    pub page_size: u32,
    pub pom_path: PathBuf,
    pub output_dir: PathBuf,
}

impl SnapshotOptions {
    /// Resolve run options, falling back to the defaults for blank values
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        let owned = |value: &Option<String>| non_blank(value.as_deref()).map(str::to_string);

        Self {
            organization: owned(&cli.organization)
                .unwrap_or_else(|| DEFAULT_ORGANIZATION.to_string()),
            project_key: owned(&cli.project_key)
                .unwrap_or_else(|| DEFAULT_PROJECT_KEY.to_string()),
            branch: owned(&cli.branch),
            directories: owned(&cli.directories),
            languages: owned(&cli.languages),
            page_size: cli.page_size,
            pom_path: cli.pom.clone(),
            output_dir: cli.output_dir.clone(),
        }
    }

    /// Search scope for the issue and hotspot queries
    #[must_use]
    pub fn scope(&self) -> ProjectScope<'_> {
        let mut scope = ProjectScope::new(&self.organization, &self.project_key);
        if let Some(branch) = &self.branch {
            scope = scope.with_branch(branch);
        }
        if let Some(directories) = &self.directories {
            scope = scope.with_directories(directories);
        }
        if let Some(languages) = &self.languages {
            scope = scope.with_languages(languages);
        }
        scope
    }
}
