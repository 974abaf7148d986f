//! # SonarCloud Findings Client
//!
//! A small Rust client for the SonarCloud / SonarQube Web API that pulls every page of
//! the vulnerability issue and security hotspot searches for a project and splices them
//! into a single JSON document.
//!
//! Findings are never decoded into structured types. Each issue or hotspot is kept as the
//! exact JSON text the service returned (`serde_json::value::RawValue`), so unknown fields
//! survive untouched until the final document is assembled.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sonarcloud_api::{FindingsAccumulator, ProjectScope, SonarClient, SonarConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SonarConfig::new("my-token".to_string());
//!     let client = SonarClient::new(config)?;
//!
//!     let scope = ProjectScope::new("my-org", "my-org_my-project").with_branch("main");
//!     let mut findings = FindingsAccumulator::new();
//!
//!     let api = client.findings_api();
//!     api.fetch_issues(&scope, &mut findings).await?;
//!     api.fetch_hotspots(&scope, &mut findings).await?;
//!
//!     println!("{}", findings.to_document()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Pagination
//!
//! The issue and hotspot endpoints report their totals differently: issues carry a
//! `paging` object (and, on older servers, flat `total`/`ps` keys), hotspots only carry
//! `paging`. [`paging::fetch_all_pages`] resolves both shapes with a fixed precedence and
//! refuses to guess when neither is present.

pub mod aggregate;
pub mod client;
pub mod paging;
pub mod search;
pub mod server;

use secrecy::SecretString;

// Re-export common types for convenience
pub use aggregate::{FindingsAccumulator, JsonFragment, build_document};
pub use client::{SonarClient, Transport};
pub use paging::{DEFAULT_PAGE_SIZE, PageEnvelope, PageSummary, Paging, fetch_all_pages};
pub use search::{FindingsApi, ProjectScope};
pub use server::server_version;

/// Public SonarCloud endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://sonarcloud.io";

/// Maximum number of response characters quoted in error messages.
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// Error type for SonarCloud API operations.
///
/// Every variant is fatal for a snapshot run; nothing in this crate retries.
#[derive(Debug, thiserror::Error)]
#[must_use = "Need to handle all error enum types."]
pub enum SonarError {
    /// HTTP request could not be completed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status and a body
    #[error("SonarCloud API call failed ({status}): {url}\n{body}")]
    ApiStatus {
        status: u16,
        url: String,
        body: String,
    },

    /// Service answered with a non-success status and no body
    #[error("No response body from SonarCloud ({status}): {url}")]
    EmptyResponse { status: u16, url: String },

    /// Page could not be decoded as a search response
    #[error("Failed to decode {api_path} (page {page}): {source}")]
    Decode {
        api_path: String,
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    /// Page decoded but its totals cannot be resolved
    #[error("SonarCloud response missing {missing} for {api_path} (page {page}): {response}")]
    Schema {
        missing: &'static str,
        api_path: String,
        page: u32,
        response: String,
    },

    /// Spliced findings document is not valid JSON
    #[error("Failed to assemble findings document: {0}")]
    Aggregation(#[source] serde_json::Error),

    /// A finding fragment is not a single freestanding JSON value
    #[error("Invalid {field} fragment at index {index}: {source}")]
    InvalidFragment {
        field: &'static str,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// API returned something other than what was asked for
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Shorten a response body for inclusion in an error message.
///
/// Bodies longer than [`MAX_ERROR_BODY_CHARS`] characters are cut and suffixed with `...`.
#[must_use]
pub fn truncate_response(response: &str) -> String {
    if response.chars().count() <= MAX_ERROR_BODY_CHARS {
        return response.to_string();
    }
    let mut truncated: String = response.chars().take(MAX_ERROR_BODY_CHARS).collect();
    truncated.push_str("...");
    truncated
}

/// Configuration for the SonarCloud API client.
///
/// Built once at process start and handed to [`SonarClient::new`]. The token is held as a
/// [`SecretString`] so it never shows up in `Debug` output or logs.
#[derive(Debug)]
pub struct SonarConfig {
    /// Service root, e.g. `https://sonarcloud.io` (the `/api/` prefix is added per call)
    pub base_url: String,
    /// User token, sent as the basic-auth user name with an empty password
    pub token: SecretString,
    /// Requested page size for paginated searches
    pub page_size: u32,
    /// TCP connect timeout in seconds
    pub connect_timeout: u64,
    /// Whole-request timeout in seconds
    pub request_timeout: u64,
    /// Optional HTTP(S) proxy
    pub proxy_url: Option<String>,
    /// Whether to validate TLS certificates (default: true)
    pub validate_certificates: bool,
}

impl SonarConfig {
    /// Create a configuration for the public SonarCloud service.
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: SecretString::from(token),
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout: 30,
            request_timeout: 300,
            proxy_url: None,
            validate_certificates: true,
        }
    }

    /// Point the client at another server (e.g. a self-hosted SonarQube).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the requested page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set connect and request timeouts, in seconds.
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout: u64, request_timeout: u64) -> Self {
        self.connect_timeout = connect_timeout;
        self.request_timeout = request_timeout;
        self
    }

    /// Route all requests through a proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Disable certificate validation for development environments.
    ///
    /// WARNING: This should only be used against test servers with self-signed
    /// certificates. Never use this in production.
    #[must_use]
    pub fn with_certificate_validation_disabled(mut self) -> Self {
        self.validate_certificates = false;
        self
    }
}
