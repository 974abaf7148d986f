//! Core SonarCloud API client implementation.
//!
//! This module contains the HTTP transport used by the paginated searches: one
//! `reqwest::Client` configured from [`SonarConfig`], authenticating every call with the
//! user token as basic-auth user name and an empty password.

use log::debug;
use reqwest::Client;
use secrecy::ExposeSecret;
use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::search::FindingsApi;
use crate::{SonarConfig, SonarError, truncate_response};

/// Anything that can perform an authenticated `GET <base-url>/api/<path>`.
///
/// [`SonarClient`] is the production implementation; the paged fetcher only depends on
/// this trait, so tests can substitute canned responses.
pub trait Transport {
    /// Fetch `api_path` (relative to `/api/`, query string included) and return the
    /// response body. Non-success statuses are errors.
    fn get_text(&self, api_path: &str) -> impl Future<Output = Result<String, SonarError>> + Send;
}

/// Core SonarCloud API client.
pub struct SonarClient {
    config: SonarConfig,
    client: Client,
}

impl SonarClient {
    /// Create a new SonarCloud API client.
    ///
    /// # Errors
    ///
    /// Returns [`SonarError::InvalidConfig`] if the base URL, proxy URL or page size is
    /// unusable, or [`SonarError::Http`] if the underlying HTTP client cannot be built.
    pub fn new(config: SonarConfig) -> Result<Self, SonarError> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            SonarError::InvalidConfig(format!("Invalid base URL '{}': {e}", config.base_url))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SonarError::InvalidConfig(format!(
                "Base URL must use http or https: {}",
                config.base_url
            )));
        }
        if config.page_size == 0 {
            return Err(SonarError::InvalidConfig(
                "Page size must be at least 1".to_string(),
            ));
        }

        let mut client_builder = Client::builder();

        if !config.validate_certificates {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        client_builder = client_builder
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(config.request_timeout));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| SonarError::InvalidConfig(format!("Invalid proxy URL: {e}")))?;
            client_builder = client_builder.proxy(proxy);
        }

        let client = client_builder.build().map_err(SonarError::Http)?;
        Ok(Self { config, client })
    }

    /// Get the base URL for API requests.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get access to the configuration
    #[must_use]
    pub fn config(&self) -> &SonarConfig {
        &self.config
    }

    /// Get a findings search API bound to this client and its configured page size.
    #[must_use]
    pub fn findings_api(&self) -> FindingsApi<'_, Self> {
        FindingsApi::new(self, self.config.page_size)
    }

    /// Build the absolute URL for an API path such as `issues/search?projects=x`.
    #[must_use]
    pub fn api_url(&self, api_path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = api_path.trim_start_matches('/');

        let mut url = String::with_capacity(
            base.len().saturating_add(path.len()).saturating_add(5),
        );
        url.push_str(base);
        url.push_str("/api/");
        url.push_str(path);
        url
    }

    /// Make an authenticated GET request and return the body text.
    ///
    /// # Errors
    ///
    /// Returns [`SonarError::Http`] if the request cannot be completed,
    /// [`SonarError::EmptyResponse`] for a non-success status without a body, and
    /// [`SonarError::ApiStatus`] (URL plus truncated body) for any other non-success status.
    pub async fn get(&self, api_path: &str) -> Result<String, SonarError> {
        let url = self.api_url(api_path);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .basic_auth(self.config.token.expose_secret(), None::<&str>)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!("GET {url} failed with HTTP {status}");
            if body.trim().is_empty() {
                return Err(SonarError::EmptyResponse {
                    status: status.as_u16(),
                    url,
                });
            }
            return Err(SonarError::ApiStatus {
                status: status.as_u16(),
                url,
                body: truncate_response(&body),
            });
        }

        debug!("GET {url} returned {} bytes", body.len());
        Ok(body)
    }
}

impl Transport for SonarClient {
    async fn get_text(&self, api_path: &str) -> Result<String, SonarError> {
        self.get(api_path).await
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn client_for(base_url: &str) -> SonarClient {
        SonarClient::new(SonarConfig::new("token".to_string()).with_base_url(base_url))
            .expect("client should build")
    }

    #[test]
    fn test_api_url_joins_base_and_path() {
        let client = client_for("https://sonarcloud.io");
        assert_eq!(
            client.api_url("server/version"),
            "https://sonarcloud.io/api/server/version"
        );
    }

    #[test]
    fn test_api_url_tolerates_extra_slashes() {
        let client = client_for("https://sonar.example.com/");
        assert_eq!(
            client.api_url("/issues/search?p=1&ps=500"),
            "https://sonar.example.com/api/issues/search?p=1&ps=500"
        );
    }

    #[test]
    fn test_api_url_keeps_context_path() {
        let client = client_for("https://example.com/sonarqube");
        assert_eq!(
            client.api_url("hotspots/search"),
            "https://example.com/sonarqube/api/hotspots/search"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = SonarClient::new(SonarConfig::new("t".to_string()).with_base_url("not a url"));
        assert!(matches!(result, Err(SonarError::InvalidConfig(_))));

        let result =
            SonarClient::new(SonarConfig::new("t".to_string()).with_base_url("ftp://example.com"));
        assert!(matches!(result, Err(SonarError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let result = SonarClient::new(SonarConfig::new("t".to_string()).with_page_size(0));
        assert!(matches!(result, Err(SonarError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let result =
            SonarClient::new(SonarConfig::new("t".to_string()).with_proxy("http://[::1"));
        assert!(matches!(result, Err(SonarError::InvalidConfig(_))));
    }

    #[test]
    fn test_findings_api_uses_configured_page_size() {
        let client = SonarClient::new(SonarConfig::new("t".to_string()).with_page_size(250))
            .expect("client should build");
        assert_eq!(client.findings_api().page_size(), 250);
    }
}
