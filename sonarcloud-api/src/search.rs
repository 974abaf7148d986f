//! Issue and hotspot searches for one project
//!
//! [`ProjectScope`] assembles the fixed query strings for `issues/search` (vulnerabilities
//! only) and `hotspots/search`; [`FindingsApi`] runs them through the paged fetcher and
//! collects the fragments.

use log::{debug, info};
use std::borrow::Cow;

use crate::aggregate::FindingsAccumulator;
use crate::client::Transport;
use crate::paging::{PageSummary, fetch_all_pages};
use crate::SonarError;

/// Language filter applied to the issue search unless overridden.
pub const DEFAULT_LANGUAGES: &str = "java";

/// Which project (and optionally branch and directories) to search.
#[derive(Debug, Clone)]
pub struct ProjectScope<'a> {
    /// Organization key
    pub organization: Cow<'a, str>,
    /// Project key
    pub project_key: Cow<'a, str>,
    /// Branch name, default branch when absent
    pub branch: Option<Cow<'a, str>>,
    /// Comma-separated directory filter for issues
    pub directories: Option<Cow<'a, str>>,
    /// Comma-separated language filter for issues
    pub languages: Option<Cow<'a, str>>,
}

impl<'a> ProjectScope<'a> {
    /// Create a scope for the default branch with the default language filter
    #[must_use]
    pub fn new(organization: &'a str, project_key: &'a str) -> Self {
        Self {
            organization: Cow::Borrowed(organization),
            project_key: Cow::Borrowed(project_key),
            branch: None,
            directories: None,
            languages: Some(Cow::Borrowed(DEFAULT_LANGUAGES)),
        }
    }

    /// Restrict both searches to a branch
    #[must_use]
    pub fn with_branch(mut self, branch: &'a str) -> Self {
        self.branch = Some(Cow::Borrowed(branch));
        self
    }

    /// Restrict the issue search to directories
    #[must_use]
    pub fn with_directories(mut self, directories: &'a str) -> Self {
        self.directories = Some(Cow::Borrowed(directories));
        self
    }

    /// Replace the issue language filter; a blank value removes it
    #[must_use]
    pub fn with_languages(mut self, languages: &'a str) -> Self {
        self.languages = Some(Cow::Borrowed(languages));
        self
    }

    /// `issues/search` path and query, without paging parameters
    #[must_use]
    pub fn issues_path(&self) -> String {
        let mut path = format!(
            "issues/search?organization={}&types=VULNERABILITY&projects={}",
            urlencoding::encode(&self.organization),
            urlencoding::encode(&self.project_key)
        );
        push_optional(&mut path, "languages", self.languages.as_deref());
        push_optional(&mut path, "branch", self.branch.as_deref());
        push_optional(&mut path, "directories", self.directories.as_deref());
        path
    }

    /// `hotspots/search` path and query, without paging parameters
    #[must_use]
    pub fn hotspots_path(&self) -> String {
        let mut path = format!(
            "hotspots/search?organization={}&projectKey={}",
            urlencoding::encode(&self.organization),
            urlencoding::encode(&self.project_key)
        );
        push_optional(&mut path, "branch", self.branch.as_deref());
        path
    }
}

fn push_optional(path: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value
        && !value.trim().is_empty()
    {
        path.push('&');
        path.push_str(name);
        path.push('=');
        path.push_str(&urlencoding::encode(value));
    }
}

/// Findings searches over any [`Transport`]
pub struct FindingsApi<'t, T: Transport> {
    transport: &'t T,
    page_size: u32,
}

impl<'t, T: Transport> FindingsApi<'t, T> {
    /// Create a findings API that requests `page_size` results per page
    #[must_use]
    pub fn new(transport: &'t T, page_size: u32) -> Self {
        Self {
            transport,
            page_size,
        }
    }

    /// Requested page size
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch every vulnerability issue of the project into `findings`.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`fetch_all_pages`].
    pub async fn fetch_issues(
        &self,
        scope: &ProjectScope<'_>,
        findings: &mut FindingsAccumulator,
    ) -> Result<PageSummary, SonarError> {
        let path = scope.issues_path();
        debug!("Fetching issues: {path}");

        let summary = fetch_all_pages(self.transport, &path, self.page_size, |page| {
            findings.add_issues_page(page);
        })
        .await?;

        info!(
            "Collected {} vulnerability issues for {}",
            findings.issues().len(),
            scope.project_key
        );
        Ok(summary)
    }

    /// Fetch every security hotspot of the project into `findings`.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`fetch_all_pages`].
    pub async fn fetch_hotspots(
        &self,
        scope: &ProjectScope<'_>,
        findings: &mut FindingsAccumulator,
    ) -> Result<PageSummary, SonarError> {
        let path = scope.hotspots_path();
        debug!("Fetching hotspots: {path}");

        let summary = fetch_all_pages(self.transport, &path, self.page_size, |page| {
            findings.add_hotspots_page(page);
        })
        .await?;

        info!(
            "Collected {} security hotspots for {}",
            findings.hotspots().len(),
            scope.project_key
        );
        Ok(summary)
    }
}
