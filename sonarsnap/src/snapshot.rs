//! Snapshot driver: fetch, assemble, name and write the results file
use crate::config::SnapshotOptions;
use crate::error::Result;
use crate::output::{result_file_name, write_results_file};
use crate::project_version::read_project_version;
use log::info;
use sonarcloud_api::{FindingsAccumulator, FindingsApi, Transport, server_version};
use std::path::PathBuf;

/// Outcome of a successful snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotReport {
    pub path: PathBuf,
    pub project_version: String,
    pub server_version: String,
    pub issues: usize,
    pub hotspots: usize,
}

/// Fetch every vulnerability issue, then every security hotspot, of the configured project.
///
/// # Errors
///
/// Returns the first fetch error; nothing is retried.
pub async fn collect_findings<T: Transport>(
    transport: &T,
    options: &SnapshotOptions,
) -> Result<FindingsAccumulator> {
    let api = FindingsApi::new(transport, options.page_size);
    let scope = options.scope();
    let mut findings = FindingsAccumulator::new();

    let issues = api.fetch_issues(&scope, &mut findings).await?;
    info!(
        "Issue search: {} results over {} page(s)",
        issues.total_results, issues.pages
    );

    let hotspots = api.fetch_hotspots(&scope, &mut findings).await?;
    info!(
        "Hotspot search: {} results over {} page(s)",
        hotspots.total_results, hotspots.pages
    );

    Ok(findings)
}

/// Take one snapshot and write it to the output directory.
///
/// The project version is read before any request so a bad `pom.xml` fails fast, and the
/// document is fully assembled before the results file is touched.
///
/// # Errors
///
/// Returns the first error from version discovery, fetching, assembly or writing.
pub async fn run_snapshot<T: Transport>(
    transport: &T,
    options: &SnapshotOptions,
) -> Result<SnapshotReport> {
    let project_version = read_project_version(&options.pom_path)?;
    info!(
        "Snapshotting {} / {} (project version {project_version})",
        options.organization, options.project_key
    );

    let findings = collect_findings(transport, options).await?;
    let (issues, hotspots) = findings.counts();
    let document = findings.to_document()?;

    let server_version = server_version(transport).await?;
    let file_name = result_file_name(&project_version, &server_version)?;
    let path = write_results_file(&options.output_dir, &file_name, &document)?;

    Ok(SnapshotReport {
        path,
        project_version,
        server_version,
        issues,
        hotspots,
    })
}
