//! Results file naming and all-or-nothing writing
use crate::error::{Result, SnapshotError};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// File name for a snapshot of `project_version` taken from server `server_version`.
///
/// # Errors
///
/// Returns [`SnapshotError::InvalidConfig`] if either version is blank or would escape
/// the output directory.
pub fn result_file_name(project_version: &str, server_version: &str) -> Result<String> {
    for (label, value) in [
        ("project version", project_version),
        ("server version", server_version),
    ] {
        if value.trim().is_empty() {
            return Err(SnapshotError::InvalidConfig(format!("{label} is blank")));
        }
        if value.contains(['/', '\\']) || value.contains("..") {
            return Err(SnapshotError::InvalidConfig(format!(
                "{label} '{value}' cannot be used in a file name"
            )));
        }
    }

    Ok(format!(
        "Benchmark_{project_version}-sonarqube-v{server_version}.json"
    ))
}

/// Write `document` to `output_dir/file_name`, creating the directory if needed.
///
/// The content goes to a hidden sibling first and is renamed into place, so the target
/// is either the complete document or untouched.
///
/// # Errors
///
/// Returns [`SnapshotError::Io`] if the directory cannot be created or the file cannot be
/// written or renamed.
pub fn write_results_file(output_dir: &Path, file_name: &str, document: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let target = output_dir.join(file_name);
    let staging = output_dir.join(format!(".{file_name}.partial"));

    debug!("Writing results to: {}", staging.display());
    if let Err(e) = fs::write(&staging, document).and_then(|()| fs::rename(&staging, &target)) {
        if let Err(cleanup) = fs::remove_file(&staging)
            && staging.exists()
        {
            warn!(
                "Failed to remove partial results file {}: {cleanup}",
                staging.display()
            );
        }
        return Err(e.into());
    }

    info!(
        "Results written to: {} ({} bytes)",
        target.display(),
        document.len()
    );
    Ok(target)
}
