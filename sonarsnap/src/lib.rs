//! Sonarsnap library - SonarCloud findings snapshots
//!
//! This library provides the pieces behind the `sonarsnap` binary: argument and
//! environment handling, `pom.xml` version discovery, the snapshot driver and the
//! results file writer.
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod project_version;
pub mod snapshot;

// Re-export commonly used types
pub use config::SnapshotOptions;
pub use error::{Result, SnapshotError};
pub use snapshot::{SnapshotReport, run_snapshot};
