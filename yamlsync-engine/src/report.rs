//! Batch result aggregation and per-file operation reports.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use yamlsync_core::{Change, EntityId, FailureMap};

use crate::unit::ApplicationUnit;

// ---------------------------------------------------------------------------
// Batch failure
// ---------------------------------------------------------------------------

/// Every failure of a change set, with what did get applied.
#[derive(Debug)]
pub struct BatchFailure {
    pub failures: FailureMap,
    /// Units applied before and alongside the failures.
    pub units: Vec<ApplicationUnit>,
    /// The change set as submitted.
    pub changes: Vec<Change>,
}

impl BatchFailure {
    /// Failure message for `path`, if it failed.
    pub fn message_for(&self, path: &str) -> Option<&str> {
        self.failures.get(path).map(|record| record.message.as_str())
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} file(s) failed to sync", self.failures.len())?;
        for (path, record) in &self.failures {
            write!(f, "\n  {path}: {}", record.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchFailure {}

/// Merge validation and apply failures into the batch outcome.
///
/// A path failing in both keeps the validation message.
pub fn aggregate(
    validation_failures: FailureMap,
    apply_failures: FailureMap,
    units: Vec<ApplicationUnit>,
    changes: Vec<Change>,
) -> Result<Vec<ApplicationUnit>, BatchFailure> {
    let mut failures = apply_failures;
    failures.extend(validation_failures);
    if failures.is_empty() {
        return Ok(units);
    }
    tracing::error!(
        failed = failures.len(),
        applied = units.len(),
        "change set finished with failures"
    );
    Err(BatchFailure {
        failures,
        units,
        changes,
    })
}

// ---------------------------------------------------------------------------
// Operation reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileStatus {
    Success,
    Failed,
    Skipped,
}

/// Outcome of one file in a caller-facing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOperationStatus {
    pub path: String,
    pub status: FileStatus,
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<EntityId>,
}

impl FileOperationStatus {
    pub fn success(path: impl Into<String>, entity_id: Option<EntityId>) -> Self {
        Self {
            path: path.into(),
            status: FileStatus::Success,
            error_message: String::new(),
            entity_id,
        }
    }

    pub fn failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: FileStatus::Failed,
            error_message: message.into(),
            entity_id: None,
        }
    }

    pub fn skipped(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: FileStatus::Skipped,
            error_message: String::new(),
            entity_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Caller-facing outcome of a multi-file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResponse {
    pub status: ResponseStatus,
    pub error_message: String,
    pub files: Vec<FileOperationStatus>,
}

impl OperationResponse {
    /// Build from a batch that had no failures. Submitted files that were
    /// not applied are reported as skipped.
    pub fn success(applied: &[ApplicationUnit], submitted: &[Change]) -> Self {
        if applied.is_empty() {
            return Self {
                status: ResponseStatus::Failed,
                error_message: "No yaml files were processed.".to_string(),
                files: Vec::new(),
            };
        }
        let mut files = skipped(submitted, applied, &HashSet::new());
        files.extend(
            applied
                .iter()
                .map(|unit| FileOperationStatus::success(unit.path(), unit.entity_id.clone())),
        );
        Self {
            status: ResponseStatus::Success,
            error_message: String::new(),
            files,
        }
    }

    /// Build from a failed batch: failed files first, then skipped, then applied.
    pub fn failure(failure: &BatchFailure) -> Self {
        let failed: HashSet<&str> = failure.failures.keys().map(String::as_str).collect();
        let mut files: Vec<FileOperationStatus> = failure
            .failures
            .iter()
            .map(|(path, record)| FileOperationStatus::failed(path, &record.message))
            .collect();
        files.extend(skipped(&failure.changes, &failure.units, &failed));
        files.extend(
            failure
                .units
                .iter()
                .filter(|unit| !failed.contains(unit.path()))
                .map(|unit| FileOperationStatus::success(unit.path(), unit.entity_id.clone())),
        );
        Self {
            status: ResponseStatus::Failed,
            error_message: failure.to_string(),
            files,
        }
    }
}

fn skipped(
    submitted: &[Change],
    applied: &[ApplicationUnit],
    failed: &HashSet<&str>,
) -> Vec<FileOperationStatus> {
    let applied: HashSet<&str> = applied.iter().map(ApplicationUnit::path).collect();
    submitted
        .iter()
        .map(|change| change.file_path.as_str())
        .filter(|path| !applied.contains(path) && !failed.contains(path))
        .map(FileOperationStatus::skipped)
        .collect()
}
