//! Error types for yamlsync-engine.

use std::time::Duration;

use thiserror::Error;

use yamlsync_core::{CatalogError, ConfigError};

use crate::report::BatchFailure;

/// All errors a caller of the engine can observe.
#[derive(Debug, Error)]
pub enum SyncError {
    /// One or more files failed validation or apply. Carries every failure.
    #[error("{0}")]
    Batch(Box<BatchFailure>),

    /// A timeout-bounded submission did not finish in time.
    #[error("change set processing timed out after {0:?}")]
    Timeout(Duration),

    /// A single-file upsert was given an empty document.
    #[error("input yaml for {path} cannot be empty")]
    EmptyContent { path: String },

    /// A single-file submission produced no applied unit (outside the
    /// managed root, skipped, or quarantined).
    #[error("no change was processed for {path}")]
    NothingProcessed { path: String },

    /// A single-file update failed; `reason` is the file's failure message.
    #[error("Update failed. Reason: {reason}")]
    UpdateFailed { path: String, reason: String },

    /// An error building the processing order.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// An invalid engine configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl SyncError {
    /// The aggregated batch failure, if this is one.
    pub fn batch(&self) -> Option<&BatchFailure> {
        match self {
            SyncError::Batch(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<BatchFailure> for SyncError {
    fn from(failure: BatchFailure) -> Self {
        SyncError::Batch(Box::new(failure))
    }
}
