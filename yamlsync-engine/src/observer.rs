//! Per-file outcome reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

use yamlsync_core::{Change, CommitId, TenantId};

/// Outcome of applying one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityStatus {
    Success,
    Failed,
}

/// Activity record for a file read from a VCS commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    pub commit_id: CommitId,
    pub file_path: String,
    pub status: ActivityStatus,
    pub message: Option<String>,
    pub tenant_id: TenantId,
    pub recorded_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn success(commit_id: CommitId, change: &Change) -> Self {
        Self::new(commit_id, change, ActivityStatus::Success, None)
    }

    pub fn failed(commit_id: CommitId, change: &Change, message: impl Into<String>) -> Self {
        Self::new(commit_id, change, ActivityStatus::Failed, Some(message.into()))
    }

    fn new(
        commit_id: CommitId,
        change: &Change,
        status: ActivityStatus,
        message: Option<String>,
    ) -> Self {
        Self {
            commit_id,
            file_path: change.file_path.clone(),
            status,
            message,
            tenant_id: change.tenant_id.clone(),
            recorded_at: Utc::now(),
        }
    }
}

/// Receives per-file outcomes from the apply engine.
///
/// Called from worker tasks; implementations must be thread-safe.
pub trait SyncObserver: Send + Sync {
    /// A file was applied. `vcs_sync` is true when the run came from VCS
    /// synchronization, so stale sync errors for the path can be cleared.
    fn file_processed(&self, _change: &Change, _vcs_sync: bool) {}

    /// Activity for a change with VCS provenance.
    fn log_activity(&self, _entry: &ActivityEntry) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}
