//! Managed-namespace filter.

use yamlsync_core::Change;

/// Keep only changes whose path lies under `root` (e.g. `"Setup/"`).
pub fn filter_managed(changes: Vec<Change>, root: &str) -> Vec<Change> {
    let before = changes.len();
    let kept: Vec<Change> = changes
        .into_iter()
        .filter(|change| change.file_path.starts_with(root))
        .collect();
    if kept.len() != before {
        tracing::debug!(
            dropped = before - kept.len(),
            root,
            "ignored changes outside the managed root"
        );
    }
    kept
}
