//! Dependency-order sorting.
//!
//! Sort key is `sign(change_type) × rank`: additions and modifications run in
//! ascending rank (dependencies first), deletions run in descending rank
//! (dependents first) and all deletions precede all other changes. The sort
//! is stable, so ties keep their input order.

use yamlsync_core::{Change, ChangeType, EntityType, FailureMap, FailureRecord, ProcessingOrder};


/// A change with its resolved entity type and rank.
#[derive(Debug, Clone)]
pub struct ClassifiedChange {
    pub change: Change,
    pub entity_type: EntityType,
    pub rank: usize,
}

impl ClassifiedChange {
    pub fn sort_key(&self) -> i64 {
        signed_rank(self.change.change_type, self.rank)
    }
}

/// Output of [`sort_by_processing_order`].
#[derive(Debug, Default)]
pub struct Sorted {
    pub changes: Vec<ClassifiedChange>,
    /// Changes whose path matched no entity type.
    pub failures: FailureMap,
}

pub fn signed_rank(change_type: ChangeType, rank: usize) -> i64 {
    change_type.sign() * rank as i64
}

/// Classify every change and stably sort by signed rank.
pub fn sort_by_processing_order(changes: Vec<Change>, order: &ProcessingOrder) -> Sorted {
    let mut sorted = Sorted::default();
    for change in changes {
        match order.classify_ranked(&change.file_path) {
            Some((entity_type, rank)) => sorted.changes.push(ClassifiedChange {
                change,
                entity_type,
                rank,
            }),
            None => {
                let message = format!("Unknown yaml type for path: {}", change.file_path);
                tracing::warn!(path = %change.file_path, "unclassified change");
                sorted
                    .failures
                    .insert(change.file_path.clone(), FailureRecord::new(change, message));
            }
        }
    }
    sorted.changes.sort_by_key(ClassifiedChange::sort_key);
    sorted
}
