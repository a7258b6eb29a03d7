//! Concurrent application of validated units.
//!
//! Units arrive in dependency order. Consecutive units sharing an entity type
//! and change type form a run; a run is applied in chunks of at most
//! `max_parallel` concurrent tasks. Each chunk is fully joined before the next
//! one starts, so an entity never races a dependency from an earlier run, and
//! the auth cache is invalidated after every chunk.
//!
//! A failing unit never stops the batch: its error is recorded against its
//! path and the remaining units still run.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinSet;

use yamlsync_core::{ChangeType, EntityId, EntityType, FailureMap, FailureRecord, TenantId};

use crate::handler::{ApplyContext, HandlerError};
use crate::invalidation::CacheInvalidator;
use crate::observer::{ActivityEntry, SyncObserver};
use crate::quarantine::QuarantineCache;
use crate::unit::ApplicationUnit;

pub const ENTITY_ID_MISMATCH: &str =
    "The entity Id provided in the request and the entity Id of the Yaml doesn't match";

/// Result of applying a single unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Applied(Option<EntityId>),
    /// The unit's commit was quarantined earlier in the batch.
    Skipped,
    Failed,
}

/// Output of [`ApplyEngine::apply`]. `outcomes[i]` belongs to `units[i]`.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub units: Vec<ApplicationUnit>,
    pub outcomes: Vec<UnitOutcome>,
    pub failures: FailureMap,
}

impl ApplyReport {
    /// Applied units with their produced entity ids, in apply order.
    pub fn into_applied(self) -> (Vec<ApplicationUnit>, FailureMap) {
        let applied = self
            .units
            .into_iter()
            .zip(self.outcomes)
            .filter_map(|(mut unit, outcome)| match outcome {
                UnitOutcome::Applied(entity_id) => {
                    unit.entity_id = entity_id;
                    Some(unit)
                }
                UnitOutcome::Skipped | UnitOutcome::Failed => None,
            })
            .collect();
        (applied, self.failures)
    }
}

/// Applies units with bounded parallelism and per-chunk barriers.
#[derive(Clone)]
pub struct ApplyEngine {
    max_parallel: usize,
    quarantine: Arc<QuarantineCache>,
    invalidator: Arc<CacheInvalidator>,
    observer: Arc<dyn SyncObserver>,
}

impl ApplyEngine {
    pub fn new(
        max_parallel: usize,
        quarantine: Arc<QuarantineCache>,
        invalidator: Arc<CacheInvalidator>,
        observer: Arc<dyn SyncObserver>,
    ) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
            quarantine,
            invalidator,
            observer,
        }
    }

    pub async fn apply(
        &self,
        ctx: &ApplyContext,
        units: Vec<ApplicationUnit>,
        vcs_sync: bool,
    ) -> ApplyReport {
        let total = units.len();
        let units = Arc::new(units);
        let mut outcomes = vec![UnitOutcome::Failed; total];
        let mut failures = FailureMap::new();

        for (entity_type, change_type, run) in runs(&units) {
            for chunk in run.chunks(self.max_parallel) {
                tracing::debug!(
                    %entity_type,
                    %change_type,
                    size = chunk.len(),
                    "applying chunk"
                );
                self.apply_chunk(ctx, &units, chunk, vcs_sync, &mut outcomes, &mut failures)
                    .await;
                for tenant_id in chunk_tenants(&units, chunk) {
                    self.invalidator
                        .invalidate(tenant_id, entity_type, change_type);
                }
            }
        }

        let units = Arc::try_unwrap(units).unwrap_or_else(|shared| (*shared).clone());
        ApplyReport {
            units,
            outcomes,
            failures,
        }
    }

    /// Spawn every unit of `chunk` and wait for all of them.
    async fn apply_chunk(
        &self,
        ctx: &ApplyContext,
        units: &Arc<Vec<ApplicationUnit>>,
        chunk: &[usize],
        vcs_sync: bool,
        outcomes: &mut [UnitOutcome],
        failures: &mut FailureMap,
    ) {
        let mut tasks = JoinSet::new();
        for &idx in chunk {
            let engine = self.clone();
            let ctx = ctx.clone();
            let units = Arc::clone(units);
            tasks.spawn(async move {
                let result = AssertUnwindSafe(engine.apply_unit(&ctx, &units, idx, vcs_sync))
                    .catch_unwind()
                    .await;
                (idx, result)
            });
        }

        let mut pending: HashSet<usize> = chunk.iter().copied().collect();
        while let Some(joined) = tasks.join_next().await {
            let (idx, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!(error = %e, "apply task did not complete");
                    continue;
                }
            };
            pending.remove(&idx);
            let outcome = match result {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(message)) => {
                    record(failures, &units[idx], message);
                    UnitOutcome::Failed
                }
                Err(_) => {
                    tracing::error!(path = %units[idx].path(), "handler panicked");
                    record(failures, &units[idx], "Internal error: handler panicked");
                    UnitOutcome::Failed
                }
            };
            outcomes[idx] = outcome;
        }
        for idx in pending {
            record(failures, &units[idx], "Internal error: apply task did not complete");
        }
    }

    /// Apply one unit. `Err` carries the failure message.
    async fn apply_unit(
        &self,
        ctx: &ApplyContext,
        units: &[ApplicationUnit],
        idx: usize,
        vcs_sync: bool,
    ) -> Result<UnitOutcome, String> {
        let unit = &units[idx];
        let change = &unit.change;

        if let Some(commit_id) = &change.commit_id {
            if self.quarantine.exceeded_limit(commit_id, &change.tenant_id) {
                tracing::debug!(
                    path = %unit.path(),
                    commit = %commit_id,
                    "skipping quarantined commit"
                );
                return Ok(UnitOutcome::Skipped);
            }
        }
        if ctx.is_cancelled() {
            return Err("Processing cancelled".to_string());
        }

        let result = match change.change_type {
            ChangeType::Add | ChangeType::Modify => match check_entity_id(ctx, unit).await {
                Ok(()) => unit.handler.upsert(ctx, unit, units).await,
                Err(e) => Err(e),
            },
            ChangeType::Delete => unit.handler.delete(ctx, unit).await.map(|()| None),
            ChangeType::Rename => Ok(None),
        };

        match result {
            Ok(entity_id) => {
                tracing::debug!(path = %unit.path(), change_type = %change.change_type, "applied");
                self.observer.file_processed(change, vcs_sync);
                if let Some(commit_id) = change.vcs_commit() {
                    self.observer
                        .log_activity(&ActivityEntry::success(commit_id.clone(), change));
                }
                Ok(UnitOutcome::Applied(entity_id))
            }
            Err(e) => {
                if let (HandlerError::QuotaExceeded(_), Some(commit_id)) = (&e, &change.commit_id) {
                    if !commit_id.0.is_empty() {
                        self.quarantine.mark_exceeded(commit_id, &change.tenant_id);
                    }
                }
                let message = e.to_string();
                tracing::warn!(path = %unit.path(), error = %message, "apply failed");
                if let Some(commit_id) = change.vcs_commit() {
                    self.observer
                        .log_activity(&ActivityEntry::failed(commit_id.clone(), change, &message));
                }
                Err(message)
            }
        }
    }
}

impl std::fmt::Debug for ApplyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyEngine")
            .field("max_parallel", &self.max_parallel)
            .finish_non_exhaustive()
    }
}

/// Distinct tenants owning the units of `chunk`, in first-seen order.
fn chunk_tenants<'u>(units: &'u [ApplicationUnit], chunk: &[usize]) -> Vec<&'u TenantId> {
    let mut tenants: Vec<&TenantId> = Vec::new();
    for &idx in chunk {
        let tenant_id = &units[idx].change.tenant_id;
        if !tenants.contains(&tenant_id) {
            tenants.push(tenant_id);
        }
    }
    tenants
}

fn record(failures: &mut FailureMap, unit: &ApplicationUnit, message: impl Into<String>) {
    failures.insert(
        unit.path().to_string(),
        FailureRecord::new(unit.change.clone(), message),
    );
}

/// Reject an upsert whose caller-supplied entity id disagrees with the stored one.
async fn check_entity_id(ctx: &ApplyContext, unit: &ApplicationUnit) -> Result<(), HandlerError> {
    let Some(expected) = &unit.change.entity_id else {
        return Ok(());
    };
    if matches!(
        unit.entity_type,
        EntityType::Tag | EntityType::ApplicationDefaults | EntityType::AccountDefaults
    ) {
        return Ok(());
    }
    match unit.handler.current_entity_id(ctx, unit).await {
        Ok(Some(current)) if &current != expected => {
            Err(HandlerError::Rejected(ENTITY_ID_MISMATCH.to_string()))
        }
        Ok(_) | Err(HandlerError::Unsupported) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Maximal runs of consecutive units sharing `(entity_type, change_type)`,
/// as index lists.
fn runs(units: &[ApplicationUnit]) -> Vec<(EntityType, ChangeType, Vec<usize>)> {
    let mut runs: Vec<(EntityType, ChangeType, Vec<usize>)> = Vec::new();
    for (idx, unit) in units.iter().enumerate() {
        match runs.last_mut() {
            Some((entity_type, change_type, members))
                if *entity_type == unit.entity_type && *change_type == unit.change_type() =>
            {
                members.push(idx);
            }
            _ => runs.push((unit.entity_type, unit.change_type(), vec![idx])),
        }
    }
    runs
}
