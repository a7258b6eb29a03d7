//! Change-set submission.
//!
//! [`SyncEngine`] wires the stages together:
//!
//! ```text
//! filter → sort → validate → re-sort → apply (runs / chunks / barriers) → aggregate
//! ```
//!
//! An engine is cheap to share behind an `Arc`; every submission gets its
//! own [`ApplyEngine`] but they all share the engine's quarantine cache.

use std::sync::Arc;
use std::time::Duration;

use yamlsync_core::{Change, EntityId, ProcessingOrder, SyncConfig};

use crate::apply::ApplyEngine;
use crate::error::SyncError;
use crate::filter::filter_managed;
use crate::handler::{ApplyContext, HandlerRegistry};
use crate::invalidation::{AuthCache, CacheInvalidator, NoopAuthCache};
use crate::observer::{NoopObserver, SyncObserver};
use crate::order::sort_by_processing_order;
use crate::policy::{DefaultTypePolicy, TypePolicy};
use crate::quarantine::QuarantineCache;
use crate::report::{aggregate, FileOperationStatus, OperationResponse};
use crate::unit::ApplicationUnit;
use crate::validate::Validator;

/// Document submitted with path-only deletes.
pub const DELETE_PLACEHOLDER: &str = "harnessApiVersion: '1.0'";

/// Builder for [`SyncEngine`].
pub struct SyncEngineBuilder {
    config: SyncConfig,
    order: Option<Arc<ProcessingOrder>>,
    registry: HandlerRegistry,
    quarantine: Option<Arc<QuarantineCache>>,
    auth_cache: Arc<dyn AuthCache>,
    observer: Arc<dyn SyncObserver>,
    policy: Arc<dyn TypePolicy>,
}

impl Default for SyncEngineBuilder {
    fn default() -> Self {
        Self {
            config: SyncConfig::default(),
            order: None,
            registry: HandlerRegistry::new(),
            quarantine: None,
            auth_cache: Arc::new(NoopAuthCache),
            observer: Arc::new(NoopObserver),
            policy: Arc::new(DefaultTypePolicy),
        }
    }
}

impl SyncEngineBuilder {
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Processing order; defaults to [`ProcessingOrder::standard`].
    pub fn order(mut self, order: Arc<ProcessingOrder>) -> Self {
        self.order = Some(order);
        self
    }

    pub fn handlers(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Share a quarantine cache with other engines. Defaults to a private
    /// cache with the configured TTL.
    pub fn quarantine(mut self, quarantine: Arc<QuarantineCache>) -> Self {
        self.quarantine = Some(quarantine);
        self
    }

    pub fn auth_cache(mut self, auth_cache: Arc<dyn AuthCache>) -> Self {
        self.auth_cache = auth_cache;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn policy(mut self, policy: Arc<dyn TypePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<SyncEngine, SyncError> {
        self.config.validate()?;
        let order = match self.order {
            Some(order) => order,
            None => Arc::new(ProcessingOrder::standard()?),
        };
        let quarantine = self
            .quarantine
            .unwrap_or_else(|| Arc::new(QuarantineCache::new(self.config.quarantine_ttl())));
        Ok(SyncEngine {
            config: self.config,
            order,
            registry: self.registry,
            quarantine,
            invalidator: Arc::new(CacheInvalidator::new(self.auth_cache)),
            observer: self.observer,
            policy: self.policy,
        })
    }
}

/// Configuration change-set synchronization engine.
pub struct SyncEngine {
    config: SyncConfig,
    order: Arc<ProcessingOrder>,
    registry: HandlerRegistry,
    quarantine: Arc<QuarantineCache>,
    invalidator: Arc<CacheInvalidator>,
    observer: Arc<dyn SyncObserver>,
    policy: Arc<dyn TypePolicy>,
}

impl SyncEngine {
    pub fn builder() -> SyncEngineBuilder {
        SyncEngineBuilder::default()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn order(&self) -> &ProcessingOrder {
        &self.order
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn quarantine(&self) -> &Arc<QuarantineCache> {
        &self.quarantine
    }

    /// Apply a change set. Returns the applied units in apply order, or a
    /// [`SyncError::Batch`] listing every failed file.
    ///
    /// Files outside the managed root, legacy types and quarantined commits
    /// are dropped without a failure.
    pub async fn process_change_set(
        &self,
        ctx: &ApplyContext,
        changes: Vec<Change>,
        vcs_sync: bool,
    ) -> Result<Vec<ApplicationUnit>, SyncError> {
        tracing::info!(
            tenant = %ctx.tenant_id,
            changes = changes.len(),
            vcs_sync,
            "processing change set"
        );
        let submitted = changes.clone();
        let purged = self.quarantine.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "dropped expired quarantine entries");
        }

        let managed = filter_managed(changes, &self.config.managed_root);
        let sorted = sort_by_processing_order(managed, &self.order);
        let mut validation_failures = sorted.failures;

        let validated = Validator::new(&self.registry, &self.quarantine, self.policy.as_ref())
            .validate(sorted.changes);
        validation_failures.extend(validated.failures);

        let engine = ApplyEngine::new(
            self.config.max_parallel,
            Arc::clone(&self.quarantine),
            Arc::clone(&self.invalidator),
            Arc::clone(&self.observer),
        );
        let (applied, apply_failures) = engine
            .apply(ctx, validated.units, vcs_sync)
            .await
            .into_applied();

        let applied = aggregate(validation_failures, apply_failures, applied, submitted)?;
        tracing::info!(
            tenant = %ctx.tenant_id,
            applied = applied.len(),
            "change set processed"
        );
        Ok(applied)
    }

    /// [`Self::process_change_set`] with a wall-clock limit. On expiry the
    /// context is cancelled and in-flight work is dropped.
    pub async fn process_with_timeout(
        &self,
        ctx: &ApplyContext,
        changes: Vec<Change>,
        vcs_sync: bool,
        timeout: Duration,
    ) -> Result<Vec<ApplicationUnit>, SyncError> {
        let work = self.process_change_set(ctx, changes, vcs_sync);
        match tokio::time::timeout(timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                ctx.cancel.cancel();
                tracing::warn!(tenant = %ctx.tenant_id, ?timeout, "change set timed out");
                Err(SyncError::Timeout(timeout))
            }
        }
    }

    /// Apply an uploaded bundle of files within the configured upload timeout
    /// and report every file's status.
    pub async fn process_upload(
        &self,
        ctx: &ApplyContext,
        changes: Vec<Change>,
    ) -> Result<OperationResponse, SyncError> {
        let submitted = changes.clone();
        let timeout = self.config.upload_timeout();
        match self.process_with_timeout(ctx, changes, false, timeout).await {
            Ok(applied) => Ok(OperationResponse::success(&applied, &submitted)),
            Err(SyncError::Batch(failure)) => Ok(OperationResponse::failure(&failure)),
            Err(e) => Err(e),
        }
    }

    /// Create or update a single file.
    pub async fn upsert_file(
        &self,
        ctx: &ApplyContext,
        path: &str,
        content: &str,
    ) -> Result<FileOperationStatus, SyncError> {
        if content.is_empty() {
            return Err(SyncError::EmptyContent {
                path: path.to_string(),
            });
        }
        let change = Change::add(path, content, ctx.tenant_id.clone());
        match self.process_change_set(ctx, vec![change], false).await {
            Ok(applied) => match applied.into_iter().next() {
                Some(unit) => {
                    tracing::info!(path, entity_id = ?unit.entity_id, "upserted file");
                    let ApplicationUnit { change, entity_id, .. } = unit;
                    Ok(FileOperationStatus::success(change.file_path, entity_id))
                }
                None => Err(SyncError::NothingProcessed {
                    path: path.to_string(),
                }),
            },
            Err(SyncError::Batch(failure)) => match failure.failures.into_iter().next() {
                Some((failed_path, record)) => {
                    Ok(FileOperationStatus::failed(failed_path, record.message))
                }
                None => Err(SyncError::NothingProcessed {
                    path: path.to_string(),
                }),
            },
            Err(e) => Err(e),
        }
    }

    /// Delete the entities at `paths`.
    pub async fn delete_paths(
        &self,
        ctx: &ApplyContext,
        paths: &[&str],
    ) -> Result<OperationResponse, SyncError> {
        let changes: Vec<Change> = paths
            .iter()
            .map(|path| {
                Change::delete(*path, ctx.tenant_id.clone()).with_content(DELETE_PLACEHOLDER)
            })
            .collect();
        let submitted = changes.clone();
        match self.process_change_set(ctx, changes, false).await {
            Ok(applied) => Ok(OperationResponse::success(&applied, &submitted)),
            Err(SyncError::Batch(failure)) => {
                tracing::warn!(tenant = %ctx.tenant_id, error = %failure, "delete by paths failed");
                Ok(OperationResponse::failure(&failure))
            }
            Err(e) => Err(e),
        }
    }

    /// Modify a single file, optionally checking it still describes `entity_id`.
    pub async fn update(
        &self,
        ctx: &ApplyContext,
        path: &str,
        content: &str,
        entity_id: Option<EntityId>,
    ) -> Result<ApplicationUnit, SyncError> {
        let mut change = Change::modify(path, content, ctx.tenant_id.clone());
        change.entity_id = entity_id;
        match self.process_change_set(ctx, vec![change], false).await {
            Ok(applied) => applied.into_iter().next().ok_or_else(|| SyncError::NothingProcessed {
                path: path.to_string(),
            }),
            Err(SyncError::Batch(failure)) => Err(SyncError::UpdateFailed {
                path: path.to_string(),
                reason: failure
                    .message_for(path)
                    .unwrap_or("Internal error")
                    .to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("quarantine", &self.quarantine)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_rejects_invalid_config() {
        let config = SyncConfig {
            max_parallel: 0,
            ..SyncConfig::default()
        };
        let err = SyncEngine::builder().config(config).build().unwrap_err();
        assert!(matches!(err, SyncError::Config(_)), "got: {err}");
    }

    #[test]
    fn default_build_uses_standard_order() {
        let engine = SyncEngine::builder().build().expect("engine");
        assert_eq!(engine.order().len(), yamlsync_core::catalog::STANDARD_ORDER.len());
        assert_eq!(engine.quarantine().ttl(), Duration::from_secs(1800));
    }

    #[tokio::test]
    async fn empty_change_set_is_a_no_op() {
        let engine = SyncEngine::builder().build().expect("engine");
        let applied = engine
            .process_change_set(&ApplyContext::new("acc"), Vec::new(), false)
            .await
            .expect("empty set");
        assert!(applied.is_empty());
    }

    #[tokio::test]
    async fn empty_upsert_is_rejected() {
        let engine = SyncEngine::builder().build().expect("engine");
        let err = engine
            .upsert_file(&ApplyContext::new("acc"), "Setup/Tags.yaml", "")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::EmptyContent { .. }));
    }
}
