//! Per-entity-type apply handlers and the registry that resolves them.
//!
//! The engine never knows what a change means for a business object; it
//! hands each [`ApplicationUnit`] to the handler registered for its entity
//! type (optionally narrowed by the document's `type` field).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use yamlsync_core::{EntityId, EntityType, TenantId};

use crate::unit::ApplicationUnit;

/// Who is applying a change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Explicit per-run context passed to every handler call.
#[derive(Debug, Clone)]
pub struct ApplyContext {
    pub tenant_id: TenantId,
    pub actor: Option<Actor>,
    /// Cancelled when the caller gives up on the run (e.g. a timeout).
    pub cancel: CancellationToken,
}

impl ApplyContext {
    pub fn new(tenant_id: impl Into<TenantId>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            actor: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Failure reported by a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A tenant-wide usage limit was hit; the source commit gets quarantined.
    #[error("Usage limits exceeded: {0}")]
    QuotaExceeded(String),

    /// The handler does not support this operation.
    #[error("operation not supported for this entity type")]
    Unsupported,

    /// The handler refused the change.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Create/update/delete capability for one entity type.
#[async_trait]
pub trait EntityHandler: Send + Sync {
    /// Create or update the entity described by `unit`.
    ///
    /// `batch` is every unit of the current change set, for handlers whose
    /// entity refers to siblings that are being created in the same set.
    async fn upsert(
        &self,
        ctx: &ApplyContext,
        unit: &ApplicationUnit,
        batch: &[ApplicationUnit],
    ) -> Result<Option<EntityId>, HandlerError>;

    async fn delete(&self, ctx: &ApplyContext, unit: &ApplicationUnit) -> Result<(), HandlerError>;

    /// Id of the entity currently stored at the unit's path.
    ///
    /// Handlers for entities that are not stored return `Unsupported`.
    async fn current_entity_id(
        &self,
        _ctx: &ApplyContext,
        _unit: &ApplicationUnit,
    ) -> Result<Option<EntityId>, HandlerError> {
        Err(HandlerError::Unsupported)
    }
}

type RegistryKey = (EntityType, Option<String>);

/// Map from entity type (and optional sub-type) to its handler.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<RegistryKey, Arc<dyn EntityHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every document of `entity_type`.
    pub fn register(
        &mut self,
        entity_type: EntityType,
        handler: Arc<dyn EntityHandler>,
    ) -> &mut Self {
        self.handlers.insert((entity_type, None), handler);
        self
    }

    /// Register `handler` for documents of `entity_type` whose `type` field is `sub_type`.
    pub fn register_sub_type(
        &mut self,
        entity_type: EntityType,
        sub_type: impl Into<String>,
        handler: Arc<dyn EntityHandler>,
    ) -> &mut Self {
        self.handlers
            .insert((entity_type, Some(sub_type.into())), handler);
        self
    }

    /// Sub-type registration wins; otherwise fall back to the type-wide handler.
    pub fn resolve(
        &self,
        entity_type: EntityType,
        sub_type: Option<&str>,
    ) -> Option<Arc<dyn EntityHandler>> {
        if let Some(sub_type) = sub_type {
            if let Some(handler) = self.handlers.get(&(entity_type, Some(sub_type.to_string()))) {
                return Some(Arc::clone(handler));
            }
        }
        self.handlers.get(&(entity_type, None)).map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.handlers.keys().collect();
        keys.sort();
        f.debug_struct("HandlerRegistry").field("handlers", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl EntityHandler for Named {
        async fn upsert(
            &self,
            _ctx: &ApplyContext,
            _unit: &ApplicationUnit,
            _batch: &[ApplicationUnit],
        ) -> Result<Option<EntityId>, HandlerError> {
            Ok(Some(EntityId::from(self.0)))
        }

        async fn delete(
            &self,
            _ctx: &ApplyContext,
            _unit: &ApplicationUnit,
        ) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[test]
    fn sub_type_registration_wins_over_type_wide() {
        let mut registry = HandlerRegistry::new();
        let wide: Arc<dyn EntityHandler> = Arc::new(Named("wide"));
        let aws: Arc<dyn EntityHandler> = Arc::new(Named("aws"));
        registry
            .register(EntityType::CloudProvider, Arc::clone(&wide))
            .register_sub_type(EntityType::CloudProvider, "AWS", Arc::clone(&aws));

        let resolved = registry
            .resolve(EntityType::CloudProvider, Some("AWS"))
            .expect("resolved");
        assert!(Arc::ptr_eq(&resolved, &aws));

        let fallback = registry
            .resolve(EntityType::CloudProvider, Some("GCP"))
            .expect("fallback");
        assert!(Arc::ptr_eq(&fallback, &wide));
    }

    #[test]
    fn unknown_type_resolves_to_none() {
        let registry = HandlerRegistry::new();
        assert!(registry.resolve(EntityType::Workflow, None).is_none());
    }

    #[test]
    fn context_starts_uncancelled() {
        let ctx = ApplyContext::new("acc").with_actor(Actor::new("u-1"));
        assert!(!ctx.is_cancelled());
        ctx.cancel.cancel();
        assert!(ctx.is_cancelled());
    }
}
