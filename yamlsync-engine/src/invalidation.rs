//! Authorization cache invalidation after structural changes.
//!
//! Authorization decisions are cached per tenant. Once a group of entities
//! that own permissions has been created, removed or (for some types)
//! modified, that cache must be evicted. Applications and environments also
//! scope usage restrictions, so their structural changes evict the combined
//! permission-and-restriction cache.

use std::collections::HashSet;
use std::sync::Arc;

use yamlsync_core::{ChangeType, EntityType, TenantId};

/// Tenant-scoped authorization cache.
///
/// Eviction must be idempotent and safe to call concurrently.
pub trait AuthCache: Send + Sync {
    fn evict(&self, tenant_id: &TenantId, include_restrictions: bool);
}

/// An [`AuthCache`] that caches nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuthCache;

impl AuthCache for NoopAuthCache {
    fn evict(&self, _tenant_id: &TenantId, _include_restrictions: bool) {}
}

/// Decides whether a finished group of changes evicts the auth cache.
#[derive(Clone)]
pub struct CacheInvalidator {
    create_types: HashSet<EntityType>,
    update_types: HashSet<EntityType>,
    delete_types: HashSet<EntityType>,
    auth_cache: Arc<dyn AuthCache>,
}

impl CacheInvalidator {
    pub fn new(auth_cache: Arc<dyn AuthCache>) -> Self {
        let create_types: HashSet<EntityType> = [
            EntityType::Application,
            EntityType::Service,
            EntityType::Environment,
            EntityType::Provisioner,
            EntityType::Workflow,
            EntityType::Pipeline,
        ]
        .into_iter()
        .collect();
        let update_types = [
            EntityType::Environment,
            EntityType::Workflow,
            EntityType::Pipeline,
        ]
        .into_iter()
        .collect();
        Self {
            delete_types: create_types.clone(),
            create_types,
            update_types,
            auth_cache,
        }
    }

    /// Which eviction, if any, `(entity_type, change_type)` calls for.
    ///
    /// `Some(true)` evicts permissions and restrictions, `Some(false)`
    /// permissions only.
    pub fn eviction_for(
        &self,
        entity_type: EntityType,
        change_type: ChangeType,
    ) -> Option<bool> {
        let scopes_restrictions = matches!(
            entity_type,
            EntityType::Application | EntityType::Environment
        );
        match change_type {
            ChangeType::Add if self.create_types.contains(&entity_type) => {
                Some(scopes_restrictions)
            }
            ChangeType::Modify if self.update_types.contains(&entity_type) => {
                Some(entity_type == EntityType::Environment)
            }
            ChangeType::Delete if self.delete_types.contains(&entity_type) => Some(true),
            _ => None,
        }
    }

    /// Evict the tenant's auth cache if the finished group requires it.
    pub fn invalidate(
        &self,
        tenant_id: &TenantId,
        entity_type: EntityType,
        change_type: ChangeType,
    ) {
        if let Some(include_restrictions) = self.eviction_for(entity_type, change_type) {
            tracing::debug!(
                tenant = %tenant_id,
                %entity_type,
                %change_type,
                include_restrictions,
                "evicting auth cache"
            );
            self.auth_cache.evict(tenant_id, include_restrictions);
        }
    }
}

impl std::fmt::Debug for CacheInvalidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheInvalidator")
            .field("create_types", &self.create_types)
            .field("update_types", &self.update_types)
            .field("delete_types", &self.delete_types)
            .finish_non_exhaustive()
    }
}
