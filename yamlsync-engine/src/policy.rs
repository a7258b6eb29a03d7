//! Classification-time policy hooks.

use std::collections::HashSet;

use yamlsync_core::{Change, EntityType, TenantId};

/// Per-tenant decisions applied after classification.
pub trait TypePolicy: Send + Sync {
    /// Substitute the entity type a change is applied as.
    fn remap(&self, entity_type: EntityType, _tenant_id: &TenantId) -> EntityType {
        entity_type
    }

    /// False to skip the change without recording a failure.
    fn is_processing_allowed(&self, _change: &Change, _entity_type: EntityType) -> bool {
        true
    }
}

/// Accepts every type unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTypePolicy;

impl TypePolicy for DefaultTypePolicy {}

/// Applies `TRIGGER` files as `DEPLOYMENT_TRIGGER` for the listed tenants.
#[derive(Debug, Default, Clone)]
pub struct TriggerMigration {
    tenants: HashSet<TenantId>,
}

impl TriggerMigration {
    pub fn new(tenants: impl IntoIterator<Item = TenantId>) -> Self {
        Self {
            tenants: tenants.into_iter().collect(),
        }
    }
}

impl TypePolicy for TriggerMigration {
    fn remap(&self, entity_type: EntityType, tenant_id: &TenantId) -> EntityType {
        if entity_type == EntityType::Trigger && self.tenants.contains(tenant_id) {
            EntityType::DeploymentTrigger
        } else {
            entity_type
        }
    }
}
