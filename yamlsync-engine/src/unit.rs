//! Validated, in-memory application units.

use std::fmt;
use std::sync::Arc;

use yamlsync_core::{Change, ChangeType, EntityId, EntityType};

use crate::handler::EntityHandler;

/// A validated change bound to the handler that applies it.
#[derive(Clone)]
pub struct ApplicationUnit {
    pub change: Change,
    pub entity_type: EntityType,
    /// 1-based rank of the change's path in the processing order.
    pub rank: usize,
    /// Top-level `type` field of the document, if any.
    pub sub_type: Option<String>,
    /// Parsed document; `None` for raw-content files and content-less deletes.
    pub document: Option<serde_yaml::Value>,
    pub handler: Arc<dyn EntityHandler>,
    /// Id of the entity produced by a successful upsert.
    pub entity_id: Option<EntityId>,
}

impl ApplicationUnit {
    pub fn path(&self) -> &str {
        &self.change.file_path
    }

    pub fn change_type(&self) -> ChangeType {
        self.change.change_type
    }

    pub fn content(&self) -> Option<&str> {
        self.change.content.as_deref()
    }
}

impl fmt::Debug for ApplicationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationUnit")
            .field("path", &self.change.file_path)
            .field("change_type", &self.change.change_type)
            .field("entity_type", &self.entity_type)
            .field("rank", &self.rank)
            .field("sub_type", &self.sub_type)
            .field("entity_id", &self.entity_id)
            .finish_non_exhaustive()
    }
}
