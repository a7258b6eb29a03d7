//! yamlsync core library: change-set domain types, the entity catalog, and
//! engine configuration.
//!
//! Public API surface:
//! - [`types`]: newtypes, [`Change`], [`FailureRecord`]
//! - [`entity`]: [`EntityType`] and its path patterns
//! - [`catalog`]: [`ProcessingOrder`] (classification + ranking)
//! - [`config`]: [`SyncConfig`] load / save
//! - [`error`]: [`CatalogError`], [`ConfigError`]

pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod types;

pub use catalog::ProcessingOrder;
pub use config::SyncConfig;
pub use entity::{ContentKind, EntityType};
pub use error::{CatalogError, ConfigError};
pub use types::{
    Change, ChangeType, CommitId, EntityId, FailureMap, FailureRecord, QuarantineKey, TenantId,
};
