//! yamlsync engine: applies configuration change sets in dependency order.
//!
//! Public API surface:
//! - [`pipeline`]: [`SyncEngine`] and its builder, single-file operations
//! - [`handler`]: [`EntityHandler`], [`HandlerRegistry`], [`ApplyContext`]
//! - [`filter`], [`order`], [`validate`], [`apply`]: the pipeline stages
//! - [`quarantine`]: [`QuarantineCache`] for quota-rejected commits
//! - [`invalidation`]: [`AuthCache`] eviction after structural changes
//! - [`observer`]: per-file outcome callbacks
//! - [`report`]: [`BatchFailure`] and per-file operation reports
//! - [`error`]: [`SyncError`]

pub mod apply;
pub mod error;
pub mod filter;
pub mod handler;
pub mod invalidation;
pub mod observer;
pub mod order;
pub mod pipeline;
pub mod policy;
pub mod quarantine;
pub mod report;
pub mod telemetry;
pub mod unit;
pub mod validate;

pub use apply::{ApplyEngine, ApplyReport, UnitOutcome};
pub use error::SyncError;
pub use handler::{Actor, ApplyContext, EntityHandler, HandlerError, HandlerRegistry};
pub use invalidation::{AuthCache, CacheInvalidator, NoopAuthCache};
pub use observer::{ActivityEntry, ActivityStatus, NoopObserver, SyncObserver};
pub use pipeline::{SyncEngine, SyncEngineBuilder};
pub use policy::{DefaultTypePolicy, TriggerMigration, TypePolicy};
pub use quarantine::QuarantineCache;
pub use report::{BatchFailure, FileOperationStatus, FileStatus, OperationResponse, ResponseStatus};
pub use unit::ApplicationUnit;
