#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use yamlsync_core::{Change, ChangeType, EntityId, EntityType, TenantId};
use yamlsync_engine::{
    ActivityEntry, ApplicationUnit, ApplyContext, AuthCache, EntityHandler, HandlerError,
    HandlerRegistry, SyncEngineBuilder, SyncObserver,
};

pub const TENANT: &str = "acc-1";
pub const APP: &str = "Setup/Applications/app1/Index.yaml";
pub const SVC: &str = "Setup/Applications/app1/Services/svc1/Index.yaml";
pub const ENV: &str = "Setup/Applications/app1/Environments/prod/Index.yaml";
pub const WF: &str = "Setup/Applications/app1/Workflows/wf1.yaml";

pub fn workflow_path(n: usize) -> String {
    format!("Setup/Applications/app1/Workflows/wf{n}.yaml")
}

pub fn ctx() -> ApplyContext {
    ApplyContext::new(TENANT)
}

/// One handler invocation, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub change_type: ChangeType,
    pub path: String,
    pub content: Option<String>,
}

/// Handler that records calls and can be told to fail, sleep, or report a
/// stored entity id.
#[derive(Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    fail: HashSet<String>,
    quota: HashSet<String>,
    stored_ids: HashMap<String, EntityId>,
    delay: Option<Duration>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, path: &str) -> Self {
        self.fail.insert(path.to_string());
        self
    }

    pub fn over_quota(mut self, path: &str) -> Self {
        self.quota.insert(path.to_string());
        self
    }

    pub fn stored(mut self, path: &str, id: &str) -> Self {
        self.stored_ids.insert(path.to_string(), EntityId::from(id));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn enter(&self, unit: &ApplicationUnit) -> Result<(), HandlerError> {
        self.calls.lock().expect("calls lock").push(Call {
            change_type: unit.change_type(),
            path: unit.path().to_string(),
            content: unit.content().map(str::to_string),
        });
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.quota.contains(unit.path()) {
            return Err(HandlerError::QuotaExceeded("workflow limit reached".into()));
        }
        if self.fail.contains(unit.path()) {
            return Err(HandlerError::Rejected(format!("cannot apply {}", unit.path())));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityHandler for RecordingHandler {
    async fn upsert(
        &self,
        _ctx: &ApplyContext,
        unit: &ApplicationUnit,
        _batch: &[ApplicationUnit],
    ) -> Result<Option<EntityId>, HandlerError> {
        self.enter(unit).await?;
        Ok(Some(EntityId::from(format!("id:{}", unit.path()))))
    }

    async fn delete(
        &self,
        _ctx: &ApplyContext,
        unit: &ApplicationUnit,
    ) -> Result<(), HandlerError> {
        self.enter(unit).await
    }

    async fn current_entity_id(
        &self,
        _ctx: &ApplyContext,
        unit: &ApplicationUnit,
    ) -> Result<Option<EntityId>, HandlerError> {
        Ok(self.stored_ids.get(unit.path()).cloned())
    }
}

/// Registry routing every listed type to `handler`.
pub fn registry(handler: &Arc<RecordingHandler>, types: &[EntityType]) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for entity_type in types {
        registry.register(*entity_type, Arc::clone(handler) as Arc<dyn EntityHandler>);
    }
    registry
}

pub const ALL_TEST_TYPES: &[EntityType] = &[
    EntityType::Application,
    EntityType::Service,
    EntityType::Environment,
    EntityType::Workflow,
    EntityType::Pipeline,
];

pub fn builder(handler: &Arc<RecordingHandler>) -> SyncEngineBuilder {
    yamlsync_engine::SyncEngine::builder().handlers(registry(handler, ALL_TEST_TYPES))
}

#[derive(Default)]
pub struct RecordingAuthCache {
    evictions: Mutex<Vec<(TenantId, bool)>>,
}

impl RecordingAuthCache {
    pub fn evictions(&self) -> Vec<(TenantId, bool)> {
        self.evictions.lock().expect("evictions lock").clone()
    }
}

impl AuthCache for RecordingAuthCache {
    fn evict(&self, tenant_id: &TenantId, include_restrictions: bool) {
        self.evictions
            .lock()
            .expect("evictions lock")
            .push((tenant_id.clone(), include_restrictions));
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    processed: Mutex<Vec<(String, bool)>>,
    activity: Mutex<Vec<ActivityEntry>>,
}

impl RecordingObserver {
    pub fn processed(&self) -> Vec<(String, bool)> {
        self.processed.lock().expect("processed lock").clone()
    }

    pub fn activity(&self) -> Vec<ActivityEntry> {
        self.activity.lock().expect("activity lock").clone()
    }
}

impl SyncObserver for RecordingObserver {
    fn file_processed(&self, change: &Change, vcs_sync: bool) {
        self.processed
            .lock()
            .expect("processed lock")
            .push((change.file_path.clone(), vcs_sync));
    }

    fn log_activity(&self, entry: &ActivityEntry) {
        self.activity.lock().expect("activity lock").push(entry.clone());
    }
}
