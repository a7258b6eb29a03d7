//! Time-bounded quarantine of commits that exceeded a usage quota.
//!
//! Once a handler reports a quota violation for a change from a known commit,
//! the `(commit, tenant)` pair is marked. Every later change from that pair is
//! skipped without a failure record, so a large commit surfaces the quota
//! error once instead of once per file.
//!
//! Expiry is access-based: each positive lookup refreshes the entry, and an
//! entry left idle for the full TTL is forgotten. Time comes from
//! [`tokio::time::Instant`], so a paused test runtime can fast-forward it.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use yamlsync_core::{CommitId, QuarantineKey, TenantId};

/// Concurrent `(commit, tenant) → last access` map with idle expiry.
#[derive(Debug)]
pub struct QuarantineCache {
    ttl: Duration,
    entries: DashMap<QuarantineKey, Instant>,
}

impl QuarantineCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True while `(commit, tenant)` is quarantined. Refreshes the entry.
    pub fn exceeded_limit(&self, commit_id: &CommitId, tenant_id: &TenantId) -> bool {
        let key = QuarantineKey::new(commit_id.clone(), tenant_id.clone());
        let now = Instant::now();
        let ttl = self.ttl;
        self.entries
            .remove_if(&key, |_, last| now.saturating_duration_since(*last) >= ttl);
        match self.entries.get_mut(&key) {
            Some(mut last) => {
                *last = now;
                true
            }
            None => false,
        }
    }

    /// Quarantine `(commit, tenant)` starting now.
    pub fn mark_exceeded(&self, commit_id: &CommitId, tenant_id: &TenantId) {
        tracing::info!(
            commit = %commit_id,
            tenant = %tenant_id,
            "quarantining commit after usage limit"
        );
        self.entries.insert(
            QuarantineKey::new(commit_id.clone(), tenant_id.clone()),
            Instant::now(),
        );
    }

    /// Drop every entry idle for at least the TTL. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, last| now.saturating_duration_since(*last) < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
