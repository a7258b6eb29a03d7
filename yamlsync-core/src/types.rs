//! Domain types for a change set.
//!
//! A [`Change`] is immutable once built; the builder methods consume `self`.
//! All types are serializable via serde so callers can persist or ship them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of the tenant (account) that owns a change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Source-control commit a change was read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitId(pub String);

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CommitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a persisted business entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Change
// ---------------------------------------------------------------------------

/// Kind of file-level mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Add,
    Modify,
    Delete,
    Rename,
}

impl ChangeType {
    /// Ordering coefficient: deletions run in reverse dependency order.
    pub fn sign(self) -> i64 {
        match self {
            ChangeType::Delete => -1,
            _ => 1,
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Add => write!(f, "ADD"),
            ChangeType::Modify => write!(f, "MODIFY"),
            ChangeType::Delete => write!(f, "DELETE"),
            ChangeType::Rename => write!(f, "RENAME"),
        }
    }
}

/// One file-level change to a configuration entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub file_path: String,
    pub change_type: ChangeType,
    /// Raw file content; absent for most deletions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub tenant_id: TenantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<CommitId>,
    /// True when the change was read from an external VCS.
    #[serde(default)]
    pub from_vcs: bool,
    /// Entity the caller expects this file to describe (updates through an API).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<EntityId>,
}

impl Change {
    fn new(
        file_path: impl Into<String>,
        change_type: ChangeType,
        content: Option<String>,
        tenant_id: impl Into<TenantId>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            change_type,
            content,
            tenant_id: tenant_id.into(),
            commit_id: None,
            from_vcs: false,
            entity_id: None,
        }
    }

    pub fn add(
        file_path: impl Into<String>,
        content: impl Into<String>,
        tenant_id: impl Into<TenantId>,
    ) -> Self {
        Self::new(file_path, ChangeType::Add, Some(content.into()), tenant_id)
    }

    pub fn modify(
        file_path: impl Into<String>,
        content: impl Into<String>,
        tenant_id: impl Into<TenantId>,
    ) -> Self {
        Self::new(file_path, ChangeType::Modify, Some(content.into()), tenant_id)
    }

    pub fn delete(file_path: impl Into<String>, tenant_id: impl Into<TenantId>) -> Self {
        Self::new(file_path, ChangeType::Delete, None, tenant_id)
    }

    pub fn rename(file_path: impl Into<String>, tenant_id: impl Into<TenantId>) -> Self {
        Self::new(file_path, ChangeType::Rename, None, tenant_id)
    }

    /// Attach content to a change (e.g. a placeholder document for a delete).
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Mark the change as read from a VCS commit.
    pub fn with_commit(mut self, commit_id: impl Into<CommitId>) -> Self {
        self.commit_id = Some(commit_id.into());
        self.from_vcs = true;
        self
    }

    pub fn with_entity_id(mut self, entity_id: impl Into<EntityId>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Commit id, but only when the change carries VCS provenance.
    pub fn vcs_commit(&self) -> Option<&CommitId> {
        if self.from_vcs {
            self.commit_id.as_ref()
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// A change that could not be validated or applied, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub change: Change,
    pub message: String,
}

impl FailureRecord {
    pub fn new(change: Change, message: impl Into<String>) -> Self {
        Self {
            change,
            message: message.into(),
        }
    }
}

/// Failures keyed by file path. Ordered so reports are deterministic.
pub type FailureMap = BTreeMap<String, FailureRecord>;

/// Cache key for commits rejected for exceeding a usage quota.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuarantineKey {
    pub commit_id: CommitId,
    pub tenant_id: TenantId,
}

impl QuarantineKey {
    pub fn new(commit_id: CommitId, tenant_id: TenantId) -> Self {
        Self {
            commit_id,
            tenant_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
