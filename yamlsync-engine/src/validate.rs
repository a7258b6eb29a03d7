//! Per-file validation.
//!
//! Turns sorted [`ClassifiedChange`]s into [`ApplicationUnit`]s. Each change
//! is handled independently; a bad file becomes a [`FailureRecord`] and never
//! aborts the batch. Some changes are dropped without a record: commits in
//! quarantine, legacy entity types and types the [`TypePolicy`] refuses.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use yamlsync_core::{Change, ChangeType, ContentKind, EntityType, FailureMap, FailureRecord};

use crate::handler::HandlerRegistry;
use crate::order::ClassifiedChange;
use crate::policy::TypePolicy;
use crate::quarantine::QuarantineCache;
use crate::unit::ApplicationUnit;

const YAML_EXTENSION: &str = ".yaml";

#[derive(Debug, Error)]
enum ValidationError {
    #[error("Unsupported type: {0}")]
    Unsupported(EntityType),

    #[error("No content provided for {0}")]
    MissingContent(String),

    #[error("Not a well-formed yaml. {problem} (line {line}, column {column})")]
    MalformedAt {
        problem: String,
        line: usize,
        column: usize,
    },

    #[error("Not a well-formed yaml. {0}")]
    Malformed(String),

    #[error("Not a well-formed yaml. Top level must be a mapping")]
    NotAMapping,

    #[error("Invalid phase name [{0}]. Dots are not permitted")]
    PhaseNameWithDot(String),

    #[error("Invalid amiFilter name. Empty names are not permitted")]
    EmptyAmiFilterName,

    #[error("Invalid amiTag name. Empty names are not permitted")]
    EmptyAmiTagName,

    #[error("No handler registered for {0}")]
    NoHandler(String),
}

impl From<serde_yaml::Error> for ValidationError {
    fn from(e: serde_yaml::Error) -> Self {
        match e.location() {
            Some(location) => ValidationError::MalformedAt {
                problem: e.to_string(),
                line: location.line(),
                column: location.column(),
            },
            None => ValidationError::Malformed(e.to_string()),
        }
    }
}

/// Output of [`Validator::validate`].
#[derive(Debug, Default)]
pub struct Validated {
    pub units: Vec<ApplicationUnit>,
    pub failures: FailureMap,
}

/// Validates changes against the handler registry and quarantine.
pub struct Validator<'a> {
    registry: &'a HandlerRegistry,
    quarantine: &'a QuarantineCache,
    policy: &'a dyn TypePolicy,
}

impl<'a> Validator<'a> {
    pub fn new(
        registry: &'a HandlerRegistry,
        quarantine: &'a QuarantineCache,
        policy: &'a dyn TypePolicy,
    ) -> Self {
        Self {
            registry,
            quarantine,
            policy,
        }
    }

    pub fn validate(&self, changes: Vec<ClassifiedChange>) -> Validated {
        let mut validated = Validated::default();
        for classified in changes {
            let path = classified.change.file_path.clone();
            match self.validate_one(classified) {
                Ok(Some(unit)) => validated.units.push(unit),
                Ok(None) => {}
                Err((change, err)) => {
                    tracing::warn!(path = %path, error = %err, "validation failed");
                    validated
                        .failures
                        .insert(path, FailureRecord::new(change, err.to_string()));
                }
            }
        }
        tracing::debug!(
            units = validated.units.len(),
            failures = validated.failures.len(),
            "validated change set"
        );
        validated
    }

    fn validate_one(
        &self,
        classified: ClassifiedChange,
    ) -> Result<Option<ApplicationUnit>, (Change, ValidationError)> {
        let ClassifiedChange {
            change,
            entity_type,
            rank,
        } = classified;

        if let Some(commit_id) = &change.commit_id {
            if self.quarantine.exceeded_limit(commit_id, &change.tenant_id) {
                tracing::debug!(
                    path = %change.file_path,
                    commit = %commit_id,
                    "skipping quarantined commit"
                );
                return Ok(None);
            }
        }

        let entity_type = self.policy.remap(entity_type, &change.tenant_id);
        if entity_type.is_legacy() {
            tracing::debug!(path = %change.file_path, %entity_type, "skipping legacy entity type");
            return Ok(None);
        }
        if !self.policy.is_processing_allowed(&change, entity_type) {
            tracing::warn!(
                path = %change.file_path,
                %entity_type,
                "skipping change, processing is disabled for this type"
            );
            return Ok(None);
        }

        let (document, sub_type) = match entity_type.content_kind() {
            ContentKind::Raw => {
                if change.content.is_none() && !content_optional(change.change_type) {
                    let err = ValidationError::MissingContent(change.file_path.clone());
                    return Err((change, err));
                }
                (None, None)
            }
            ContentKind::Document => {
                if !change.file_path.ends_with(YAML_EXTENSION) {
                    return Err((change, ValidationError::Unsupported(entity_type)));
                }
                let parsed = parse_document(
                    &change.file_path,
                    change.change_type,
                    change.content.as_deref(),
                );
                match parsed {
                    Ok(Some(document)) => {
                        let sub_type = document
                            .get("type")
                            .and_then(Value::as_str)
                            .map(str::to_string);
                        (Some(Value::Mapping(document)), sub_type)
                    }
                    Ok(None) => (None, None),
                    Err(err) => return Err((change, err)),
                }
            }
        };

        let Some(handler) = self.registry.resolve(entity_type, sub_type.as_deref()) else {
            let what = match &sub_type {
                Some(sub_type) => format!("{entity_type} ({sub_type})"),
                None => entity_type.to_string(),
            };
            return Err((change, ValidationError::NoHandler(what)));
        };

        Ok(Some(ApplicationUnit {
            change,
            entity_type,
            rank,
            sub_type,
            document,
            handler,
            entity_id: None,
        }))
    }
}

/// Deletes and renames may arrive without content.
fn content_optional(change_type: ChangeType) -> bool {
    matches!(change_type, ChangeType::Delete | ChangeType::Rename)
}

/// Parse and structurally check a document. `None` for a delete or rename
/// without content.
fn parse_document(
    path: &str,
    change_type: ChangeType,
    content: Option<&str>,
) -> Result<Option<Mapping>, ValidationError> {
    let content = match content {
        Some(content) => content,
        None if content_optional(change_type) => return Ok(None),
        None => return Err(ValidationError::MissingContent(path.to_string())),
    };
    let Value::Mapping(document) = serde_yaml::from_str::<Value>(content)? else {
        return Err(ValidationError::NotAMapping);
    };
    check_fields(&document)?;
    Ok(Some(document))
}

/// Top-level naming rules shared by every document type.
fn check_fields(document: &Mapping) -> Result<(), ValidationError> {
    for name in names_in(document, "phases") {
        if name.contains('.') {
            return Err(ValidationError::PhaseNameWithDot(name.to_string()));
        }
    }
    if names_in(document, "amiFilters").any(str::is_empty) {
        return Err(ValidationError::EmptyAmiFilterName);
    }
    if names_in(document, "amiTags").any(str::is_empty) {
        return Err(ValidationError::EmptyAmiTagName);
    }
    Ok(())
}

/// `name` of every mapping in the sequence under `key`. A missing `name`
/// counts as empty.
fn names_in<'d>(document: &'d Mapping, key: &str) -> impl Iterator<Item = &'d str> {
    document
        .get(key)
        .and_then(Value::as_sequence)
        .into_iter()
        .flatten()
        .filter_map(Value::as_mapping)
        .map(|entry| entry.get("name").and_then(Value::as_str).unwrap_or(""))
}
