//! Entity classification and global processing order.
//!
//! A [`ProcessingOrder`] is built once and shared by reference. Position in
//! the order is the entity's rank: referenced entities (cloud providers,
//! applications, services) rank before the entities referencing them
//! (artifact streams, workflows, triggers).
//!
//! Classification walks the order and returns the first type whose pattern
//! matches, so a more specific type must be listed before a broader one that
//! would also match its paths.

use regex::Regex;

use crate::entity::EntityType;
use crate::error::CatalogError;

/// Default order in which entity types are applied.
///
/// `DEPLOYMENT_TRIGGER` is absent: it is only produced by remapping a
/// `TRIGGER` and sorts by the trigger's path.
pub const STANDARD_ORDER: &[EntityType] = &[
    EntityType::SourceRepoProvider,
    EntityType::AccountDefaults,
    EntityType::Tag,
    EntityType::CloudProvider,
    EntityType::ArtifactServer,
    EntityType::CollaborationProvider,
    EntityType::LoadbalancerProvider,
    EntityType::VerificationProvider,
    EntityType::NotificationGroup,
    EntityType::GlobalTemplateLibrary,
    EntityType::Application,
    EntityType::ApplicationDefaults,
    EntityType::ApplicationTemplateLibrary,
    EntityType::Service,
    EntityType::Provisioner,
    EntityType::ArtifactStream,
    EntityType::Command,
    EntityType::DeploymentSpecification,
    EntityType::ConfigFileContent,
    EntityType::ConfigFile,
    EntityType::ApplicationManifest,
    EntityType::ManifestFile,
    EntityType::ApplicationManifestValuesServiceOverride,
    EntityType::ManifestFileValuesServiceOverride,
    EntityType::Environment,
    EntityType::InfraMapping,
    EntityType::CvConfiguration,
    EntityType::InfraDefinition,
    EntityType::ConfigFileOverrideContent,
    EntityType::ConfigFileOverride,
    EntityType::ApplicationManifestValuesEnvOverride,
    EntityType::ManifestFileValuesEnvOverride,
    EntityType::Workflow,
    EntityType::Pipeline,
    EntityType::Trigger,
    EntityType::GovernanceConfig,
    EntityType::EventRule,
];

#[derive(Debug)]
struct OrderEntry {
    entity_type: EntityType,
    pattern: Regex,
}

impl OrderEntry {
    fn matches(&self, path: &str) -> bool {
        if self.entity_type.excludes_yaml() && path.ends_with(".yaml") {
            return false;
        }
        self.pattern.is_match(path)
    }
}

/// Immutable, ordered list of entity types with compiled path patterns.
#[derive(Debug)]
pub struct ProcessingOrder {
    entries: Vec<OrderEntry>,
}

impl ProcessingOrder {
    /// The full default order ([`STANDARD_ORDER`]).
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(STANDARD_ORDER.to_vec())
    }

    /// Build an order from `types`, each using its built-in path pattern.
    pub fn new(types: Vec<EntityType>) -> Result<Self, CatalogError> {
        Self::with_patterns(
            types
                .into_iter()
                .map(|entity_type| (entity_type, entity_type.path_pattern()))
                .collect(),
        )
    }

    /// Build an order with explicit path patterns.
    pub fn with_patterns(entries: Vec<(EntityType, String)>) -> Result<Self, CatalogError> {
        let mut compiled: Vec<OrderEntry> = Vec::with_capacity(entries.len());
        for (entity_type, pattern) in entries {
            if compiled.iter().any(|e| e.entity_type == entity_type) {
                return Err(CatalogError::DuplicateType(entity_type));
            }
            let pattern = Regex::new(&pattern)
                .map_err(|source| CatalogError::Pattern { entity_type, source })?;
            compiled.push(OrderEntry {
                entity_type,
                pattern,
            });
        }
        Ok(Self { entries: compiled })
    }

    /// First entity type matching `path`, with its 1-based rank.
    pub fn classify_ranked(&self, path: &str) -> Option<(EntityType, usize)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.matches(path))
            .map(|(idx, entry)| (entry.entity_type, idx + 1))
    }

    pub fn classify(&self, path: &str) -> Result<EntityType, CatalogError> {
        self.classify_ranked(path)
            .map(|(entity_type, _)| entity_type)
            .ok_or_else(|| CatalogError::UnknownType {
                path: path.to_string(),
            })
    }

    /// 1-based rank of the first type matching `path`.
    pub fn rank(&self, path: &str) -> Option<usize> {
        self.classify_ranked(path).map(|(_, rank)| rank)
    }

    pub fn rank_of(&self, entity_type: EntityType) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.entity_type == entity_type)
            .map(|idx| idx + 1)
    }

    pub fn types(&self) -> impl Iterator<Item = EntityType> + '_ {
        self.entries.iter().map(|e| e.entity_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
