//! Error types for yamlsync-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityType;

/// Errors raised while building or querying a [`ProcessingOrder`](crate::ProcessingOrder).
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No entity type in the processing order matches the path.
    #[error("Unknown yaml type for path: {path}")]
    UnknownType { path: String },

    /// The same entity type was listed twice in a processing order.
    #[error("entity type {0} appears more than once in the processing order")]
    DuplicateType(EntityType),

    /// A path pattern failed to compile.
    #[error("invalid path pattern for {entity_type}: {source}")]
    Pattern {
        entity_type: EntityType,
        #[source]
        source: regex::Error,
    },
}

/// All errors that can arise from loading or saving [`SyncConfig`](crate::SyncConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, annotated with the file involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A field holds a value the engine cannot run with.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
