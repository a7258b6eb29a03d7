//! Engine configuration.
//!
//! # File format
//!
//! ```yaml
//! managed_root: "Setup/"
//! max_parallel: 20
//! quarantine_ttl_secs: 1800
//! upload_timeout_secs: 30
//! ```
//!
//! Every field is optional; absent fields take their defaults. A missing file
//! is not an error and yields [`SyncConfig::default`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

pub const DEFAULT_MANAGED_ROOT: &str = "Setup/";
pub const DEFAULT_MAX_PARALLEL: usize = 20;
pub const DEFAULT_QUARANTINE_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for a synchronization engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Changes outside this path prefix are ignored.
    pub managed_root: String,
    /// Upper bound on units applied concurrently.
    pub max_parallel: usize,
    /// Idle time after which a quota-rejected commit is retried.
    pub quarantine_ttl_secs: u64,
    /// Wall-clock limit for timeout-bounded submissions.
    pub upload_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            managed_root: DEFAULT_MANAGED_ROOT.to_string(),
            max_parallel: DEFAULT_MAX_PARALLEL,
            quarantine_ttl_secs: DEFAULT_QUARANTINE_TTL.as_secs(),
            upload_timeout_secs: DEFAULT_UPLOAD_TIMEOUT.as_secs(),
        }
    }
}

impl SyncConfig {
    pub fn quarantine_ttl(&self) -> Duration {
        Duration::from_secs(self.quarantine_ttl_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallel == 0 {
            return Err(ConfigError::Invalid {
                field: "max_parallel",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.managed_root.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "managed_root",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Load and validate a config file.
///
/// Returns defaults if `path` does not exist, `ConfigError::Parse` (with path
/// + line context) if the YAML is malformed.
pub fn load_at(path: &Path) -> Result<SyncConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(SyncConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let config: SyncConfig = if contents.trim().is_empty() {
        SyncConfig::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };
    config.validate()?;
    Ok(config)
}

/// Atomically save a config file.
///
/// Write flow: serialize → `.tmp` sibling → `rename`.
pub fn save_at(path: &Path, config: &SyncConfig) -> Result<(), ConfigError> {
    config.validate()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }
    let tmp = path.with_extension("yaml.tmp");
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let config = SyncConfig::default();
        assert_eq!(config.managed_root, "Setup/");
        assert_eq!(config.max_parallel, 20);
        assert_eq!(config.quarantine_ttl(), Duration::from_secs(1800));
        assert_eq!(config.upload_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let config = load_at(&dir.path().join("absent.yaml")).expect("load");
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn zero_parallelism_is_invalid() {
        let config = SyncConfig {
            max_parallel: 0,
            ..SyncConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_parallel"), "got: {err}");
    }
}
