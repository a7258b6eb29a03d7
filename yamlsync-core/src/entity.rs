//! Configuration entity categories and the paths they live at.
//!
//! Every managed file lives under `Setup/`; application-scoped entities sit
//! below `Setup/Applications/<app>/`. Patterns are anchored regular
//! expressions matched against the whole path.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a file's content is handed to its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// A YAML document, parsed and checked before apply.
    Document,
    /// Opaque file content (manifests, config file bodies, value overrides).
    Raw,
}

/// A configuration entity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    SourceRepoProvider,
    AccountDefaults,
    Tag,
    CloudProvider,
    ArtifactServer,
    CollaborationProvider,
    LoadbalancerProvider,
    VerificationProvider,
    NotificationGroup,
    GlobalTemplateLibrary,
    Application,
    ApplicationDefaults,
    ApplicationTemplateLibrary,
    Service,
    Provisioner,
    ArtifactStream,
    Command,
    DeploymentSpecification,
    ConfigFileContent,
    ConfigFile,
    ApplicationManifest,
    ManifestFile,
    ApplicationManifestValuesServiceOverride,
    ManifestFileValuesServiceOverride,
    Environment,
    InfraMapping,
    CvConfiguration,
    InfraDefinition,
    ConfigFileOverrideContent,
    ConfigFileOverride,
    ApplicationManifestValuesEnvOverride,
    ManifestFileValuesEnvOverride,
    Workflow,
    Pipeline,
    Trigger,
    DeploymentTrigger,
    GovernanceConfig,
    EventRule,
}

const APP: &str = r"Setup/Applications/[^/]+";
const SVC: &str = r"Setup/Applications/[^/]+/Services/[^/]+";
const ENV: &str = r"Setup/Applications/[^/]+/Environments/[^/]+";

impl EntityType {
    /// Anchored path expression for files of this type.
    pub fn path_pattern(self) -> String {
        use EntityType::*;
        let body = match self {
            SourceRepoProvider => r"Setup/Source Repo Provider/[^/]+\.yaml".to_string(),
            AccountDefaults => r"Setup/Defaults\.yaml".to_string(),
            Tag => r"Setup/Tags\.yaml".to_string(),
            CloudProvider => r"Setup/Cloud Providers/[^/]+\.yaml".to_string(),
            ArtifactServer => r"Setup/Artifact Servers/[^/]+\.yaml".to_string(),
            CollaborationProvider => r"Setup/Collaboration Providers/[^/]+\.yaml".to_string(),
            LoadbalancerProvider => r"Setup/Load Balancers/[^/]+\.yaml".to_string(),
            VerificationProvider => r"Setup/Verification Providers/[^/]+\.yaml".to_string(),
            NotificationGroup => r"Setup/Notification Groups/[^/]+\.yaml".to_string(),
            GlobalTemplateLibrary => r"Setup/Template Library/.+\.yaml".to_string(),
            Application => format!(r"{APP}/Index\.yaml"),
            ApplicationDefaults => format!(r"{APP}/Defaults\.yaml"),
            ApplicationTemplateLibrary => format!(r"{APP}/Template Library/.+\.yaml"),
            Service => format!(r"{SVC}/Index\.yaml"),
            Provisioner => format!(r"{APP}/Infrastructure Provisioners/[^/]+\.yaml"),
            ArtifactStream => format!(r"{SVC}/Artifact Servers/[^/]+\.yaml"),
            Command => format!(r"{SVC}/Commands/[^/]+\.yaml"),
            DeploymentSpecification => format!(r"{SVC}/Deployment Specifications/[^/]+\.yaml"),
            ConfigFileContent => format!(r"{SVC}/Config Files/.+"),
            ConfigFile => format!(r"{SVC}/Config Files/.+\.yaml"),
            ApplicationManifest => format!(r"{SVC}/Manifests/Index\.yaml"),
            ManifestFile => format!(r"{SVC}/Manifests/Files/.+"),
            ApplicationManifestValuesServiceOverride => format!(r"{SVC}/Values/Index\.yaml"),
            ManifestFileValuesServiceOverride => format!(r"{SVC}/Values/values\.yaml"),
            Environment => format!(r"{ENV}/Index\.yaml"),
            InfraMapping => format!(r"{ENV}/Service Infrastructure/[^/]+\.yaml"),
            CvConfiguration => format!(r"{ENV}/Service Verification/[^/]+\.yaml"),
            InfraDefinition => format!(r"{ENV}/Infrastructure Definitions/[^/]+\.yaml"),
            ConfigFileOverrideContent => format!(r"{ENV}/Config Files/.+"),
            ConfigFileOverride => format!(r"{ENV}/Config Files/.+\.yaml"),
            ApplicationManifestValuesEnvOverride => format!(r"{ENV}/Values/Index\.yaml"),
            ManifestFileValuesEnvOverride => format!(r"{ENV}/Values/values\.yaml"),
            Workflow => format!(r"{APP}/Workflows/[^/]+\.yaml"),
            Pipeline => format!(r"{APP}/Pipelines/[^/]+\.yaml"),
            Trigger | DeploymentTrigger => format!(r"{APP}/Triggers/[^/]+\.yaml"),
            GovernanceConfig => r"Setup/Governance/[^/]+\.yaml".to_string(),
            EventRule => format!(r"{APP}/Event Rules/[^/]+\.yaml"),
        };
        format!("^{body}$")
    }

    pub fn content_kind(self) -> ContentKind {
        use EntityType::*;
        match self {
            ConfigFileContent
            | ConfigFileOverrideContent
            | ManifestFile
            | ManifestFileValuesServiceOverride
            | ManifestFileValuesEnvOverride => ContentKind::Raw,
            _ => ContentKind::Document,
        }
    }

    /// Config file bodies share a folder with their `.yaml` descriptors; the
    /// descriptor never classifies as content.
    pub fn excludes_yaml(self) -> bool {
        matches!(
            self,
            EntityType::ConfigFileContent | EntityType::ConfigFileOverrideContent
        )
    }

    /// Types still recognised on disk but no longer applied.
    pub fn is_legacy(self) -> bool {
        matches!(self, EntityType::InfraMapping)
    }

    pub fn as_str(self) -> &'static str {
        use EntityType::*;
        match self {
            SourceRepoProvider => "SOURCE_REPO_PROVIDER",
            AccountDefaults => "ACCOUNT_DEFAULTS",
            Tag => "TAG",
            CloudProvider => "CLOUD_PROVIDER",
            ArtifactServer => "ARTIFACT_SERVER",
            CollaborationProvider => "COLLABORATION_PROVIDER",
            LoadbalancerProvider => "LOADBALANCER_PROVIDER",
            VerificationProvider => "VERIFICATION_PROVIDER",
            NotificationGroup => "NOTIFICATION_GROUP",
            GlobalTemplateLibrary => "GLOBAL_TEMPLATE_LIBRARY",
            Application => "APPLICATION",
            ApplicationDefaults => "APPLICATION_DEFAULTS",
            ApplicationTemplateLibrary => "APPLICATION_TEMPLATE_LIBRARY",
            Service => "SERVICE",
            Provisioner => "PROVISIONER",
            ArtifactStream => "ARTIFACT_STREAM",
            Command => "COMMAND",
            DeploymentSpecification => "DEPLOYMENT_SPECIFICATION",
            ConfigFileContent => "CONFIG_FILE_CONTENT",
            ConfigFile => "CONFIG_FILE",
            ApplicationManifest => "APPLICATION_MANIFEST",
            ManifestFile => "MANIFEST_FILE",
            ApplicationManifestValuesServiceOverride => {
                "APPLICATION_MANIFEST_VALUES_SERVICE_OVERRIDE"
            }
            ManifestFileValuesServiceOverride => "MANIFEST_FILE_VALUES_SERVICE_OVERRIDE",
            Environment => "ENVIRONMENT",
            InfraMapping => "INFRA_MAPPING",
            CvConfiguration => "CV_CONFIGURATION",
            InfraDefinition => "INFRA_DEFINITION",
            ConfigFileOverrideContent => "CONFIG_FILE_OVERRIDE_CONTENT",
            ConfigFileOverride => "CONFIG_FILE_OVERRIDE",
            ApplicationManifestValuesEnvOverride => "APPLICATION_MANIFEST_VALUES_ENV_OVERRIDE",
            ManifestFileValuesEnvOverride => "MANIFEST_FILE_VALUES_ENV_OVERRIDE",
            Workflow => "WORKFLOW",
            Pipeline => "PIPELINE",
            Trigger => "TRIGGER",
            DeploymentTrigger => "DEPLOYMENT_TRIGGER",
            GovernanceConfig => "GOVERNANCE_CONFIG",
            EventRule => "EVENT_RULE",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
