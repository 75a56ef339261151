use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::naming::RegistryPath;

/// File name of the persisted project configuration.
pub const CONFIG_FILE: &str = "spectrum.config.json";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_ROLE_NAME: &str = "spectrum-role";
pub const DEFAULT_HEALTH_CHECK_PATH: &str = "/";
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECONDS: u32 = 60;

/// Environment-variable group: variable name to value.
pub type EnvironmentGroup = BTreeMap<String, String>;

/// spectrum.config.json as stored on disk.
///
/// Every field is optional here; [`SpectrumConfig::validate`] turns it into a
/// [`DeploymentConfig`] once all required fields are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpectrumConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// ARN of the role assumed for every provider call
    #[serde(rename = "RoleARN", default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    /// Role name the ARN was composed from (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role_name: Option<String>,
    /// AWS account that hosts the registry and the stacks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fargate_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fargate_region: Option<String>,
    /// Shared cluster stack whose exports the application template imports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fargate_stack_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_center: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_interval_seconds: Option<u32>,
    /// Environment-variable groups keyed by environment name
    #[serde(default)]
    pub environment_variables: BTreeMap<String, EnvironmentGroup>,
}

/// Fully-resolved configuration required by every pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub project_name: String,
    pub role_arn: String,
    pub account_id: String,
    pub region: String,
    pub stack_name: String,
    pub cost_center: String,
    pub project_owner: Option<String>,
    pub health_check_path: String,
    pub health_check_interval_seconds: u32,
    pub environment_variables: BTreeMap<String, EnvironmentGroup>,
}

impl DeploymentConfig {
    /// Registry host path for the configured account and region.
    pub fn registry(&self) -> RegistryPath {
        RegistryPath::new(&self.account_id, &self.region)
    }
}

impl SpectrumConfig {
    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE)
    }

    /// Load spectrum.config.json from the project directory.
    ///
    /// A missing file is [`crate::Error::NotInitialized`].
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let path = Self::path(project_dir);
        if !path.exists() {
            return Err(crate::Error::NotInitialized { path });
        }
        Self::read(path)
    }

    /// Load spectrum.config.json, or return an empty configuration if absent.
    pub fn load_or_default(project_dir: &Path) -> crate::Result<Self> {
        let path = Self::path(project_dir);
        if path.exists() {
            Self::read(path)
        } else {
            Ok(Self::default())
        }
    }

    fn read(path: PathBuf) -> crate::Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| crate::Error::ConfigLoad {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| crate::Error::ConfigParse { path, source: e })
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, project_dir: &Path) -> crate::Result<PathBuf> {
        let path = Self::path(project_dir);
        let mut content =
            serde_json::to_string_pretty(self).map_err(|e| crate::Error::ArtifactRender {
                name: CONFIG_FILE,
                source: e,
            })?;
        content.push('\n');
        std::fs::write(&path, content).map_err(|e| crate::Error::ConfigWrite {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Overlay every field set in `other` on top of `self`.
    ///
    /// Environment groups are merged by name; groups in `other` replace groups
    /// of the same name.
    pub fn merge(mut self, other: SpectrumConfig) -> Self {
        fn overlay<T>(base: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *base = value;
            }
        }

        overlay(&mut self.project_name, other.project_name);
        overlay(&mut self.role_arn, other.role_arn);
        overlay(&mut self.assume_role_name, other.assume_role_name);
        overlay(&mut self.fargate_account_id, other.fargate_account_id);
        overlay(&mut self.fargate_region, other.fargate_region);
        overlay(&mut self.fargate_stack_name, other.fargate_stack_name);
        overlay(&mut self.cost_center, other.cost_center);
        overlay(&mut self.project_owner, other.project_owner);
        overlay(&mut self.health_check_path, other.health_check_path);
        overlay(
            &mut self.health_check_interval_seconds,
            other.health_check_interval_seconds,
        );
        self.environment_variables
            .extend(other.environment_variables);
        self
    }

    /// Check that every required field is present and non-blank.
    ///
    /// All missing fields are reported at once.
    pub fn validate(&self) -> crate::Result<DeploymentConfig> {
        let mut missing = Vec::new();

        let mut require = |value: &Option<String>, name: &'static str| -> String {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => v.to_owned(),
                _ => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let project_name = require(&self.project_name, "ProjectName");
        let role_arn = require(&self.role_arn, "RoleARN");
        let account_id = require(&self.fargate_account_id, "FargateAccountId");
        let region = require(&self.fargate_region, "FargateRegion");
        let stack_name = require(&self.fargate_stack_name, "FargateStackName");
        let cost_center = require(&self.cost_center, "CostCenter");
        let health_check_path = require(&self.health_check_path, "HealthCheckPath");

        if !missing.is_empty() {
            return Err(crate::Error::IncompleteConfig { missing });
        }

        Ok(DeploymentConfig {
            project_name,
            role_arn,
            account_id,
            region,
            stack_name,
            cost_center,
            project_owner: self.project_owner.clone(),
            health_check_path,
            health_check_interval_seconds: self
                .health_check_interval_seconds
                .unwrap_or(DEFAULT_HEALTH_CHECK_INTERVAL_SECONDS),
            environment_variables: self.environment_variables.clone(),
        })
    }
}

/// Compose the ARN of an IAM role in the given account.
pub fn role_arn(account_id: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role_name}")
}
