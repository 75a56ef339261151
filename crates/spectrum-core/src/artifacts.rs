//! Rendered deployment artifacts.
//!
//! The stack-creation and DNS calls read their payloads from files in the
//! scratch directory (`.spectrum/`). Each file is rendered and written
//! immediately before the call that consumes it.
//!
//! ```text
//! .spectrum/
//!   fargate-application.yml   stack template, task environment rendered in
//!   app-parameters.json       stack parameters
//!   tags.json                 stack tags (deployment marker + project tag)
//!   dns-record.json           Route53 change batch
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::DeploymentConfig;
use crate::dns::DnsRecordIntent;
use crate::naming::{DeployScope, ResourceName};

pub const SCRATCH_DIR: &str = ".spectrum";
pub const TEMPLATE_FILE: &str = "fargate-application.yml";
pub const PARAMETERS_FILE: &str = "app-parameters.json";
pub const TAGS_FILE: &str = "tags.json";
pub const DNS_RECORD_FILE: &str = "dns-record.json";

/// Tag present on every stack spectrum creates.
pub const DEPLOYMENT_TAG: &str = "spectrum:deployment";
/// Tag carrying the [`ResourceName`] of a stack.
pub const PROJECT_TAG: &str = "mon:project";
pub const OWNER_TAG: &str = "mon:owner";
pub const COST_CENTER_TAG: &str = "mon:cost-center";

const TEMPLATE: &str = include_str!("../templates/fargate-application.yml");
const ENVIRONMENT_PLACEHOLDER: &str = "__ENVIRONMENT__";
const CONTAINER_PORT: &str = "80";

/// Everything the stack payload files are rendered from.
#[derive(Debug, Clone)]
pub struct StackInputs {
    pub resource: ResourceName,
    pub image_url: String,
    pub cluster_stack_name: String,
    pub health_check_path: String,
    pub health_check_interval_seconds: u32,
    pub owner: String,
    pub cost_center: String,
    pub environment: BTreeMap<String, String>,
}

impl StackInputs {
    pub fn new(
        config: &DeploymentConfig,
        scope: &DeployScope,
        environment: BTreeMap<String, String>,
    ) -> Self {
        let owner = config
            .project_owner
            .clone()
            .or_else(|| std::env::var_os("USER").map(|u| u.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "unknown".to_owned());

        Self {
            resource: ResourceName::new(&config.project_name, scope),
            image_url: config
                .registry()
                .image(&config.project_name, scope.image_tag()),
            cluster_stack_name: config.stack_name.clone(),
            health_check_path: config.health_check_path.clone(),
            health_check_interval_seconds: config.health_check_interval_seconds,
            owner,
            cost_center: config.cost_center.clone(),
            environment,
        }
    }
}

/// Paths of the files consumed by stack creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackArtifacts {
    pub template: PathBuf,
    pub parameters: PathBuf,
    pub tags: PathBuf,
}

#[derive(Serialize)]
struct Tag<'a> {
    #[serde(rename = "Key")]
    key: &'a str,
    #[serde(rename = "Value")]
    value: &'a str,
}

#[derive(Serialize)]
struct Parameter<'a> {
    #[serde(rename = "ParameterKey")]
    key: &'a str,
    #[serde(rename = "ParameterValue")]
    value: String,
}

/// Stack tags: deployment marker, project, owner and cost center.
pub fn render_tags(inputs: &StackInputs) -> crate::Result<String> {
    let tags = [
        Tag {
            key: DEPLOYMENT_TAG,
            value: "true",
        },
        Tag {
            key: PROJECT_TAG,
            value: inputs.resource.as_str(),
        },
        Tag {
            key: OWNER_TAG,
            value: &inputs.owner,
        },
        Tag {
            key: COST_CENTER_TAG,
            value: &inputs.cost_center,
        },
    ];
    serde_json::to_string_pretty(&tags).map_err(|e| crate::Error::ArtifactRender {
        name: TAGS_FILE,
        source: e,
    })
}

pub fn render_parameters(inputs: &StackInputs) -> crate::Result<String> {
    let params = [
        Parameter {
            key: "ApplicationName",
            value: inputs.resource.to_string(),
        },
        Parameter {
            key: "ImageUrl",
            value: inputs.image_url.clone(),
        },
        Parameter {
            key: "FargateStackName",
            value: inputs.cluster_stack_name.clone(),
        },
        Parameter {
            key: "HealthCheckPath",
            value: inputs.health_check_path.clone(),
        },
        Parameter {
            key: "HealthCheckIntervalSeconds",
            value: inputs.health_check_interval_seconds.to_string(),
        },
        Parameter {
            key: "ListenerPriority",
            value: listener_priority(&inputs.resource).to_string(),
        },
    ];
    serde_json::to_string_pretty(&params).map_err(|e| crate::Error::ArtifactRender {
        name: PARAMETERS_FILE,
        source: e,
    })
}

/// Stack template with the task environment filled in.
///
/// `PORT` is always set to the container port; a group entry named `PORT`
/// overrides it.
pub fn render_template(environment: &BTreeMap<String, String>) -> crate::Result<String> {
    let mut vars = BTreeMap::from([("PORT".to_owned(), CONTAINER_PORT.to_owned())]);
    vars.extend(environment.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut block = String::new();
    for (name, value) in &vars {
        // JSON strings are valid YAML double-quoted scalars.
        let name = serde_json::to_string(name).map_err(|e| crate::Error::ArtifactRender {
            name: TEMPLATE_FILE,
            source: e,
        })?;
        let value = serde_json::to_string(value).map_err(|e| crate::Error::ArtifactRender {
            name: TEMPLATE_FILE,
            source: e,
        })?;
        block.push_str(&format!(
            "            - Name: {name}\n              Value: {value}\n"
        ));
    }

    Ok(TEMPLATE.replace(
        &format!("{ENVIRONMENT_PLACEHOLDER}\n"),
        &block,
    ))
}

/// Stable ALB listener-rule priority in `1..=49999` for a resource.
///
/// Distinct resources can hash to the same priority. The listener accepts
/// each priority once, so the second stack fails to create and has to be
/// redeployed under another resource name.
pub fn listener_priority(resource: &ResourceName) -> u32 {
    // FNV-1a
    let hash = resource
        .as_str()
        .bytes()
        .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
    hash % 49_999 + 1
}

/// The `.spectrum/` working directory.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Scratch directory inside the project directory.
    pub fn in_project(project_dir: &Path) -> Self {
        Self {
            root: project_dir.join(SCRATCH_DIR),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn write(&self, file: &str, content: &str) -> crate::Result<PathBuf> {
        std::fs::create_dir_all(&self.root).map_err(|e| crate::Error::ScratchDir {
            path: self.root.clone(),
            source: e,
        })?;
        let path = self.root.join(file);
        std::fs::write(&path, content).map_err(|e| crate::Error::ArtifactWrite {
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "wrote artifact");
        Ok(path)
    }

    /// Render and write the template, parameters and tags files.
    pub fn write_stack_artifacts(&self, inputs: &StackInputs) -> crate::Result<StackArtifacts> {
        Ok(StackArtifacts {
            template: self.write(TEMPLATE_FILE, &render_template(&inputs.environment)?)?,
            parameters: self.write(PARAMETERS_FILE, &render_parameters(inputs)?)?,
            tags: self.write(TAGS_FILE, &render_tags(inputs)?)?,
        })
    }

    /// Render and write the Route53 change batch for an intent.
    pub fn write_dns_change(&self, intent: &DnsRecordIntent) -> crate::Result<PathBuf> {
        let content = serde_json::to_string_pretty(&intent.change_batch()).map_err(|e| {
            crate::Error::ArtifactRender {
                name: DNS_RECORD_FILE,
                source: e,
            }
        })?;
        self.write(DNS_RECORD_FILE, &content)
    }
}

/// `file://` URI understood by the aws CLI for file-backed arguments.
pub fn file_uri(path: &Path) -> crate::Result<String> {
    let path = path
        .to_str()
        .ok_or_else(|| crate::Error::NonUtf8Path(path.to_path_buf()))?;
    Ok(format!("file://{path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_priority_is_stable_and_in_range() {
        let name = ResourceName::new("acme", &DeployScope::branch("feature-x"));
        let first = listener_priority(&name);
        assert_eq!(first, listener_priority(&name));
        assert!((1..=49_999).contains(&first));
    }

    #[test]
    fn template_placeholder_is_fully_replaced() {
        let rendered = render_template(&BTreeMap::new()).unwrap();
        assert!(!rendered.contains(ENVIRONMENT_PLACEHOLDER));
        assert!(rendered.contains("- Name: \"PORT\"\n              Value: \"80\""));
    }
}
