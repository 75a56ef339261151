//! Resource naming shared by deploy and destroy.
//!
//! Destroy can only find what deploy created because both derive every name
//! from the same [`ResourceName`]: the stack project tag, the stack name
//! prefix and the DNS host label. The registry repository is always named
//! after the project; branch scope is told apart by image tag.

use std::fmt;

/// Branch used when the working tree reports no current branch.
pub const DEFAULT_BRANCH: &str = "master";

/// Image tag for primary deployments.
pub const LATEST_TAG: &str = "latest";

/// Which deployment a pipeline acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployScope {
    /// Project-level deployment.
    Primary,
    /// Ephemeral deployment for a branch (already normalized).
    Branch(String),
}

impl DeployScope {
    /// Branch scope with the name normalized by [`normalize_branch`].
    pub fn branch(name: &str) -> Self {
        Self::Branch(normalize_branch(name))
    }

    /// Tag for the container image and registry entry of this scope.
    pub fn image_tag(&self) -> &str {
        match self {
            Self::Primary => LATEST_TAG,
            Self::Branch(branch) => branch,
        }
    }

    pub fn branch_name(&self) -> Option<&str> {
        match self {
            Self::Primary => None,
            Self::Branch(branch) => Some(branch),
        }
    }
}

/// `{project}` for primary scope, `{project}-{branch}` for branch scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(project: &str, scope: &DeployScope) -> Self {
        match scope {
            DeployScope::Primary => Self(project.to_owned()),
            DeployScope::Branch(branch) => Self(format!("{project}-{branch}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully-qualified DNS record name inside a hosted zone.
    ///
    /// The zone domain is used as the provider reports it (usually with a
    /// trailing dot).
    pub fn dns_record_name(&self, zone_domain: &str) -> String {
        format!("{}.{zone_domain}", self.0)
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Generated stack name: `{ResourceName}-{uuid}`.
///
/// A fresh suffix per creation keeps a new stack from colliding with a
/// previous one of the same resource that is still being deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackIdentity {
    resource: ResourceName,
    name: String,
}

impl StackIdentity {
    pub fn generate(resource: &ResourceName) -> Self {
        Self::with_suffix(resource, &uuid::Uuid::new_v4().to_string())
    }

    pub fn with_suffix(resource: &ResourceName, suffix: &str) -> Self {
        Self {
            resource: resource.clone(),
            name: format!("{resource}-{suffix}"),
        }
    }

    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for StackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Container registry host for an account and region.
///
/// # Examples
///
/// ```
/// use spectrum_core::RegistryPath;
///
/// let registry = RegistryPath::new("123456789012", "us-east-1");
/// assert_eq!(registry.host(), "123456789012.dkr.ecr.us-east-1.amazonaws.com");
/// assert_eq!(
///     registry.image("acme", "latest"),
///     "123456789012.dkr.ecr.us-east-1.amazonaws.com/acme:latest"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPath {
    pub account_id: String,
    pub region: String,
}

impl RegistryPath {
    pub fn new(account_id: &str, region: &str) -> Self {
        Self {
            account_id: account_id.to_owned(),
            region: region.to_owned(),
        }
    }

    pub fn host(&self) -> String {
        format!(
            "{account}.dkr.ecr.{region}.amazonaws.com",
            account = self.account_id,
            region = self.region
        )
    }

    pub fn image(&self, name: &str, tag: &str) -> String {
        format!("{}/{name}:{tag}", self.host())
    }
}

/// Normalize a branch name into a label valid for stack names, DNS host
/// labels and image tags.
///
/// Lowercases, replaces every character outside `[a-z0-9-]` with `-`,
/// collapses repeats and trims leading/trailing dashes. An empty result
/// falls back to [`DEFAULT_BRANCH`].
pub fn normalize_branch(branch: &str) -> String {
    let mut out = String::with_capacity(branch.len());
    for c in branch.trim().chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        DEFAULT_BRANCH.to_owned()
    } else {
        trimmed.to_owned()
    }
}
